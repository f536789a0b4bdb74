//! Download orchestrator.
//!
//! Runs a setlist strictly one item at a time through a single browser
//! session:
//! - **Per item**: snapshot, drive the conversion page, wait for completion
//! - **Rotation**: every `rotation_threshold` completions, either a new Tor
//!   circuit (soft) or a full session and Tor restart (hard)
//! - **Termination**: `Done`, `Aborted`, `Fatal` or `Cancelled`

mod config;
mod rotation;
mod runner;
mod types;

pub use config::{OrchestratorConfig, RotationStrategy};
pub use rotation::RotationCounter;
pub use runner::{check_preconditions, Orchestrator, RunContext};
pub use types::{ItemOutcome, ItemReport, OrchestratorError, RunReport, RunStatus};
