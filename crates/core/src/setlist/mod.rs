//! Setlist parsing.
//!
//! A setlist is a plain-text work list, one item per line. Each line holds a
//! source URL and optional `artist - track` metadata, in one of two encodings:
//!
//! - `<trackinfo>*<url>`: metadata and URL separated by an asterisk
//! - `<trackinfo><url>`: the URL is found by its `https://` (or `http://`) prefix
//!
//! Lines without a usable URL are rejected individually; the rest of the file
//! still parses.

mod error;
mod parser;
mod types;

pub use error::SetlistError;
pub use parser::{get_track_and_artist, load_setlist, parse_line, parse_setlist};
pub use types::{ParsedSetlist, RejectedLine, Setlist, WorkItem};
