//! Config file loading.
//!
//! A run is described by one TOML file. Any key can be overridden from the
//! environment with the `SETGRAB_` prefix, nested tables joined by `__`:
//!
//! ```text
//! SETGRAB_DOWNLOADS_FOLDER_PATH=/mnt/music/incoming
//! SETGRAB_TOR__CONTROL_PORT=9151
//! SETGRAB_ORCHESTRATOR__ROTATION_STRATEGY=hard
//! ```
//!
//! `SETGRAB_CONFIG` names the file itself and is never read as a key.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

const ENV_PREFIX: &str = "SETGRAB_";
const ENV_SEPARATOR: &str = "__";

/// Environment keys under the prefix that are not config fields.
const ENV_RESERVED: &[&str] = &["config"];

/// Load the run config from `path`, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(ENV_RESERVED)
                .split(ENV_SEPARATOR),
        )
        .extract()
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
}

/// Parse a config from TOML text alone, without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::RotationStrategy;
    use figment::Jail;

    const MINIMAL: &str = r#"
downloads_folder_path = "/downloads"
setlist_path = "setlist.txt"
"#;

    fn load(jail: &Jail) -> figment::error::Result<Config> {
        load_config(&jail.directory().join("config.toml")).map_err(|e| e.to_string().into())
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.orchestrator.rotation_threshold, 3);
        assert_eq!(config.orchestrator.rotation_strategy, RotationStrategy::Soft);
        assert_eq!(config.detector.marker_extension, "part");
    }

    #[test]
    fn test_config_without_setlist_is_rejected() {
        let err = load_config_from_str(r#"downloads_folder_path = "/downloads""#).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(err.to_string().contains("setlist_path"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/setgrab.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_file_tables_are_read() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
downloads_folder_path = "/downloads"
setlist_path = "/lists/friday.txt"

[browser]
webdriver_url = "http://127.0.0.1:4455"

[orchestrator]
rotation_threshold = 4
"#,
            )?;

            let config = load(jail)?;
            assert_eq!(config.browser.webdriver_url, "http://127.0.0.1:4455");
            assert_eq!(config.setlist_path, Path::new("/lists/friday.txt"));
            assert_eq!(config.orchestrator.rotation_threshold, 4);
            Ok(())
        });
    }

    #[test]
    fn test_environment_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", MINIMAL)?;
            jail.set_env("SETGRAB_DOWNLOADS_FOLDER_PATH", "/mnt/incoming");
            jail.set_env("SETGRAB_TOR__CONTROL_PORT", "9151");
            jail.set_env("SETGRAB_ORCHESTRATOR__ROTATION_STRATEGY", "hard");
            jail.set_env("SETGRAB_CONFIG", "elsewhere.toml");

            let config = load(jail)?;
            assert_eq!(config.downloads_folder_path, Path::new("/mnt/incoming"));
            assert_eq!(config.tor.control_port, 9151);
            assert_eq!(config.orchestrator.rotation_strategy, RotationStrategy::Hard);
            Ok(())
        });
    }

    #[test]
    fn test_parse_error_names_the_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "downloads_folder_path = [")?;
            let err = load_config(&jail.directory().join("config.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::ParseError(_)));
            assert!(err.to_string().contains("config.toml"));
            Ok(())
        });
    }
}
