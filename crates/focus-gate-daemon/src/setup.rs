//! Config loading and default paths.

use std::path::PathBuf;

use tracing::info;

use crate::config::Config;
use crate::error::FocusError;

/// Load configuration from the given path, or the default location.
///
/// A missing file is not an error; defaults are used instead.
pub fn load_config(path: Option<&str>) -> Result<Config, FocusError> {
    let config_path = match path {
        Some(p) => PathBuf::from(p),
        None => default_config_path(),
    };

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| FocusError::Config(format!("failed to read config: {e}")))?;
        let config = parse_config(&content)?;
        info!(path = %config_path.display(), "loaded config");
        Ok(config)
    } else {
        info!(path = %config_path.display(), "no config file found, using defaults");
        Ok(Config::default())
    }
}

/// Parse a TOML configuration document.
pub fn parse_config(content: &str) -> Result<Config, FocusError> {
    toml::from_str(content).map_err(|e| FocusError::Config(format!("failed to parse config: {e}")))
}

/// Render the default configuration as TOML.
pub fn default_config_toml() -> Result<String, FocusError> {
    toml::to_string_pretty(&Config::default())
        .map_err(|e| FocusError::Config(format!("failed to render config: {e}")))
}

/// Get the default config directory path.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("focus-gate")
}

/// Get the default config file path.
fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config(Some("/nonexistent/focus-gate/config.toml")).unwrap();
        assert_eq!(config.timer.work_minutes, 30);
        assert_eq!(config.commands.prefix, "!");
    }

    #[test]
    fn malformed_config_is_a_config_error() {
        let err = parse_config("[timer]\nwork_minutes = \"lots\"").unwrap_err();
        assert!(matches!(err, FocusError::Config(msg) if msg.contains("parse")));
    }

    #[test]
    fn default_toml_parses_back() {
        let rendered = default_config_toml().unwrap();
        let config = parse_config(&rendered).unwrap();
        assert_eq!(config.alert.asset, "alarm.mp3");
    }

    #[test]
    fn config_dir_ends_with_project_name() {
        assert!(config_dir().ends_with("focus-gate"));
    }
}
