use std::path::{Path, PathBuf};

use schemagate_xml::{HttpConfig, ParserOptions};
use serde::{Deserialize, Serialize};

use crate::CliError;

/// Settings file looked up in the working directory when `--config` is absent.
pub const DEFAULT_SETTINGS_FILE: &str = "schemagate.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub http: HttpConfig,
    pub parser: ParserOptions,
    pub logging: LoggingSettings,
}

/// Load settings from `path`, or from [`DEFAULT_SETTINGS_FILE`] when it
/// exists. An explicitly named file must exist.
pub(crate) fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_SETTINGS_FILE);
            if !default.exists() {
                return Ok(Settings::default());
            }
            default
        }
    };

    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = toml::from_str(&content)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [http]
            timeout_secs = 5

            [logging]
            format = "json"
            "#,
        )
        .expect("parse settings");

        assert_eq!(settings.http.timeout_secs, 5);
        assert_eq!(settings.http.user_agent, "schemagate");
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert_eq!(settings.logging.filter, "info");
        assert_eq!(settings.parser, ParserOptions::default());
    }

    #[test]
    fn parser_options_are_configurable() {
        let settings: Settings = toml::from_str(
            r#"
            [parser]
            attr_key = "$"
            explicit_array = true
            "#,
        )
        .expect("parse settings");

        assert_eq!(settings.parser.attr_key, "$");
        assert!(settings.parser.explicit_array);
        assert!(settings.parser.trim);
    }

    #[test]
    fn rejects_unknown_log_format() {
        let result: Result<Settings, _> = toml::from_str("[logging]\nformat = \"xml\"\n");
        assert!(result.is_err());
    }
}
