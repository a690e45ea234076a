//! TOML-based configuration for chainsql.
//!
//! Supports a config file (chainsql.toml) with environment variable expansion
//! in paths.
//!
//! Example configuration:
//! ```toml
//! schema = "${APP_ROOT}/schema.toml"
//!
//! [translation]
//! dialect = "tsql"
//! derived_table_prefix = "sq"
//! carrier_suffix = "_jk"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::Dialect;

/// Error type for settings and schema files.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Path to the schema file (supports ${ENV_VAR} expansion).
    pub schema: Option<String>,

    /// Translation options.
    pub translation: TranslationSettings,
}

/// Translation options.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationSettings {
    /// Target dialect.
    pub dialect: Dialect,

    /// Alias seed for derived tables (`sq` gives `sq0`, `sq1`, ...).
    pub derived_table_prefix: String,

    /// Infix for join-key carrier columns (`_jk` gives `UserId_jk0`).
    pub carrier_suffix: String,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            derived_table_prefix: "sq".to_string(),
            carrier_suffix: "_jk".to_string(),
        }
    }
}

impl TranslationSettings {
    /// Reject values that would produce unusable aliases.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let is_word = |s: &str| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        if !is_word(&self.derived_table_prefix) {
            return Err(SettingsError::InvalidConfig(format!(
                "derived_table_prefix must be a plain identifier, got '{}'",
                self.derived_table_prefix
            )));
        }
        if !is_word(&self.carrier_suffix) {
            return Err(SettingsError::InvalidConfig(format!(
                "carrier_suffix must be a plain identifier, got '{}'",
                self.carrier_suffix
            )));
        }
        Ok(())
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.translation.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `CHAINSQL_CONFIG`
    /// 2. `./chainsql.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("CHAINSQL_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("chainsql.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        Ok(Settings::default())
    }

    /// Schema path with environment variables expanded.
    pub fn schema_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.schema
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            // $VAR ends at the first non-identifier character
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
