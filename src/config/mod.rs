//! Configuration module for chainsql.
//!
//! Handles the settings file, environment variables, and translation options.

mod settings;

pub use settings::{expand_env_vars, Settings, SettingsError, TranslationSettings};
