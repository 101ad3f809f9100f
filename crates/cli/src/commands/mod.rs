pub mod config_cmd;
pub mod doctor;
pub mod run;
pub mod tools;

use std::path::Path;

use agentloom_config::{AppConfig, ConfigError};

/// Load config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    }
}
