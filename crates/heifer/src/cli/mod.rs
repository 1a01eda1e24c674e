//! Command implementations.

pub mod config;
pub mod convert;

use heifer_core::{Config, ConfigError};
use std::path::Path;

/// Load `path` if given (it must exist), otherwise the default config file.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}
