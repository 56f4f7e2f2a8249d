// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks durations, levels and the discovery section.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load `path` if given; otherwise load the default path if it exists, or
/// fall back to built-in defaults.
///
/// An explicitly requested file that does not exist is an error.
pub fn load_or_default(path: Option<&Path>) -> Result<ConfigFile> {
    match path {
        Some(path) => load_and_validate(path),
        None => {
            let default = default_config_path();
            if default.is_file() {
                debug!(path = %default.display(), "loading default config file");
                load_and_validate(default)
            } else {
                Ok(ConfigFile::default())
            }
        }
    }
}

/// Default config location: `Runwatch.toml` in the current directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Runwatch.toml")
}
