//! Reading of the optional settings file.

use std::fs;
use std::path::Path;

use log::debug;

use crate::config::Settings;
use crate::error::{Error, Result};

/// Reads the settings file from disk.
///
/// Returns the default settings if the file doesn't exist or is empty.
///
/// # Errors
///
/// Returns an error if:
/// - The file exists but cannot be read
/// - The file contains invalid YAML
/// - The YAML doesn't match the expected structure
pub fn get_settings(settings_path: &str) -> Result<Settings> {
    if !Path::exists(Path::new(settings_path)) {
        debug!("No settings file at `{}`, using defaults", settings_path);
        return Ok(Settings::default());
    }

    let contents = fs::read_to_string(settings_path)
        .map_err(|e| Error::io_error("settings".to_string(), settings_path.to_string(), e))?;

    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }

    serde_yaml::from_str(&contents).map_err(|e| {
        Error::yaml_error(
            "reading".to_string(),
            "settings".to_string(),
            settings_path.to_string(),
            e,
        )
    })
}
