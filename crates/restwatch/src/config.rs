//! Configuration module for restwatch
//! Contains functions and structs to handle the configuration.
use crate::app;
use crate::error::ConfigError;
use crate::presets::Preset;

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

/// Configuration struct used for the application
///
/// # Default
///
/// If the configuration file does not exist, it will be created with
/// the default values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Countdown length loaded at startup, in seconds.
    pub default_duration_sec: u32,
    /// Ring the terminal bell when a countdown finishes.
    pub vibrate_on_finish: bool,
    /// Schedule a desktop notification for the finish instant, so the alert
    /// fires even when the app sits in a background terminal.
    pub notify_on_finish: bool,
    /// Poll cadence of the in-app tick loop, in milliseconds. Fine enough
    /// for a smooth progress bar, coarse enough not to waste cycles.
    pub tick_interval_ms: u64,
    /// Countdown presets offered on the timer view.
    pub presets: Vec<Preset>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_duration_sec: 90,
            vibrate_on_finish: true,
            notify_on_finish: true,
            tick_interval_ms: 250,
            presets: Preset::defaults(),
        }
    }
}

/// Returns the name of the config file
fn file_name() -> &'static str {
    "config.toml"
}

/// Get the configuration file path
///
/// # Errors
///
/// - Fails if the home directory cannot be found
///
pub fn file_path() -> Result<PathBuf, ConfigError> {
    let path = app::config_file_path(file_name())?;
    Ok(path)
}

/// Save the configuration file.
///
/// # Errors
///
/// - Fails if the home directory cannot be found
/// - Fails if the config directory cannot be created
///
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let file_path = file_path()?;
    let mut file = File::create(file_path)?;
    let config = toml::to_string(config)?;

    file.write_all(config.as_bytes())?;

    Ok(())
}

/// Load or initialize the configuration file.
///
/// # Errors
///
/// - Fails if the home directory cannot be found
/// - Fails if the config directory cannot be created
///
/// # Example
///
/// ```rust,no_run
/// use restwatch::config::load_or_initialize;
/// let config = load_or_initialize().unwrap();
/// ```
///
pub fn load_or_initialize() -> Result<Config, ConfigError> {
    let file_path = file_path()?;
    if !file_path.exists() {
        let config = Config::default();
        save(&config)?;

        Ok(config)
    } else {
        let config_str = fs::read_to_string(&file_path)?;
        let config: Config = toml::from_str(&config_str)?;

        Ok(config)
    }
}
