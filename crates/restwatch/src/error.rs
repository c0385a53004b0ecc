use thiserror::Error;
use toml::{de::Error as DeTomlError, ser::Error as SerTomlError};

/// Home Directory Errors
#[derive(Error, Debug)]
pub enum HomeDirError {
    /// IO operations on home directory.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failed to find home directory.
    #[error("Failed to find home directory")]
    HomeDirNotFound,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO operations on config module.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML serialization.
    #[error(transparent)]
    TomlSerialization(#[from] SerTomlError),

    /// TOML deserialization.
    #[error(transparent)]
    TomlDeserialization(#[from] DeTomlError),

    /// Config directory errors.
    #[error(transparent)]
    ConfigFile(#[from] HomeDirError),
}

/// Workout store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO operations on store files.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding of a store file.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Data directory errors.
    #[error(transparent)]
    StoreFile(#[from] HomeDirError),
}

/// Rejected duration input.
///
/// Raised at the input boundary; nothing invalid reaches the timer session.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// Input was not plain digits or an m:ss clock value.
    #[error("Enter the duration in seconds, or as m:ss")]
    NotNumeric,

    /// The seconds part of an m:ss value was 60 or more.
    #[error("Seconds in m:ss must be below 60")]
    MalformedClock,
}

/// TUI Error type.
#[derive(Error, Debug)]
pub enum TuiError {
    /// IO Error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// [`ConfigError`] blanket error conversion.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// [`StoreError`] blanket error conversion.
    #[error(transparent)]
    Store(#[from] StoreError),
}
