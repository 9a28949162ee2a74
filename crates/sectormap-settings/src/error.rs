//! Error types for the settings crate.
//!
//! Structured errors for configuration loading and validation and for the
//! client-local key/value storage behind viewport persistence.

use std::io;
use thiserror::Error;

/// Errors that can occur during settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The configuration file could not be loaded.
    #[error("Failed to load settings: {0}")]
    LoadError(String),

    /// The configuration file could not be saved.
    #[error("Failed to save settings: {0}")]
    SaveError(String),

    /// A configuration value is invalid.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// A persistence error occurred.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Errors related to client-local storage.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The storage directory could not be found or created.
    #[error("Storage directory error: {0}")]
    StorageDirectory(String),

    /// The storage file exists but is not a JSON object.
    #[error("Corrupted storage file: {0}")]
    Corrupted(String),

    /// I/O error during persistence.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON error during persistence.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Result type alias for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_error_display() {
        let err = SettingsError::InvalidSetting {
            key: "interaction.min_query_zoom".to_string(),
            reason: "must be between 0 and 22".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid setting 'interaction.min_query_zoom': must be between 0 and 22"
        );
    }

    #[test]
    fn test_error_conversion() {
        let persist_err = PersistenceError::Corrupted("session.json".to_string());
        let settings_err: SettingsError = persist_err.into();
        assert!(matches!(settings_err, SettingsError::Persistence(_)));

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let settings_err: SettingsError = io_err.into();
        assert!(matches!(settings_err, SettingsError::IoError(_)));
    }
}
