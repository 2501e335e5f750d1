//! Error types for the configuration layer and the command-line front end.
//!
//! Import failures have their own taxonomy in
//! [`ImportError`](crate::import::ImportError); [`Error`] wraps it together
//! with configuration and output failures for the binary.

use std::path::PathBuf;

use thiserror::Error;

use crate::import::ImportError;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Any failure of a command-line run.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The archive could not be imported.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// The board could not be serialised.
    #[error("failed to serialise board")]
    Serialise(#[from] serde_json::Error),

    /// The output could not be written.
    #[error("failed to write output: {path}")]
    Write {
        /// Destination, `-` for stdout.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn validation_error_display() {
        let error = ConfigError::ValidationError {
            message: "invalid setting".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("invalid setting"));
    }

    #[test]
    fn wrapped_errors_keep_their_message() {
        let error = Error::from(ConfigError::ValidationError {
            message: "arc_segments".to_string(),
        });
        assert!(error.to_string().contains("arc_segments"));

        let error = Error::from(ImportError::malformed_stack("TOP", "no copper"));
        assert!(error.to_string().contains("TOP"));
    }
}
