//! Fatal import errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::board::BoardError;

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Structural problems that abort an import.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Failed to read the archive file.
    #[error("Failed to read archive: {path}")]
    ArchiveRead {
        /// Path to the archive.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The archive file is not a valid archive document.
    #[error("Failed to parse archive: {path}")]
    ArchiveParse {
        /// Path to the archive.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The layer stack cannot be mapped onto a board.
    #[error("Malformed layer stack at '{layer}': {message}")]
    MalformedStack {
        /// Offending layer name or id.
        layer: String,
        /// Description of what's wrong.
        message: String,
    },

    /// The design extents exceed the host coordinate range.
    #[error(
        "Design is too large: {width_mm:.2} mm x {height_mm:.2} mm, \
         the maximum permissible size is {max_mm:.2} mm x {max_mm:.2} mm"
    )]
    DesignTooLarge {
        /// Design width in millimetres.
        width_mm: f64,
        /// Design height in millimetres.
        height_mm: f64,
        /// Largest permissible extent in millimetres.
        max_mm: f64,
    },

    /// A record refers to something that does not exist.
    #[error("{context} references {kind} '{id}' which does not exist")]
    MissingReference {
        /// Kind of the missing record.
        kind: &'static str,
        /// Id of the missing record.
        id: String,
        /// Record holding the reference.
        context: String,
    },

    /// A net has neither a name nor a pin to derive one from.
    #[error("Net '{id}' has no name and no pins")]
    UnnamedNet {
        /// Archive id of the net.
        id: String,
    },

    /// A board edit was rejected.
    #[error(transparent)]
    Board(#[from] BoardError),
}

impl ImportError {
    /// Creates an archive read error.
    pub fn archive_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ArchiveRead {
            path: path.into(),
            source,
        }
    }

    /// Creates an archive parse error.
    pub fn archive_parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::ArchiveParse {
            path: path.into(),
            source,
        }
    }

    /// Creates a malformed stack error.
    pub fn malformed_stack(layer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedStack {
            layer: layer.into(),
            message: message.into(),
        }
    }

    /// Creates a missing reference error.
    pub fn missing(
        kind: &'static str,
        id: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::MissingReference {
            kind,
            id: id.into(),
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_reference_display() {
        let err = ImportError::missing("component", "COMP7", "Net 'GND'");
        assert_eq!(
            err.to_string(),
            "Net 'GND' references component 'COMP7' which does not exist"
        );
    }

    #[test]
    fn design_too_large_reports_sizes() {
        let err = ImportError::DesignTooLarge {
            width_mm: 5000.0,
            height_mm: 10.0,
            max_mm: 2147.48,
        };
        let msg = err.to_string();
        assert!(msg.contains("5000.00 mm x 10.00 mm"));
        assert!(msg.contains("2147.48"));
    }
}
