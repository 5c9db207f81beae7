//! Error types for the ankipack core library.

use thiserror::Error;

/// All errors that can occur while building or writing a package.
#[derive(Debug, Error)]
pub enum AnkipackError {
    /// A note type definition is malformed (bad field names, template count,
    /// out-of-range requirement ordinals).
    #[error("Invalid note type: {0}")]
    Shape(String),

    /// A positional field list did not match the note type's field count.
    #[error("Expected {expected} fields for note type '{note_type}' but got {actual}")]
    FieldCount {
        note_type: String,
        expected: usize,
        actual: usize,
    },

    /// A named field list referenced a field the note type does not define.
    #[error("Field '{field}' does not exist in note type '{note_type}'")]
    UnknownField { note_type: String, field: String },

    /// A SQLite operation on the collection store failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration or note type table could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the zip container failed.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Convenience alias that pins the error type to [`AnkipackError`].
pub type Result<T> = std::result::Result<T, AnkipackError>;

impl AnkipackError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Shape(msg) => msg.clone(),
            Self::FieldCount { note_type, expected, .. } => {
                format!("Note type '{note_type}' needs exactly {expected} fields")
            }
            Self::UnknownField { field, .. } => format!("Unknown field: {field}"),
            Self::Database(e) => format!("Failed to write collection: {e}"),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
            Self::Archive(e) => format!("Failed to write package: {e}"),
        }
    }
}
