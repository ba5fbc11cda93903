//! Error types for the CB auction statistics system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the CB auction statistics system.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (invalid or inconsistent data).
    #[error("Data error: {0}")]
    Data(String),

    /// A field required by a dimension is absent from the record set.
    #[error("Missing field `{field}` required by dimension {dimension}")]
    MissingField {
        /// Output key of the dimension (or sheet) that needed the field.
        dimension: String,
        /// Name of the missing field or column.
        field: String,
    },

    /// Insufficient data for computation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A single source row could not be used.
    #[error("Row {line}: {message}")]
    Row {
        /// 1-based line number in the source file.
        line: usize,
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reader error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook reader error.
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a missing-field error.
    pub fn missing_field(dimension: impl Into<String>, field: impl Into<String>) -> Self {
        Error::MissingField {
            dimension: dimension.into(),
            field: field.into(),
        }
    }

    /// Create an insufficient data error.
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Error::InsufficientData(msg.into())
    }

    /// Create a row-level error.
    pub fn row(line: usize, msg: impl Into<String>) -> Self {
        Error::Row {
            line,
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message_names_dimension() {
        let err = Error::missing_field("發行規模", "issue_size");
        let msg = err.to_string();
        assert!(msg.contains("發行規模"));
        assert!(msg.contains("issue_size"));
    }

    #[test]
    fn test_row_error_message() {
        let err = Error::row(7, "invalid date");
        assert_eq!(err.to_string(), "Row 7: invalid date");
    }
}
