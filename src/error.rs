//! Error types for the schema-to-IR transformation
//!
//! Only structural failures are errors. Problems in the schema itself are
//! reported as [`Violation`](crate::graph::Violation)s alongside a best-effort IR.

use thiserror::Error;

/// Result type for parser and configuration operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Fatal errors
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid JSON at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: u32,
        column: u32,
        offset: usize,
    },

    #[error("Expected a literal value at {pointer}")]
    NotALiteral { pointer: String },

    #[error("Tuple-style items are not supported at {pointer}")]
    UnsupportedTupleItems { pointer: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),
}
