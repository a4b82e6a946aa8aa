//! Error types for microdata operations.
//!
//! Extraction itself never fails; these cover the surrounding steps that
//! can: reading input, validating a base URL, parsing a selector, and
//! encoding JSON.

use thiserror::Error;

/// Errors that can occur around microdata extraction.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid base URL {base:?}: {source}")]
    InvalidBase {
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
