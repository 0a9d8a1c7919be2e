//! Error types for xsdump
//!
//! Local irregularities (a catalog line the resolver does not understand, an
//! attribute whose type cannot be resolved) are recovered in place and never
//! become errors. Everything here is fatal to the whole dump: no partial
//! top-level document is ever produced.

use std::fmt;
use thiserror::Error;

/// Result type alias using xsdump Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xsdump operations
#[derive(Error, Debug)]
pub enum Error {
    /// Schema parsing/building error
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Resource loading error (missing file, unresolvable location)
    #[error("resource error: {0}")]
    Resource(String),

    /// XML well-formedness error
    #[error("XML error: {0}")]
    Xml(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Schema parsing error with optional source location
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the schema file
    pub location: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, " (in {})", loc)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("expected xs:schema root element")
            .with_location("schema.xsd");

        let msg = format!("{}", err);
        assert!(msg.contains("expected xs:schema root element"));
        assert!(msg.contains("(in schema.xsd)"));
    }

    #[test]
    fn test_error_conversion() {
        let parse_err = ParseError::new("test");
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(format!("{}", err).starts_with("I/O error"));
    }
}
