//! Resolver Error Types
//!
//! Error handling for endpoint canonicalization, credential pools and key selection.

#[cfg(feature = "python")]
use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};
#[cfg(feature = "python")]
use pyo3::prelude::*;
use thiserror::Error;

use crate::endpoint::EndpointKey;

/// Main error type for resolver operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    /// Malformed endpoint configuration JSON
    #[error("Invalid endpoint configuration: {0}")]
    Parse(String),

    /// Configuration is well-formed but not usable (e.g. no default/openai endpoint)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Selection attempted on an empty credential pool (channel id, if known)
    #[error("{}", empty_pool_message(.0))]
    EmptyPool(String),

    /// Batch credential input with some rejected entries; valid ones are kept
    #[error("{}", partial_parse_message(.rejected))]
    PartialParse { rejected: Vec<String> },

    /// Channel id not present in the loaded configuration
    #[error("Channel '{0}' not found")]
    ChannelNotFound(String),

    /// Neither the requested endpoint category nor a fallback is configured
    #[error("No endpoint configured for '{key}' (and no default/openai fallback)")]
    EndpointNotConfigured { key: EndpointKey },

    /// Channel file errors (unreadable file, bad record, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

fn empty_pool_message(channel: &str) -> String {
    if channel.is_empty() {
        "Credential pool is empty: channel has no usable credentials".to_string()
    } else {
        format!("Channel '{}' has no usable credentials", channel)
    }
}

fn partial_parse_message(rejected: &[String]) -> String {
    let noun = if rejected.len() == 1 { "entry" } else { "entries" };
    format!(
        "Rejected {} credential {}: {}",
        rejected.len(),
        noun,
        rejected.join(", ")
    )
}

impl From<serde_json::Error> for ResolverError {
    fn from(err: serde_json::Error) -> Self {
        ResolverError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for ResolverError {
    fn from(err: std::io::Error) -> Self {
        ResolverError::Config(format!("IO error: {}", err))
    }
}

#[cfg(feature = "python")]
impl From<ResolverError> for PyErr {
    fn from(err: ResolverError) -> PyErr {
        let msg = err.to_string();
        match &err {
            ResolverError::Parse(_) => PyValueError::new_err(msg),
            ResolverError::Validation(_) => PyValueError::new_err(msg),
            ResolverError::EmptyPool(_) => PyRuntimeError::new_err(msg),
            ResolverError::PartialParse { .. } => PyValueError::new_err(msg),
            ResolverError::ChannelNotFound(_) => PyKeyError::new_err(msg),
            ResolverError::EndpointNotConfigured { .. } => PyKeyError::new_err(msg),
            ResolverError::Config(_) => PyValueError::new_err(msg),
        }
    }
}

/// Result type alias for resolver operations
pub type Result<T> = std::result::Result<T, ResolverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_parse_message() {
        let one = ResolverError::PartialParse {
            rejected: vec!["#2".to_string()],
        };
        assert_eq!(one.to_string(), "Rejected 1 credential entry: #2");

        let many = ResolverError::PartialParse {
            rejected: vec!["#2".to_string(), "svc@proj.iam".to_string()],
        };
        assert_eq!(
            many.to_string(),
            "Rejected 2 credential entries: #2, svc@proj.iam"
        );
    }

    #[test]
    fn test_empty_pool_message() {
        let err = ResolverError::EmptyPool("openai-main".to_string());
        assert_eq!(
            err.to_string(),
            "Channel 'openai-main' has no usable credentials"
        );

        let anonymous = ResolverError::EmptyPool(String::new());
        assert_eq!(
            anonymous.to_string(),
            "Credential pool is empty: channel has no usable credentials"
        );
    }
}
