//! Error types and failure classification for the dictionaries crate.
//!
//! This module provides:
//! - [`DictionaryError`]: The main error enum for all dictionary operations
//! - [`FailureKind`]: Whether an error is bad operator input or a failed source call
//! - [`SubCallPolicy`]: Per-adapter policy for failures of individual sub-calls

mod policy;

pub use policy::SubCallPolicy;

use thiserror::Error;

/// Errors that can occur while fetching or mapping a dictionary.
#[derive(Error, Debug)]
pub enum DictionaryError {
    /// Required operator input is missing or malformed (empty URL, no token).
    /// Raised before any network call is attempted.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the missing or invalid input
        message: String,
    },

    /// The dictionary identifier is not one of the known dictionaries.
    #[error("Unknown dictionary: {0}")]
    UnknownDictionary(String),

    /// No adapter is registered for the dictionary.
    #[error("No source registered for dictionary: {0}")]
    SourceNotRegistered(String),

    /// The source answered with a non-2xx status.
    #[error("Source error: {provider} - HTTP {status}: {body}")]
    HttpStatus {
        /// The adapter that made the call
        provider: String,
        /// HTTP status code
        status: u16,
        /// Leading part of the response body
        body: String,
    },

    /// The request could not be sent or the response body could not be read.
    #[error("Request failed: {provider} - {message}")]
    Request {
        /// The adapter that made the call
        provider: String,
        /// Transport error message
        message: String,
    },

    /// The response body does not have the shape the adapter expects.
    #[error("Failed to parse response: {provider} - {message}")]
    Parse {
        /// The adapter that made the call
        provider: String,
        /// Parse error message
        message: String,
    },
}

/// Coarse classification used by the import orchestrator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// Bad or missing operator input; nothing was fetched.
    Validation,
    /// A source call failed.
    Fetch,
}

impl DictionaryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    pub fn parse(provider: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Returns the failure kind for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use ppp_dictionaries::errors::{DictionaryError, FailureKind};
    ///
    /// let error = DictionaryError::validation("Dictionary URL is required");
    /// assert_eq!(error.kind(), FailureKind::Validation);
    ///
    /// let error = DictionaryError::HttpStatus {
    ///     provider: "BINANCE".to_string(),
    ///     status: 503,
    ///     body: String::new(),
    /// };
    /// assert_eq!(error.kind(), FailureKind::Fetch);
    /// ```
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ValidationFailed { .. }
            | Self::UnknownDictionary(_)
            | Self::SourceNotRegistered(_) => FailureKind::Validation,
            Self::HttpStatus { .. } | Self::Request { .. } | Self::Parse { .. } => {
                FailureKind::Fetch
            }
        }
    }
}
