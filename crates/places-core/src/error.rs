// crates/places-core/src/error.rs
use std::sync::Arc;
use thiserror::Error;

/// Errors produced by the place search engine.
///
/// Only dataset transport and caller usage errors surface here. Missing
/// matches, superseded requests and failed IP lookups are not errors.
#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The caller passed a parameter that cannot be normalized.
    #[error("Invalid parameter `{name}`: {message}")]
    InvalidParam { name: &'static str, message: String },

    /// Error raised by a fetch that several callers were awaiting.
    #[error(transparent)]
    Shared(Arc<PlacesError>),
}

impl PlacesError {
    pub(crate) fn invalid_param(name: &'static str, message: impl Into<String>) -> Self {
        PlacesError::InvalidParam {
            name,
            message: message.into(),
        }
    }
}

impl From<Arc<PlacesError>> for PlacesError {
    fn from(err: Arc<PlacesError>) -> Self {
        PlacesError::Shared(err)
    }
}

pub type Result<T> = std::result::Result<T, PlacesError>;
