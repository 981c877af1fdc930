//! Infrastructure-level errors (wraps application errors)

use std::time::Duration;

use thiserror::Error;

use crate::application::ApplicationError;

/// Failure to obtain a validation response from the remote endpoint.
///
/// Produced by `RemoteValidator` implementations and handed to the dispatcher,
/// which keeps the previous server errors in place.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("validation request timed out after {0:?}")]
    Timeout(Duration),

    #[error("validation endpoint unavailable: {message}")]
    Unavailable { message: String },

    #[error("invalid validation response: {message}")]
    InvalidResponse { message: String },
}

/// Infrastructure errors wrap application errors and add I/O-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {context}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a JSON error with context.
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
