//! Errors raised by handlers, with the location they were raised at.

use axum::http::StatusCode;
use thiserror::Error;

use crate::diagnostics::{Fault, FaultKind, SourceLocation};
use crate::http::encoder::DecodeError;

/// What went wrong inside a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler referred to something that was never defined.
    #[error("undefined local variable or method `{0}`")]
    UndefinedName(String),

    /// A required request parameter was absent or empty.
    #[error("param is missing or the value is empty: {0}")]
    MissingParam(String),

    /// The request body could not be understood.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("Couldn't find {resource} with 'id'={id}")]
    RecordNotFound { resource: String, id: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("could not serialize reply: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl HandlerError {
    pub fn undefined(name: impl Into<String>) -> Self {
        HandlerError::UndefinedName(name.into())
    }

    /// Response status for this error. Only a missing record is a 404;
    /// everything else is an unhandled server fault.
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> FaultKind {
        match self {
            HandlerError::RecordNotFound { .. } => FaultKind::NotFound,
            _ => FaultKind::ServerFault,
        }
    }
}

/// A handler error plus the source location that raised it.
///
/// Conversions are `#[track_caller]`, so `?` and `.into()` inside a
/// handler record the handler's own line.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct HandlerFault {
    #[source]
    pub error: HandlerError,
    pub location: SourceLocation,
}

impl HandlerFault {
    #[track_caller]
    pub fn new(error: HandlerError) -> Self {
        Self {
            error,
            location: SourceLocation::caller(),
        }
    }

    /// Raise with an explicit location, e.g. one captured at route registration.
    pub fn at(error: HandlerError, location: SourceLocation) -> Self {
        Self { error, location }
    }

    pub fn status(&self) -> StatusCode {
        self.error.status()
    }

    /// The fault attached to the response and the diagnostic record.
    /// The message is never empty.
    pub fn to_fault(&self) -> Fault {
        let kind = self.error.kind();
        let mut message = self.error.to_string();
        if message.trim().is_empty() {
            message = format!("{} raised at {}", kind, self.location);
        }
        Fault::new(kind, message).at(self.location.clone())
    }
}

impl From<HandlerError> for HandlerFault {
    #[track_caller]
    fn from(error: HandlerError) -> Self {
        Self::new(error)
    }
}

impl From<DecodeError> for HandlerFault {
    #[track_caller]
    fn from(error: DecodeError) -> Self {
        Self::new(HandlerError::Decode(error))
    }
}

impl From<serde_json::Error> for HandlerFault {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        Self::new(HandlerError::Serialize(error))
    }
}
