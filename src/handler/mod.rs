//! Request handlers.
//!
//! # Data Flow
//! ```text
//! Router (matched route, params filled)
//!     → Handler::handle(&Request)
//!     → Ok(Reply { status, payload })   → encoder
//!     → Err(HandlerFault)               → router turns it into a fault response
//! ```
//!
//! # Design Decisions
//! - Handlers never build responses; they reply or fail as a whole
//! - Reply statuses are limited to 200, 201 and 204
//! - Store access goes through the `RecordStore` trait

pub mod fault;
pub mod resource;

use axum::http::StatusCode;

use crate::http::encoder::Payload;
use crate::http::Request;

pub use fault::{HandlerError, HandlerFault};
pub use resource::Resource;

pub type HandlerResult = Result<Reply, HandlerFault>;

/// Business logic for a matched route.
pub trait Handler: Send + Sync {
    fn handle(&self, request: &Request) -> HandlerResult;
}

/// A successful handler outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    status: StatusCode,
    payload: Option<Payload>,
}

impl Reply {
    /// 200 with a body.
    pub fn ok(payload: impl Into<Payload>) -> Self {
        Self {
            status: StatusCode::OK,
            payload: Some(payload.into()),
        }
    }

    /// 201 with the created representation.
    pub fn created(payload: impl Into<Payload>) -> Self {
        Self {
            status: StatusCode::CREATED,
            payload: Some(payload.into()),
        }
    }

    /// 204, no body.
    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            payload: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<Payload> {
        self.payload
    }
}

impl From<Option<Payload>> for Reply {
    fn from(payload: Option<Payload>) -> Self {
        match payload {
            Some(payload) => Reply::ok(payload),
            None => Reply::no_content(),
        }
    }
}

/// Closure adapter returned by [`handler_fn`].
pub struct HandlerFn<F>(F);

/// Use a closure as a [`Handler`].
///
/// ```
/// use request_harness::handler::{handler_fn, Reply};
///
/// let hello = handler_fn(|_req| Ok(Reply::ok(serde_json::json!({"hello": "world"}))));
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&Request) -> HandlerResult + Send + Sync,
{
    HandlerFn(f)
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&Request) -> HandlerResult + Send + Sync,
{
    fn handle(&self, request: &Request) -> HandlerResult {
        (self.0)(request)
    }
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HandlerFn")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_from_option() {
        let payload = Payload::new(json!([]));
        assert_eq!(Reply::from(Some(payload.clone())), Reply::ok(payload));
        assert_eq!(Reply::from(None).status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_handler_fn_sees_request() {
        let echo = handler_fn(|req| match req.payload()? {
            Some(payload) => Ok(Reply::created(payload)),
            None => Err(HandlerError::MissingParam("movie".into()).into()),
        });

        let body = Payload::new(json!({"title": "Arrival"}));
        let reply = echo.handle(&Request::post("/movies").json(&body)).unwrap();
        assert_eq!(reply.status(), StatusCode::CREATED);
        assert_eq!(reply.into_payload(), Some(body));

        let fault = echo.handle(&Request::post("/movies")).unwrap_err();
        assert_eq!(fault.to_string(), "param is missing or the value is empty: movie");
    }
}
