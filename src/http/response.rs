//! Response representation and conversion to the wire.
//!
//! # Responsibilities
//! - Build responses from handler replies and faults
//! - Carry the fault alongside the response, and in `x-fault-*` headers
//! - Convert to and from axum/reqwest responses
//!
//! # Design Decisions
//! - Fault responses have an empty body; the fault travels in headers
//! - Fault header values are percent-encoded, so any message survives
//! - Non-empty bodies are labelled `application/json`

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::diagnostics::{Fault, FaultKind, SourceLocation};

pub const X_FAULT_KIND: &str = "x-fault-kind";
pub const X_FAULT_MESSAGE: &str = "x-fault-message";
pub const X_FAULT_LOCATION: &str = "x-fault-location";

/// A single HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Possibly empty.
    pub body: Bytes,
    pub fault: Option<Fault>,
}

impl Response {
    /// A successful response. A non-empty body is labelled as JSON.
    pub fn new(status: StatusCode, body: Bytes) -> Self {
        let mut headers = HeaderMap::new();
        if !body.is_empty() {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        Self {
            status,
            headers,
            body,
            fault: None,
        }
    }

    /// A failed response with an empty body.
    pub fn faulted(status: StatusCode, fault: Fault) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(X_FAULT_KIND, HeaderValue::from_static(fault.kind.as_str()));
        if let Some(value) = header_text(&fault.message) {
            headers.insert(X_FAULT_MESSAGE, value);
        }
        if let Some(value) = fault.location.as_ref().and_then(|l| header_text(&l.to_string())) {
            headers.insert(X_FAULT_LOCATION, value);
        }
        Self {
            status,
            headers,
            body: Bytes::new(),
            fault: Some(fault),
        }
    }

    /// Reassemble a response received over the wire, recovering any
    /// fault from its headers.
    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        let fault = fault_from_headers(&headers);
        Self {
            status,
            headers,
            body,
            fault,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let mut response = axum::response::Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Control characters, non-ASCII bytes and `%` itself are escaped.
const HEADER_ESCAPES: &AsciiSet = &CONTROLS.add(b'%');

fn header_text(text: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&utf8_percent_encode(text, HEADER_ESCAPES).to_string()).ok()
}

fn fault_from_headers(headers: &HeaderMap) -> Option<Fault> {
    let kind: FaultKind = header_str(headers, X_FAULT_KIND)?.parse().ok()?;
    let message = header_str(headers, X_FAULT_MESSAGE)
        .map(|m| percent_decode_str(m).decode_utf8_lossy().into_owned())
        .unwrap_or_default();
    let mut fault = Fault::new(kind, message);
    fault.location = header_str(headers, X_FAULT_LOCATION)
        .map(|l| percent_decode_str(l).decode_utf8_lossy().into_owned())
        .and_then(|l| l.parse::<SourceLocation>().ok());
    Some(fault)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_only_with_body() {
        let empty = Response::new(StatusCode::NO_CONTENT, Bytes::new());
        assert!(empty.content_type().is_none());
        assert!(empty.is_empty());

        let full = Response::new(StatusCode::OK, Bytes::from_static(b"[]"));
        assert_eq!(full.content_type(), Some("application/json"));
    }

    #[test]
    fn test_fault_survives_the_wire() {
        let fault = Fault::server(
            "undefined name `movie_params`",
            SourceLocation { file: "src/handler/resource.rs".into(), line: 40, column: 17 },
        );
        let sent = Response::faulted(StatusCode::INTERNAL_SERVER_ERROR, fault.clone());
        assert!(sent.body.is_empty());

        let received = Response::from_parts(sent.status, sent.headers.clone(), sent.body.clone());
        assert_eq!(received.fault, Some(fault));
    }

    #[test]
    fn test_non_ascii_message_survives_the_wire() {
        let sent = Response::faulted(
            StatusCode::INTERNAL_SERVER_ERROR,
            Fault::server(
                "undefined local variable or method `película`\nat 100%",
                SourceLocation { file: "src/películas.rs".into(), line: 3, column: 9 },
            ),
        );
        assert_eq!(sent.headers.get(X_FAULT_KIND).unwrap(), "ServerFault");
        let header = sent.headers.get(X_FAULT_MESSAGE).unwrap().to_str().unwrap();
        assert!(header.is_ascii());

        let received = Response::from_parts(sent.status, sent.headers.clone(), sent.body.clone());
        assert_eq!(received.fault, sent.fault);
    }

    #[tokio::test]
    async fn test_into_axum_response() {
        let response = Response::new(StatusCode::CREATED, Bytes::from_static(b"{\"id\":1}"))
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"{\"id\":1}");
    }
}
