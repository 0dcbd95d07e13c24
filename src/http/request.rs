//! Request representation shared by the router and the client.
//!
//! # Responsibilities
//! - Carry verb, path, query, headers and body through dispatch
//! - Assign a request ID (reuse `x-request-id` when it holds a UUID)
//! - Expose path parameters filled in by the router
//!
//! # Design Decisions
//! - Header names are case-insensitive (`HeaderMap`)
//! - An empty body is stored as `None`
//! - Payload bodies are always sent as `application/json`

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, Method};
use uuid::Uuid;

use crate::http::encoder::{self, DecodeError, Payload};

/// Request ID header name.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Named path parameters captured by a route pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(HashMap<String, String>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    pub id: Uuid,
    pub method: Method,
    /// Path without the query string.
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    /// Filled by the router when a pattern matches.
    pub params: Params,
}

impl Request {
    /// Create a request for `target`, which may carry a `?query`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.to_string(),
            query,
            headers: HeaderMap::new(),
            body: None,
            params: Params::default(),
        }
    }

    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: &str) -> Self {
        Self::new(Method::POST, target)
    }

    pub fn put(target: &str) -> Self {
        Self::new(Method::PUT, target)
    }

    pub fn patch(target: &str) -> Self {
        Self::new(Method::PATCH, target)
    }

    pub fn delete(target: &str) -> Self {
        Self::new(Method::DELETE, target)
    }

    /// Rebuild a request from the parts of an incoming HTTP request.
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        let id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .unwrap_or_else(Uuid::new_v4);

        Self {
            id,
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers.clone(),
            body: (!body.is_empty()).then_some(body),
            params: Params::default(),
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach raw body bytes.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.body = (!body.is_empty()).then_some(body);
        self
    }

    /// Attach a JSON payload and mark the body as `application/json`.
    pub fn json(mut self, payload: &Payload) -> Self {
        self.body = Some(encoder::encode(Some(payload)));
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self
    }

    /// A path parameter captured by the matched route.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Decoded query string pairs, in order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match &self.query {
            Some(query) => url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// First value of a query string parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// The body parsed as JSON; `None` when there is no body.
    pub fn payload(&self) -> Result<Option<Payload>, DecodeError> {
        self.body.as_deref().map(encoder::decode).transpose()
    }

    /// Path plus query string, as sent on the wire.
    pub fn target(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;
    use serde_json::json;

    #[test]
    fn test_target_split() {
        let req = Request::get("/movies?genre=sci%20fi&year=2016&year=2017");
        assert_eq!(req.path, "/movies");
        assert_eq!(req.query_param("genre").as_deref(), Some("sci fi"));
        assert_eq!(req.query_param("year").as_deref(), Some("2016"));
        assert_eq!(req.query_pairs().len(), 3);
        assert_eq!(req.target(), "/movies?genre=sci%20fi&year=2016&year=2017");
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let (parts, _) = HttpRequest::builder()
            .method("POST")
            .uri("http://localhost/movies")
            .header("Content-Type", "application/json")
            .body(())
            .unwrap()
            .into_parts();
        let req = Request::from_parts(&parts, Bytes::new());

        assert_eq!(req.headers.get("content-type").unwrap(), "application/json");
        assert_eq!(req.content_type(), Some("application/json"));
        assert!(req.body.is_none());
    }

    #[test]
    fn test_request_id_reused_when_valid() {
        let id = Uuid::new_v4();
        let (parts, _) = HttpRequest::builder()
            .uri("/movies")
            .header(X_REQUEST_ID, id.to_string())
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(Request::from_parts(&parts, Bytes::new()).id, id);

        let (parts, _) = HttpRequest::builder()
            .uri("/movies")
            .header(X_REQUEST_ID, "not-a-uuid")
            .body(())
            .unwrap()
            .into_parts();
        assert_ne!(Request::from_parts(&parts, Bytes::new()).id.to_string(), "not-a-uuid");
    }

    #[test]
    fn test_json_body() {
        let payload = Payload::new(json!({"movie": {"title": "", "year": 2021}}));
        let req = Request::post("/movies").json(&payload);

        assert_eq!(req.content_type(), Some("application/json"));
        assert_eq!(req.payload().unwrap(), Some(payload));
        assert_eq!(Request::post("/movies").payload().unwrap(), None);
    }

    #[test]
    fn test_malformed_body() {
        let req = Request::post("/movies").body("title=Arrival");
        assert!(req.payload().is_err());
    }
}
