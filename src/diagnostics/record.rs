//! Diagnostic records and the per-request lifecycle trail.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diagnostics::fault::{Fault, FaultKind};

/// Outcome of route lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Routing {
    Matched,
    Unmatched,
}

/// Outcome of invoking the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handling {
    Ok,
    Faulted,
}

/// Outcome of encoding the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Ok,
    Empty,
}

/// A step in the lifecycle of a single request.
///
/// ```text
/// Received → Routed{matched|unmatched} → Handled{ok|faulted} → Encoded{ok|empty} → Logged
/// ```
///
/// Unmatched requests skip `Handled` and `Encoded`; faulted ones skip `Encoded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "outcome", rename_all = "snake_case")]
pub enum Stage {
    Received,
    Routed(Routing),
    Handled(Handling),
    Encoded(Encoding),
    Logged,
}

/// One request's outcome. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    /// Insertion position in the log, starting at 0.
    pub seq: u64,
    pub request_id: Uuid,
    #[serde(with = "method_text")]
    pub method: Method,
    pub path: String,
    /// Pattern of the matched route, `None` when nothing matched.
    pub route: Option<String>,
    #[serde(with = "status_code")]
    pub status: StatusCode,
    pub fault: Option<Fault>,
    pub trail: Vec<Stage>,
    /// Milliseconds since the UNIX epoch.
    pub timestamp_ms: u64,
}

impl DiagnosticRecord {
    pub fn fault_kind(&self) -> Option<FaultKind> {
        self.fault.as_ref().map(|f| f.kind)
    }
}

impl fmt::Display for DiagnosticRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} — {}", self.method, self.path, self.status)?;
        if let Some(fault) = &self.fault {
            write!(f, " — {}", fault)?;
        }
        Ok(())
    }
}

/// Everything needed to append a record; the log assigns `seq` and the timestamp.
#[derive(Debug, Clone)]
pub struct RecordEntry {
    pub request_id: Uuid,
    pub method: Method,
    pub path: String,
    pub route: Option<String>,
    pub status: StatusCode,
    pub fault: Option<Fault>,
    pub trail: Vec<Stage>,
}

impl RecordEntry {
    pub fn new(method: Method, path: impl Into<String>, status: StatusCode) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method,
            path: path.into(),
            route: None,
            status,
            fault: None,
            trail: Vec::new(),
        }
    }

    pub fn request_id(mut self, id: Uuid) -> Self {
        self.request_id = id;
        self
    }

    pub fn route(mut self, pattern: impl Into<String>) -> Self {
        self.route = Some(pattern.into());
        self
    }

    pub fn fault(mut self, fault: Option<Fault>) -> Self {
        self.fault = fault;
        self
    }

    pub fn trail(mut self, trail: Vec<Stage>) -> Self {
        self.trail = trail;
        self
    }

    pub(crate) fn into_record(mut self, seq: u64) -> DiagnosticRecord {
        if self.trail.last() != Some(&Stage::Logged) {
            self.trail.push(Stage::Logged);
        }
        DiagnosticRecord {
            seq,
            request_id: self.request_id,
            method: self.method,
            path: self.path,
            route: self.route,
            status: self.status,
            fault: self.fault,
            trail: self.trail,
            timestamp_ms: now_millis(),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Selects records from the log. Empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub method: Option<Method>,
    pub path: Option<String>,
    pub status: Option<StatusCode>,
    pub kind: Option<FaultKind>,
    pub faulted_only: bool,
    pub request_id: Option<Uuid>,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn kind(mut self, kind: FaultKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn faulted(mut self) -> Self {
        self.faulted_only = true;
        self
    }

    pub fn request_id(mut self, id: Uuid) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn matches(&self, record: &DiagnosticRecord) -> bool {
        self.method.as_ref().map_or(true, |m| *m == record.method)
            && self.path.as_ref().map_or(true, |p| *p == record.path)
            && self.status.map_or(true, |s| s == record.status)
            && self.kind.map_or(true, |k| record.fault_kind() == Some(k))
            && (!self.faulted_only || record.fault.is_some())
            && self.request_id.map_or(true, |id| id == record.request_id)
    }
}

mod method_text {
    use axum::http::Method;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(method.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Method, D::Error> {
        let text = String::deserialize(deserializer)?;
        Method::from_bytes(text.as_bytes()).map_err(D::Error::custom)
    }
}

mod status_code {
    use axum::http::StatusCode;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(status.as_u16())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StatusCode, D::Error> {
        let code = u16::deserialize(deserializer)?;
        StatusCode::from_u16(code).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::fault::SourceLocation;

    fn sample() -> DiagnosticRecord {
        RecordEntry::new(Method::POST, "/movies", StatusCode::INTERNAL_SERVER_ERROR)
            .route("/movies")
            .fault(Some(Fault::server(
                "undefined name `movie_params`",
                SourceLocation { file: "src/app.rs".into(), line: 7, column: 3 },
            )))
            .trail(vec![
                Stage::Received,
                Stage::Routed(Routing::Matched),
                Stage::Handled(Handling::Faulted),
            ])
            .into_record(4)
    }

    #[test]
    fn test_logged_is_terminal() {
        let record = sample();
        assert_eq!(record.seq, 4);
        assert_eq!(record.trail.last(), Some(&Stage::Logged));
        assert_eq!(record.trail.iter().filter(|s| **s == Stage::Logged).count(), 1);
        assert!(record.timestamp_ms > 0);
    }

    #[test]
    fn test_log_line_shape() {
        assert_eq!(
            sample().to_string(),
            "POST /movies — 500 Internal Server Error — ServerFault: undefined name `movie_params` at src/app.rs:7:3"
        );

        let ok = RecordEntry::new(Method::GET, "/movies", StatusCode::OK).into_record(0);
        assert_eq!(ok.to_string(), "GET /movies — 200 OK");
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["method"], "POST");
        assert_eq!(value["status"], 500);
        assert_eq!(value["fault"]["kind"], "ServerFault");
        assert_eq!(value["trail"][1], serde_json::json!({"stage": "routed", "outcome": "matched"}));
        assert_eq!(value["trail"][3], serde_json::json!({"stage": "logged"}));
    }

    #[test]
    fn test_filter() {
        let record = sample();
        assert!(RecordFilter::all().matches(&record));
        assert!(RecordFilter::all().faulted().kind(FaultKind::ServerFault).matches(&record));
        assert!(RecordFilter::all().method(Method::POST).path("/movies").matches(&record));
        assert!(!RecordFilter::all().method(Method::GET).matches(&record));
        assert!(!RecordFilter::all().status(StatusCode::OK).matches(&record));
        assert!(!RecordFilter::all().kind(FaultKind::NotFound).matches(&record));
        assert!(!RecordFilter::all().request_id(Uuid::new_v4()).matches(&record));
    }
}
