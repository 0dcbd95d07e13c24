use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diagnostics::{DiagnosticRecord, FaultKind, RecordFilter};
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub records: usize,
    pub routes: Vec<RouteSummary>,
}

#[derive(Serialize)]
pub struct RouteSummary {
    pub method: String,
    pub pattern: String,
    pub registered_at: String,
}

/// Query string accepted by `GET /_harness/records`.
#[derive(Debug, Default, Deserialize)]
pub struct RecordsQuery {
    pub method: Option<String>,
    pub path: Option<String>,
    pub status: Option<u16>,
    pub kind: Option<FaultKind>,
    /// `true` keeps only faulted records; `false` is the same as absent.
    pub faulted: Option<bool>,
    pub request_id: Option<Uuid>,
}

impl RecordsQuery {
    /// Convert to a filter, rejecting values that are not a method or status code.
    pub fn into_filter(self) -> Result<RecordFilter, String> {
        let mut filter = RecordFilter::all();
        if let Some(method) = self.method {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .map_err(|_| format!("invalid method: {}", method))?;
            filter = filter.method(method);
        }
        if let Some(path) = self.path {
            filter = filter.path(path);
        }
        if let Some(status) = self.status {
            let status =
                StatusCode::from_u16(status).map_err(|_| format!("invalid status: {}", status))?;
            filter = filter.status(status);
        }
        if let Some(kind) = self.kind {
            filter = filter.kind(kind);
        }
        if self.faulted == Some(true) {
            filter = filter.faulted();
        }
        if let Some(id) = self.request_id {
            filter = filter.request_id(id);
        }
        Ok(filter)
    }
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let routes = state
        .router
        .routes()
        .iter()
        .map(|route| RouteSummary {
            method: route.method().to_string(),
            pattern: route.pattern().to_string(),
            registered_at: route.registered_at().to_string(),
        })
        .collect();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        records: state.diagnostics.len(),
        routes,
    })
}

pub async fn get_records(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<Vec<DiagnosticRecord>>, (StatusCode, String)> {
    let filter = query
        .into_filter()
        .map_err(|message| (StatusCode::BAD_REQUEST, message))?;

    let records = state
        .diagnostics
        .query(filter)
        .iter()
        .map(|record| DiagnosticRecord::clone(&record))
        .collect();
    Ok(Json(records))
}
