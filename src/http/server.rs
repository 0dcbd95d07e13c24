//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum app: introspection routes plus a catch-all
//! - Wire up middleware (tracing, request ID)
//! - Read request bodies within the size and time limits
//! - Hand every other request to the harness `Router`
//!
//! # Design Decisions
//! - The catch-all owns routing; axum only separates `/_harness/*`
//! - Body reads that fail are still recorded, so no request goes unlogged

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{request::Parts, StatusCode},
    routing::any,
};
use http_body_util::LengthLimitError;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin;
use crate::config::HarnessConfig;
use crate::diagnostics::{Diagnostics, Fault, RecordEntry, SourceLocation, Stage};
use crate::http::{Request, Response, X_REQUEST_ID};
use crate::routing::Router;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub diagnostics: Arc<Diagnostics>,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
}

/// HTTP front end for a harness `Router`.
pub struct HttpServer {
    app: axum::Router,
    config: HarnessConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving `router`.
    pub fn new(config: HarnessConfig, router: Arc<Router>) -> Self {
        let state = AppState {
            diagnostics: router.diagnostics().clone(),
            router,
            max_body_bytes: config.listener.max_body_bytes,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        let app = Self::build_app(state);
        Self { app, config }
    }

    /// Build the axum app with all middleware layers.
    fn build_app(state: AppState) -> axum::Router {
        axum::Router::new()
            .merge(admin::admin_routes())
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &axum::extract::Request| {
                    let request_id = req
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id
                    )
                }),
            )
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The axum app, for in-process use.
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }
}

/// Catch-all handler: read the body, then dispatch through the harness router.
async fn dispatch_handler(State(state): State<AppState>, request: axum::extract::Request) -> Response {
    let (parts, body) = request.into_parts();

    let read = tokio::time::timeout(
        state.request_timeout,
        axum::body::to_bytes(body, state.max_body_bytes),
    )
    .await;

    match read {
        Ok(Ok(body)) => state.router.dispatch(Request::from_parts(&parts, body)),
        Ok(Err(e)) => reject(
            &state,
            &parts,
            body_error_status(&e),
            format!("request body rejected: {}", e),
        ),
        Err(_) => reject(
            &state,
            &parts,
            StatusCode::REQUEST_TIMEOUT,
            format!("request body not received within {:?}", state.request_timeout),
        ),
    }
}

/// 413 when the body exceeded the limit, 400 for any other read failure
/// (e.g. the client hung up mid-body).
fn body_error_status(error: &axum::Error) -> StatusCode {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return StatusCode::PAYLOAD_TOO_LARGE;
        }
        source = e.source();
    }
    StatusCode::BAD_REQUEST
}

/// Answer a request that never reached the router, and record it.
#[track_caller]
fn reject(state: &AppState, parts: &Parts, status: StatusCode, message: String) -> Response {
    let request = Request::from_parts(parts, Bytes::new());
    tracing::warn!(
        request_id = %request.id,
        method = %request.method,
        path = %request.path,
        status = %status,
        "{}", message
    );

    let response = Response::faulted(status, Fault::server(message, SourceLocation::caller()));
    state.diagnostics.append(
        RecordEntry::new(request.method.clone(), request.path.clone(), status)
            .request_id(request.id)
            .fault(response.fault.clone())
            .trail(vec![Stage::Received]),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{FaultKind, RecordFilter};
    use crate::handler::{handler_fn, Reply};
    use axum::body::Body;
    use tower::ServiceExt;

    fn server(max_body_bytes: usize) -> (HttpServer, Arc<Diagnostics>) {
        let diagnostics = Arc::new(Diagnostics::new(false));
        let router = Router::builder()
            .post("/movies", handler_fn(|req| Ok(Reply::from(req.payload()?))))
            .build(diagnostics.clone())
            .unwrap();
        let mut config = HarnessConfig::default();
        config.listener.max_body_bytes = max_body_bytes;
        (HttpServer::new(config, Arc::new(router)), diagnostics)
    }

    #[tokio::test]
    async fn test_request_id_is_set_and_propagated() {
        let (server, diagnostics) = server(1024);
        let response = server
            .app()
            .oneshot(
                axum::http::Request::post("/movies")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"title":"Dune"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers().get(X_REQUEST_ID).unwrap().to_str().unwrap().to_string();
        let record = diagnostics.query(RecordFilter::all()).first().unwrap();
        assert_eq!(record.request_id.to_string(), id);
    }

    #[tokio::test]
    async fn test_root_goes_through_router() {
        let (server, diagnostics) = server(1024);
        let response = server
            .app()
            .oneshot(axum::http::Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get("x-fault-kind").unwrap(), "NotFound");
        assert_eq!(diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn test_only_length_limit_is_413() {
        let too_long = axum::body::to_bytes(Body::from("a longer body"), 4)
            .await
            .unwrap_err();
        assert_eq!(body_error_status(&too_long), StatusCode::PAYLOAD_TOO_LARGE);

        let reset = axum::Error::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "client went away",
        ));
        assert_eq!(body_error_status(&reset), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_body_is_recorded() {
        let (server, diagnostics) = server(8);
        let response = server
            .app()
            .oneshot(
                axum::http::Request::post("/movies")
                    .body(Body::from(r#"{"title":"a long title"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let record = diagnostics.query(RecordFilter::all()).first().unwrap();
        assert_eq!(record.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(record.fault_kind(), Some(FaultKind::ServerFault));
        assert_eq!(record.trail, vec![Stage::Received, Stage::Logged]);
    }
}
