//! Request/decode round trip with client-side fault reporting.

use std::sync::Arc;

use axum::http::StatusCode;

use crate::client::transport::{HttpTransport, LocalTransport, Transport, TransportError};
use crate::config::ClientConfig;
use crate::diagnostics::FaultKind;
use crate::http::{encoder, DecodeError, Payload, Request, Response};
use crate::observability::metrics;
use crate::routing::Router;

/// Fault detected by the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientFault {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("ParseError: {source} (status {status})")]
    Parse {
        status: StatusCode,
        #[source]
        source: DecodeError,
    },

    #[error("EmptyBody: expected a payload but the body was empty (status {status})")]
    EmptyBody { status: StatusCode },
}

impl ClientFault {
    /// Fault kind, if the fault belongs to the shared taxonomy.
    pub fn kind(&self) -> Option<FaultKind> {
        match self {
            Self::Transport(_) => None,
            Self::Parse { .. } => Some(FaultKind::ParseError),
            Self::EmptyBody { .. } => Some(FaultKind::EmptyBody),
        }
    }

    /// Status of the response the fault was raised on.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(_) => None,
            Self::Parse { status, .. } | Self::EmptyBody { status } => Some(*status),
        }
    }

    fn label(&self) -> &'static str {
        self.kind().map_or("Transport", |kind| kind.as_str())
    }
}

/// Decode a response body, exactly once.
pub fn decode_response(response: &Response) -> Result<Payload, ClientFault> {
    encoder::decode(&response.body).map_err(|source| ClientFault::Parse {
        status: response.status,
        source,
    })
}

/// Issues requests through a transport and decodes the replies.
#[derive(Debug, Clone)]
pub struct Fetcher<T> {
    transport: T,
}

impl Fetcher<HttpTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl Fetcher<LocalTransport> {
    pub fn local(router: Arc<Router>) -> Self {
        Self::new(LocalTransport::new(router))
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request and wait for the response.
    pub async fn send(&self, request: Request) -> Result<Response, ClientFault> {
        let label = Label::of(&request);
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| label.report(ClientFault::Transport(e)))?;

        if let Some(fault) = &response.fault {
            tracing::warn!(
                request_id = %label.id,
                method = %label.method,
                target = %label.target,
                status = %response.status,
                fault = %fault,
                "Server reported a fault"
            );
        }
        Ok(response)
    }

    /// Send, then decode the body. An error status is decoded like any other.
    pub async fn fetch(&self, request: Request) -> Result<Payload, ClientFault> {
        let label = Label::of(&request);
        let response = self.send(request).await?;
        decode_response(&response).map_err(|fault| label.report(fault))
    }

    /// Like [`fetch`](Self::fetch), but an empty body is an `EmptyBody` fault.
    pub async fn fetch_required(&self, request: Request) -> Result<Payload, ClientFault> {
        let label = Label::of(&request);
        let response = self.send(request).await?;
        if response.is_empty() {
            return Err(label.report(ClientFault::EmptyBody {
                status: response.status,
            }));
        }
        decode_response(&response).map_err(|fault| label.report(fault))
    }
}

/// What to say about a request once it has been moved into the transport.
struct Label {
    id: uuid::Uuid,
    method: axum::http::Method,
    target: String,
}

impl Label {
    fn of(request: &Request) -> Self {
        Self {
            id: request.id,
            method: request.method.clone(),
            target: request.target(),
        }
    }

    fn report(&self, fault: ClientFault) -> ClientFault {
        tracing::error!(
            request_id = %self.id,
            method = %self.method,
            target = %self.target,
            kind = fault.label(),
            "{}", fault
        );
        metrics::record_client_fault(fault.label());
        fault
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::handler::{handler_fn, Reply};
    use serde_json::json;

    fn fetcher() -> Fetcher<LocalTransport> {
        let router = Router::builder()
            .get("/movie", handler_fn(|_| Ok(Reply::ok(Payload::new(json!({"title": "Dune"}))))))
            .post("/movies", handler_fn(|_| Ok(Reply::no_content())))
            .build(Arc::new(Diagnostics::default()))
            .unwrap();
        Fetcher::local(Arc::new(router))
    }

    #[tokio::test]
    async fn test_fetch_decodes_payload() {
        let payload = fetcher().fetch(Request::get("/movie")).await.unwrap();
        assert_eq!(payload.as_value(), &json!({"title": "Dune"}));
    }

    #[tokio::test]
    async fn test_empty_body_is_parse_error() {
        let fault = fetcher().fetch(Request::post("/movies")).await.unwrap_err();
        assert_eq!(fault.kind(), Some(FaultKind::ParseError));
        assert_eq!(fault.status(), Some(StatusCode::NO_CONTENT));
        assert!(fault.to_string().contains("Unexpected end of JSON input"));
    }

    #[tokio::test]
    async fn test_required_body_reports_empty_body() {
        let fault = fetcher()
            .fetch_required(Request::post("/movies"))
            .await
            .unwrap_err();
        assert_eq!(fault.kind(), Some(FaultKind::EmptyBody));
    }

    #[tokio::test]
    async fn test_not_found_is_still_decoded() {
        let fetcher = fetcher();
        let response = fetcher.send(Request::get("/nowhere")).await.unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);

        let fault = fetcher.fetch(Request::get("/nowhere")).await.unwrap_err();
        assert_eq!(fault.kind(), Some(FaultKind::ParseError));
        assert_eq!(fault.status(), Some(StatusCode::NOT_FOUND));
    }
}
