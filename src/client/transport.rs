//! Ways of getting a request to a router.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use url::Url;

use crate::config::ClientConfig;
use crate::http::{Request, Response, X_REQUEST_ID};
use crate::routing::Router;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("target must be an absolute path, got '{0}'")]
    InvalidTarget(String),
}

/// Sends one request and yields its response.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, TransportError>> + Send;
}

/// Sends requests over HTTP to a base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let base_url = Url::parse(&config.base_url)?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        // Absolute paths replace the base URL's path. Anything else could
        // change the host (`//other/...`, `http://...`).
        let target = request.target();
        if !target.starts_with('/') || target.starts_with("//") {
            return Err(TransportError::InvalidTarget(target));
        }
        let url = self.base_url.join(&target)?;

        let mut headers = request.headers.clone();
        if !headers.contains_key(X_REQUEST_ID) {
            if let Ok(value) = HeaderValue::from_str(&request.id.to_string()) {
                headers.insert(X_REQUEST_ID, value);
            }
        }

        let mut builder = self.client.request(request.method.clone(), url).headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Response::from_parts(status, headers, body))
    }
}

/// Dispatches requests straight into a router, skipping the network.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    router: Arc<Router>,
}

impl LocalTransport {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }
}

impl Transport for LocalTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        Ok(self.router.dispatch(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_must_parse() {
        let config = ClientConfig {
            base_url: "not a url".to_string(),
            timeout_secs: None,
        };
        assert!(matches!(
            HttpTransport::new(&config),
            Err(TransportError::Url(_))
        ));
    }

    #[tokio::test]
    async fn test_host_changing_targets_are_rejected() {
        let transport = HttpTransport::new(&ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: Some(1),
        })
        .unwrap();

        for target in ["//example.com/movies", "http://example.com/movies"] {
            let err = transport.send(Request::get(target)).await.unwrap_err();
            assert!(
                matches!(&err, TransportError::InvalidTarget(t) if t == target),
                "{}",
                err
            );
        }
    }
}
