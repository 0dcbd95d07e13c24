//! Shared utilities for integration tests.

#![allow(dead_code)]

use request_harness::client::{Fetcher, HttpTransport};
use request_harness::config::{ClientConfig, HarnessConfig, ResourceConfig};
use request_harness::handler::{handler_fn, HandlerError, HandlerFault, Reply};
use request_harness::http::Payload;
use request_harness::lifecycle::{startup, Harness};
use request_harness::routing::RouterBuilder;
use serde_json::json;

/// Config listening on an ephemeral port, with the given resources.
pub fn test_config(resources: &[&str]) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.diagnostics.log_records = false;
    config.resources = resources.iter().map(|name| ResourceConfig::new(*name)).collect();
    config
}

/// Routes exercising each outcome a handler can have.
pub fn scenario_routes() -> RouterBuilder {
    RouterBuilder::new()
        .get(
            "/movie",
            handler_fn(|_| Ok(Reply::ok(Payload::new(json!({"title": "", "year": 2021}))))),
        )
        .post("/movies", handler_fn(|_| Ok(Reply::no_content())))
        .get(
            "/broken",
            handler_fn(|_| Err(HandlerFault::new(HandlerError::undefined("moviez")))),
        )
        .get("/panics", handler_fn(|_| panic!("handler blew up")))
        .post(
            "/echo",
            handler_fn(|req| Ok(Reply::from(req.payload()?))),
        )
}

/// Start a harness on an ephemeral port.
pub async fn start_harness(builder: RouterBuilder, resources: &[&str]) -> Harness {
    startup::start_with(test_config(resources), builder)
        .await
        .expect("harness should start")
}

/// HTTP fetcher pointed at a running harness.
pub fn http_fetcher(harness: &Harness) -> Fetcher<HttpTransport> {
    Fetcher::from_config(&ClientConfig {
        base_url: harness.base_url(),
        timeout_secs: Some(5),
    })
    .expect("fetcher should build")
}
