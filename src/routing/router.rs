//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the matching route for a request
//! - Run the handler, encode its reply or turn its fault into a response
//! - Append one diagnostic record per request
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan over routes (acceptable for typical route counts)
//! - Explicit 404 rather than silent default
//! - Panics are caught and reported at the route's registration site

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::http::{Method, StatusCode};

use crate::diagnostics::{
    Diagnostics, Encoding, Fault, Handling, RecordEntry, Routing, SourceLocation, Stage,
};
use crate::handler::{Handler, HandlerError, HandlerFault, HandlerResult};
use crate::http::request::Params;
use crate::http::{encoder, Request, Response};
use crate::observability::metrics;
use crate::routing::matcher::PathPattern;
use crate::routing::RouteError;

/// A registered (verb, pattern) → handler mapping.
pub struct Route {
    method: Method,
    pattern: PathPattern,
    handler: Box<dyn Handler>,
    registered_at: SourceLocation,
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn registered_at(&self) -> &SourceLocation {
        &self.registered_at
    }

    fn invoke(&self, request: &Request) -> HandlerResult {
        match panic::catch_unwind(AssertUnwindSafe(|| self.handler.handle(request))) {
            Ok(result) => result,
            Err(panic) => Err(HandlerFault::at(
                HandlerError::Other(format!("handler panicked: {}", panic_message(panic.as_ref()))),
                self.registered_at.clone(),
            )),
        }
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("registered_at", &self.registered_at)
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

struct PendingRoute {
    method: Method,
    pattern: String,
    handler: Box<dyn Handler>,
    registered_at: SourceLocation,
}

/// Collects routes; `build` validates them and freezes the table.
#[derive(Default)]
pub struct RouterBuilder {
    pending: Vec<PendingRoute>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` requests matching `pattern`.
    #[track_caller]
    pub fn route<H>(mut self, method: Method, pattern: &str, handler: H) -> Self
    where
        H: Handler + 'static,
    {
        self.pending.push(PendingRoute {
            method,
            pattern: pattern.to_string(),
            handler: Box::new(handler),
            registered_at: SourceLocation::caller(),
        });
        self
    }

    #[track_caller]
    pub fn get<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.route(Method::GET, pattern, handler)
    }

    #[track_caller]
    pub fn post<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.route(Method::POST, pattern, handler)
    }

    #[track_caller]
    pub fn put<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.route(Method::PUT, pattern, handler)
    }

    #[track_caller]
    pub fn patch<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.route(Method::PATCH, pattern, handler)
    }

    #[track_caller]
    pub fn delete<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.route(Method::DELETE, pattern, handler)
    }

    /// Compile every pattern and reject duplicates.
    pub fn build(self, diagnostics: Arc<Diagnostics>) -> Result<Router, RouteError> {
        let mut routes: Vec<Route> = Vec::with_capacity(self.pending.len());

        for pending in self.pending {
            let pattern = PathPattern::parse(&pending.pattern)?;
            if let Some(existing) = routes
                .iter()
                .find(|r| r.method == pending.method && r.pattern == pattern)
            {
                return Err(RouteError::Duplicate {
                    method: pending.method,
                    pattern: pattern.as_str().to_string(),
                    first: existing.registered_at.clone(),
                });
            }
            routes.push(Route {
                method: pending.method,
                pattern,
                handler: pending.handler,
                registered_at: pending.registered_at,
            });
        }

        Ok(Router { routes, diagnostics })
    }
}

/// Immutable route table plus the diagnostics log it reports to.
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
    diagnostics: Arc<Diagnostics>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(&Route, Params)> {
        self.routes
            .iter()
            .filter(|r| r.method == *method)
            .find_map(|r| r.pattern.capture(path).map(|params| (r, params)))
    }

    /// Serve one request. Always returns a response and always appends
    /// exactly one diagnostic record.
    pub fn dispatch(&self, mut request: Request) -> Response {
        let start = Instant::now();
        let mut trail = vec![Stage::Received];

        let Some((route, params)) = self.lookup(&request.method, &request.path) else {
            trail.push(Stage::Routed(Routing::Unmatched));
            tracing::warn!(
                request_id = %request.id,
                method = %request.method,
                path = %request.path,
                "No route matched"
            );
            let fault = Fault::not_found(format!(
                "No route matches [{}] \"{}\"",
                request.method, request.path
            ));
            let response = Response::faulted(StatusCode::NOT_FOUND, fault);
            self.finish(&request, None, &response, trail, start);
            return response;
        };

        trail.push(Stage::Routed(Routing::Matched));
        request.params = params;
        tracing::debug!(
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            route = %route.pattern,
            params = ?request.params,
            "Dispatching request"
        );

        let response = match route.invoke(&request) {
            Ok(reply) => {
                trail.push(Stage::Handled(Handling::Ok));
                let status = reply.status();
                let body = encoder::encode(reply.payload());
                trail.push(Stage::Encoded(if body.is_empty() {
                    Encoding::Empty
                } else {
                    Encoding::Ok
                }));
                Response::new(status, body)
            }
            Err(fault) => {
                trail.push(Stage::Handled(Handling::Faulted));
                Response::faulted(fault.status(), fault.to_fault())
            }
        };

        self.finish(&request, Some(route), &response, trail, start);
        response
    }

    fn finish(
        &self,
        request: &Request,
        route: Option<&Route>,
        response: &Response,
        trail: Vec<Stage>,
        start: Instant,
    ) {
        let mut entry = RecordEntry::new(request.method.clone(), request.path.clone(), response.status)
            .request_id(request.id)
            .fault(response.fault.clone())
            .trail(trail);
        if let Some(route) = route {
            entry = entry.route(route.pattern.as_str());
        }
        self.diagnostics.append(entry);

        let route_label = route.map_or("none", |r| r.pattern.as_str());
        metrics::record_request(request.method.as_str(), response.status.as_u16(), route_label, start);
        if let Some(fault) = &response.fault {
            metrics::record_fault(fault.kind);
        }
    }
}
