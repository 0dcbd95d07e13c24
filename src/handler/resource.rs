//! Config-driven CRUD handlers over a record store.
//!
//! | Verb   | Pattern        | Action  | Success            |
//! |--------|----------------|---------|--------------------|
//! | GET    | /{name}        | index   | 200, all records   |
//! | GET    | /{name}/:id    | show    | 200, the record    |
//! | POST   | /{name}        | create  | 201 record, or 204 |
//! | PUT    | /{name}/:id    | update  | 200, the record    |
//! | PATCH  | /{name}/:id    | update  | 200, the record    |
//! | DELETE | /{name}/:id    | destroy | 204                |
//!
//! Bodies may wrap the fields in the param key (`{"movie": {...}}`) or
//! send them bare. Unknown ids are 404 `NotFound` faults.

use std::sync::Arc;

use serde_json::Value;

use crate::config::ResourceConfig;
use crate::handler::{handler_fn, HandlerError, HandlerFault, HandlerResult, Reply};
use crate::http::encoder::Payload;
use crate::http::Request;
use crate::routing::RouterBuilder;
use crate::store::{Fields, RecordStore};

/// A collection of records exposed over HTTP.
#[derive(Debug)]
pub struct Resource {
    name: String,
    param_key: String,
    permitted: Vec<String>,
    render_created: bool,
    store: Arc<dyn RecordStore>,
}

impl Resource {
    pub fn new(config: &ResourceConfig, store: Arc<dyn RecordStore>) -> Arc<Self> {
        Arc::new(Self {
            name: config.name.clone(),
            param_key: config.param_key(),
            permitted: config.permitted.clone(),
            render_created: config.render_created,
            store,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Register the resource's routes.
    pub fn mount(self: &Arc<Self>, builder: RouterBuilder) -> RouterBuilder {
        let collection = format!("/{}", self.name);
        let member = format!("/{}/:id", self.name);

        let index = self.clone();
        let show = self.clone();
        let create = self.clone();
        let put = self.clone();
        let patch = self.clone();
        let destroy = self.clone();

        builder
            .get(&collection, handler_fn(move |req| index.index(req)))
            .get(&member, handler_fn(move |req| show.show(req)))
            .post(&collection, handler_fn(move |req| create.create(req)))
            .put(&member, handler_fn(move |req| put.update(req)))
            .patch(&member, handler_fn(move |req| patch.update(req)))
            .delete(&member, handler_fn(move |req| destroy.destroy(req)))
    }

    fn index(&self, _request: &Request) -> HandlerResult {
        Ok(Reply::ok(Payload::from_serialize(&self.store.all())?))
    }

    fn show(&self, request: &Request) -> HandlerResult {
        let id = self.id(request)?;
        let record = self.store.find(id).ok_or_else(|| self.not_found(request))?;
        Ok(Reply::ok(Payload::from_serialize(&record)?))
    }

    fn create(&self, request: &Request) -> HandlerResult {
        let fields = self.permitted_fields(request)?;
        let record = self.store.create(fields);
        tracing::info!(resource = %self.name, id = record.id, "Record created");

        if self.render_created {
            Ok(Reply::created(Payload::from_serialize(&record)?))
        } else {
            Ok(Reply::no_content())
        }
    }

    fn update(&self, request: &Request) -> HandlerResult {
        let id = self.id(request)?;
        let fields = self.permitted_fields(request)?;
        let record = self
            .store
            .update(id, fields)
            .ok_or_else(|| self.not_found(request))?;
        Ok(Reply::ok(Payload::from_serialize(&record)?))
    }

    fn destroy(&self, request: &Request) -> HandlerResult {
        let id = self.id(request)?;
        self.store.delete(id).ok_or_else(|| self.not_found(request))?;
        tracing::info!(resource = %self.name, id, "Record deleted");
        Ok(Reply::no_content())
    }

    fn id(&self, request: &Request) -> Result<u64, HandlerError> {
        request
            .param("id")
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| self.not_found(request))
    }

    fn not_found(&self, request: &Request) -> HandlerError {
        HandlerError::RecordNotFound {
            resource: self.param_key.clone(),
            id: request.param("id").unwrap_or_default().to_string(),
        }
    }

    /// The submitted fields, unwrapped from the param key and filtered
    /// to the permitted list.
    fn permitted_fields(&self, request: &Request) -> Result<Fields, HandlerFault> {
        let missing = || HandlerError::MissingParam(self.param_key.clone());

        let payload = request.payload()?.ok_or_else(missing)?;
        let mut body = match payload.into_value() {
            Value::Object(body) => body,
            other => {
                return Err(HandlerError::InvalidBody(format!(
                    "expected a JSON object, got {}",
                    json_type(&other)
                ))
                .into())
            }
        };

        let mut fields = match body.remove(&self.param_key) {
            Some(Value::Object(fields)) => fields,
            Some(other) => {
                return Err(HandlerError::InvalidBody(format!(
                    "`{}` must be an object, got {}",
                    self.param_key,
                    json_type(&other)
                ))
                .into())
            }
            None => body,
        };

        if !self.permitted.is_empty() {
            let unpermitted: Vec<String> = fields
                .keys()
                .filter(|k| !self.permitted.contains(*k))
                .cloned()
                .collect();
            for key in &unpermitted {
                fields.remove(key);
            }
            if !unpermitted.is_empty() {
                tracing::debug!(resource = %self.name, ?unpermitted, "Unpermitted parameters dropped");
            }
        }

        if fields.is_empty() {
            return Err(missing().into());
        }
        Ok(fields)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
