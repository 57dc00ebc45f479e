//! In-process request and response value types.
//!
//! The excluded transport adapter converts whatever it receives on the wire
//! into an [`ApiRequest`] and renders the returned [`ApiResponse`]. Inside
//! the core everything is a direct synchronous call.

use std::collections::HashMap;

use http::{Method, StatusCode};
use serde_json::{Value, json};

use crate::error::AppError;

/// A request delivered to a plugin after the router resolved the caller's
/// token to a tenant.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Tenant on whose behalf the request is made.
    pub tenant_id: String,
    /// Region the addressed endpoint belongs to.
    pub region: String,
    /// Request method.
    pub method: Method,
    /// Path segments below the service root, e.g. `["servers", "<id>"]`.
    pub path: Vec<String>,
    /// Query parameters.
    pub query: HashMap<String, String>,
    /// Parsed JSON body, if any.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Create a request for the given method and path segments.
    pub fn new(method: Method, path: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tenant_id: String::new(),
            region: String::new(),
            method,
            path: path.into_iter().map(Into::into).collect(),
            query: HashMap::new(),
            body: None,
        }
    }

    /// Set the tenant this request acts for.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }

    /// Set the region this request is addressed to.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Set the JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The path segment at `index`, if present.
    pub fn segment(&self, index: usize) -> Option<&str> {
        self.path.get(index).map(String::as_str)
    }

    /// The JSON body, or a validation error if the request has none.
    pub fn require_body(&self) -> Result<&Value, AppError> {
        self.body
            .as_ref()
            .ok_or_else(|| AppError::validation("Malformed request body"))
    }
}

/// A response produced by a plugin or by the control plane.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Status code the transport layer replies with.
    pub status: StatusCode,
    /// JSON document body.
    pub body: Value,
}

impl ApiResponse {
    /// Create a response with an explicit status.
    pub fn with_status(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// Create a `200 OK` response.
    pub fn ok(body: Value) -> Self {
        Self::with_status(StatusCode::OK, body)
    }

    /// Create a `201 Created` response.
    pub fn created(body: Value) -> Self {
        Self::with_status(StatusCode::CREATED, body)
    }

    /// Create a `202 Accepted` response, the usual reply to action calls.
    pub fn accepted(body: Value) -> Self {
        Self::with_status(StatusCode::ACCEPTED, body)
    }

    /// Create a `204 No Content` response.
    pub fn no_content() -> Self {
        Self::with_status(StatusCode::NO_CONTENT, Value::Null)
    }

    /// Create an injected-failure response from a behavior-configured
    /// status code, falling back to 500 when the code is out of range.
    pub fn injected(code: u16, body: Value) -> Self {
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::with_status(status, body)
    }
}

impl From<AppError> for ApiResponse {
    fn from(err: AppError) -> Self {
        let status = err.kind.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err.message, "Internal simulator error");
        }
        let body = json!({
            err.kind.body_label(): {
                "message": err.message,
                "code": status.as_u16(),
            }
        });
        Self { status, body }
    }
}
