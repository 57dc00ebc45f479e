//! Shared harness for integration tests.

use http::Method;
use serde_json::{Value, json};

use stratus::{ApiRequest, ApiResponse, StratusCloud};

/// A wired simulator plus the calls the tests make against it.
pub struct TestCloud {
    pub cloud: StratusCloud,
}

impl TestCloud {
    pub fn new() -> Self {
        Self {
            cloud: StratusCloud::with_defaults().expect("standard deployment"),
        }
    }

    /// Authenticate a user, returning the issued token.
    pub fn login(&self, username: &str) -> String {
        let response = self.cloud.router().authenticate(
            &ApiRequest::new(Method::POST, ["tokens"]).with_body(json!({
                "auth": {"passwordCredentials": {"username": username, "password": "pw"}}
            })),
        );
        assert_eq!(response.status.as_u16(), 200, "login failed: {:?}", response.body);
        response.body["access"]["token"]["id"]
            .as_str()
            .expect("token id")
            .to_string()
    }

    /// Dispatch a request to the compute plugin in region ORD.
    pub fn compute(&self, token: &str, request: ApiRequest) -> ApiResponse {
        self.cloud
            .router()
            .dispatch(token, "ORD", self.cloud.compute_service_id(), request)
    }

    /// Create a server, optionally with metadata, returning the response.
    pub fn create_server(&self, token: &str, name: &str, metadata: Option<Value>) -> ApiResponse {
        let mut server = json!({"name": name, "flavorRef": "2", "imageRef": "img-1"});
        if let Some(metadata) = metadata {
            server["metadata"] = metadata;
        }
        self.compute(
            token,
            ApiRequest::new(Method::POST, ["servers"]).with_body(json!({"server": server})),
        )
    }

    /// Get one server's detail document.
    pub fn get_server(&self, token: &str, id: &str) -> ApiResponse {
        self.compute(token, ApiRequest::new(Method::GET, ["servers", id]))
    }

    /// Run a server action.
    pub fn server_action(&self, token: &str, id: &str, body: Value) -> ApiResponse {
        self.compute(
            token,
            ApiRequest::new(Method::POST, ["servers", id, "action"]).with_body(body),
        )
    }

    /// Advance the virtual clock through the control plane.
    pub fn tick(&self, seconds: f64) {
        self.cloud
            .control()
            .tick(&json!({"amount": seconds}))
            .expect("tick");
    }

    /// Register a behavior through the control plane, returning its id.
    pub fn register_behavior(&self, event: &str, region: Option<&str>, spec: Value) -> String {
        let response = self
            .cloud
            .control()
            .register_behavior(event, region, &spec)
            .expect("behavior registration");
        response.body["id"].as_str().expect("registration id").to_string()
    }
}

/// Extract the created server id out of a creation response.
pub fn created_id(response: &ApiResponse) -> String {
    response.body["server"]["id"]
        .as_str()
        .expect("server id")
        .to_string()
}
