//! Identity service: authentication operations over the session store.
//!
//! Turns identity requests into sessions via the store, consulting the
//! behavior engine first so test authors can inject failures for matching
//! credentials. Successful authentication renders an access document that
//! embeds the per-tenant service catalog supplied by the router.

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Value, json};
use uuid::Uuid;

use stratus_behavior::{Attributes, BehaviorRegistry};
use stratus_core::types::{ApiRequest, ApiResponse};
use stratus_core::{AppError, AppResult};
use stratus_entity::session::Session;

use crate::behaviors::{AuthBehavior, authentication_event};
use crate::store::{SessionStore, TenantMismatch};

/// Produces the per-tenant service catalog embedded in access documents.
pub type CatalogFn<'a> = &'a dyn Fn(&str) -> Vec<Value>;

/// The identity layer's operation surface.
#[derive(Debug)]
pub struct IdentityService {
    store: Arc<SessionStore>,
    behaviors: RwLock<BehaviorRegistry<AuthBehavior>>,
}

impl IdentityService {
    /// Creates the identity service over a session store.
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            behaviors: RwLock::new(BehaviorRegistry::new(authentication_event())),
        }
    }

    /// The underlying session store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Register an authentication behavior from the JSON surface.
    pub fn register_behavior(&self, spec: &Value) -> AppResult<Uuid> {
        self.behaviors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_from_spec(spec)
    }

    /// Remove an authentication behavior registration.
    pub fn unregister_behavior(&self, id: Uuid) -> AppResult<()> {
        self.behaviors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unregister(id)
    }

    /// Authenticate from a credentials document.
    ///
    /// Accepted forms under `"auth"`: `passwordCredentials`,
    /// `apiKeyCredentials`, `token`, or a bare tenant id. An optional
    /// `tenantId`/`tenantName` scopes the request and triggers the
    /// tenant-mismatch contract.
    pub fn authenticate(&self, request: &ApiRequest, catalog: CatalogFn<'_>) -> AppResult<ApiResponse> {
        let body = request.require_body()?;
        let auth = body
            .get("auth")
            .and_then(Value::as_object)
            .ok_or_else(|| AppError::validation("Invalid JSON request body"))?;

        let tenant = auth
            .get("tenantId")
            .or_else(|| auth.get("tenantName"))
            .and_then(Value::as_str);

        if let Some(creds) = auth.get("passwordCredentials") {
            let username = require_str(creds, "username")?;
            let password = require_str(creds, "password")?;
            return Ok(self.password_flow(username, password, tenant, catalog));
        }
        if let Some(creds) = auth.get("apiKeyCredentials") {
            let username = require_str(creds, "username")?;
            let key = require_str(creds, "apiKey")?;
            return Ok(self.api_key_flow(username, key, tenant, catalog));
        }
        if let Some(token) = auth.get("token") {
            let token = require_str(token, "id")?;
            return Ok(self.token_flow(token, tenant, catalog));
        }
        if let Some(tenant) = tenant {
            let session = self.store.session_for_tenant_id(tenant, None);
            return Ok(ApiResponse::ok(self.access_document(&session, catalog)));
        }

        Err(AppError::validation("Invalid JSON request body"))
    }

    /// Validate an existing token. Unknown tokens are not enrolled; they
    /// are a 404.
    pub fn validate_token(&self, token: &str, catalog: CatalogFn<'_>) -> AppResult<ApiResponse> {
        let session = self
            .store
            .existing_session_for_token(token)
            .ok_or_else(|| AppError::not_found(format!("Token {token} could not be found")))?;

        let mut access = self.access_document(&session, catalog);
        if let Some(impersonator) = self.store.impersonator_for_token(token)
            && let Some(doc) = access.get_mut("access")
        {
            doc["impersonator"] = json!({
                "id": impersonator.user_id,
                "name": impersonator.username,
            });
        }
        Ok(ApiResponse::ok(access))
    }

    /// Grant an impersonation token for a target user.
    ///
    /// Body shape: `{"impersonation": {"user": {"username": ...},
    /// "expire-in-seconds": N}}`. The impersonator is identified by the
    /// token the transport layer resolved for the caller.
    pub fn impersonate(
        &self,
        request: &ApiRequest,
        impersonator_token: Option<&str>,
    ) -> AppResult<ApiResponse> {
        let body = request.require_body()?;
        let impersonation = body
            .get("impersonation")
            .ok_or_else(|| AppError::validation("Invalid JSON request body"))?;
        let username = impersonation
            .get("user")
            .map(|user| require_str(user, "username"))
            .transpose()?
            .ok_or_else(|| AppError::validation("Invalid JSON request body"))?;
        let ttl = impersonation
            .get("expire-in-seconds")
            .and_then(Value::as_u64)
            .ok_or_else(|| AppError::validation("Invalid JSON request body"))?;

        let grant = self
            .store
            .session_for_impersonation(username, ttl, impersonator_token, None);

        Ok(ApiResponse::ok(json!({
            "access": {
                "token": {
                    "id": grant.token,
                    "expires": grant.session.expires.to_rfc3339(),
                }
            }
        })))
    }

    fn password_flow(
        &self,
        username: &str,
        password: &str,
        tenant: Option<&str>,
        catalog: CatalogFn<'_>,
    ) -> ApiResponse {
        if let Some(response) = self.injected_failure(Some(username), tenant, None) {
            return response;
        }
        match self
            .store
            .session_for_username_password(username, password, tenant)
        {
            Ok(session) => ApiResponse::ok(self.access_document(&session, catalog)),
            Err(mismatch) => credential_mismatch_response(&mismatch),
        }
    }

    fn api_key_flow(
        &self,
        username: &str,
        key: &str,
        tenant: Option<&str>,
        catalog: CatalogFn<'_>,
    ) -> ApiResponse {
        if let Some(response) = self.injected_failure(Some(username), tenant, None) {
            return response;
        }
        match self.store.session_for_api_key(username, key, tenant) {
            Ok(session) => ApiResponse::ok(self.access_document(&session, catalog)),
            Err(mismatch) => credential_mismatch_response(&mismatch),
        }
    }

    fn token_flow(&self, token: &str, tenant: Option<&str>, catalog: CatalogFn<'_>) -> ApiResponse {
        if let Some(response) = self.injected_failure(None, tenant, Some(token)) {
            return response;
        }
        match self.store.session_for_token(token, tenant) {
            Ok(session) => ApiResponse::ok(self.access_document(&session, catalog)),
            Err(mismatch) => token_mismatch_response(&mismatch),
        }
    }

    /// Consult the behavior engine; `Some` is an injected failure response.
    fn injected_failure(
        &self,
        username: Option<&str>,
        tenant: Option<&str>,
        token: Option<&str>,
    ) -> Option<ApiResponse> {
        let mut attrs = Attributes::new();
        if let Some(username) = username {
            attrs.insert("username".to_string(), json!(username));
        }
        if let Some(tenant) = tenant {
            attrs.insert("tenant_id".to_string(), json!(tenant));
        }
        if let Some(token) = token {
            attrs.insert("token".to_string(), json!(token));
        }

        let behavior = self
            .behaviors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .behavior_for_attributes(&attrs);
        match behavior {
            AuthBehavior::Default => None,
            AuthBehavior::Fail { code, message } => {
                tracing::info!(code, "Injected authentication failure");
                Some(ApiResponse::injected(code, failure_body(code, &message)))
            }
        }
    }

    fn access_document(&self, session: &Session, catalog: CatalogFn<'_>) -> Value {
        json!({
            "access": {
                "token": {
                    "id": session.token,
                    "expires": session.expires.to_rfc3339(),
                    "tenant": {
                        "id": session.tenant_id,
                        "name": session.tenant_id,
                    },
                },
                "user": {
                    "id": session.user_id,
                    "name": session.username,
                    "roles": [{"id": "3", "name": "identity:user-admin"}],
                },
                "serviceCatalog": catalog(&session.tenant_id),
            }
        })
    }
}

/// The username/password call site renders tenant mismatch as an
/// `unauthorized`-shaped 401.
fn credential_mismatch_response(mismatch: &TenantMismatch) -> ApiResponse {
    ApiResponse::injected(
        401,
        json!({
            "unauthorized": {
                "code": 401,
                "message": format!(
                    "Tenant with Name/Id: '{}' is not valid for User '{}' (id: '{}')",
                    mismatch.requested, mismatch.session.username, mismatch.session.user_id,
                ),
            }
        }),
    )
}

/// The token call site renders the same mismatch as an
/// `itemNotFound`-shaped 401. Upstream is inconsistent here; both shapes
/// are preserved deliberately.
fn token_mismatch_response(mismatch: &TenantMismatch) -> ApiResponse {
    ApiResponse::injected(
        401,
        json!({
            "itemNotFound": {
                "code": 401,
                "message": format!(
                    "Token doesn't belong to Tenant with Id/Name: '{}'",
                    mismatch.requested,
                ),
            }
        }),
    )
}

fn failure_body(code: u16, message: &str) -> Value {
    let label = match code {
        401 => "unauthorized",
        403 => "forbidden",
        404 => "itemNotFound",
        _ => "identityFault",
    };
    json!({label: {"code": code, "message": message}})
}

fn require_str<'a>(value: &'a Value, key: &str) -> AppResult<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::validation(format!("Invalid JSON request body: missing '{key}'")))
}
