//! The router: token resolution, catalog assembly, and plugin dispatch.

use std::sync::Arc;

use serde_json::Value;

use stratus_core::config::catalog::CatalogConfig;
use stratus_core::types::{ApiRequest, ApiResponse};
use stratus_core::{AppError, AppResult};
use stratus_session::IdentityService;

use crate::registry::PluginRegistry;

/// Maps `(region, service id)` pairs to registered plugins, builds the
/// per-tenant service catalog, and dispatches requests after resolving the
/// caller's token through the session store.
#[derive(Debug)]
pub struct Router {
    config: CatalogConfig,
    identity: Arc<IdentityService>,
    registry: PluginRegistry,
}

impl Router {
    /// Creates a router over an identity service and a plugin registry.
    pub fn new(config: CatalogConfig, identity: Arc<IdentityService>, registry: PluginRegistry) -> Self {
        Self {
            config,
            identity,
            registry,
        }
    }

    /// The identity service requests authenticate through.
    pub fn identity(&self) -> &Arc<IdentityService> {
        &self.identity
    }

    /// The plugin registry.
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Regions this deployment advertises.
    pub fn regions(&self) -> &[String] {
        &self.config.regions
    }

    /// Assemble the service catalog documents for a tenant.
    pub fn catalog_for(&self, tenant_id: &str) -> Vec<Value> {
        self.registry
            .iter()
            .flat_map(|plugin| plugin.catalog_entries(tenant_id, &self.config.regions))
            .map(|entry| entry.to_json())
            .collect()
    }

    /// Authenticate from a credentials document, embedding the catalog in
    /// the access document.
    pub fn authenticate(&self, request: &ApiRequest) -> ApiResponse {
        let catalog = |tenant: &str| self.catalog_for(tenant);
        self.identity
            .authenticate(request, &catalog)
            .unwrap_or_else(ApiResponse::from)
    }

    /// Validate an existing token.
    pub fn validate_token(&self, token: &str) -> ApiResponse {
        let catalog = |tenant: &str| self.catalog_for(tenant);
        self.identity
            .validate_token(token, &catalog)
            .unwrap_or_else(ApiResponse::from)
    }

    /// Grant an impersonation token.
    pub fn impersonate(&self, request: &ApiRequest, impersonator_token: Option<&str>) -> ApiResponse {
        self.identity
            .impersonate(request, impersonator_token)
            .unwrap_or_else(ApiResponse::from)
    }

    /// The plugin serving `(region, service_id)`, if the pair is routable.
    pub fn resource_for(
        &self,
        region: &str,
        service_id: &str,
    ) -> AppResult<&Arc<dyn stratus_core::traits::CloudPlugin>> {
        if !self.config.regions.iter().any(|r| r == region) {
            return Err(AppError::not_found(format!(
                "Region '{region}' does not exist"
            )));
        }
        self.registry.get(service_id).ok_or_else(|| {
            AppError::not_found(format!("Service '{service_id}' does not exist"))
        })
    }

    /// Dispatch a provider API request.
    ///
    /// The token is resolved to a session first (enrolling it if unknown,
    /// per the session store's contract) and the session's tenant becomes
    /// the request tenant. Expected failures render as their JSON error
    /// shapes rather than propagating.
    pub fn dispatch(
        &self,
        token: &str,
        region: &str,
        service_id: &str,
        mut request: ApiRequest,
    ) -> ApiResponse {
        let session = match self.identity.store().session_for_token(token, None) {
            Ok(session) => session,
            // No tenant is passed, so a mismatch cannot occur; keep the
            // session it carries regardless.
            Err(mismatch) => mismatch.session,
        };

        request.tenant_id = session.tenant_id.clone();
        request.region = region.to_string();

        tracing::debug!(
            tenant_id = %request.tenant_id,
            region,
            service_id,
            method = %request.method,
            path = ?request.path,
            "Dispatching request"
        );

        match self.resource_for(region, service_id) {
            Ok(plugin) => plugin
                .handle(&request)
                .unwrap_or_else(ApiResponse::from),
            Err(err) => err.into(),
        }
    }
}
