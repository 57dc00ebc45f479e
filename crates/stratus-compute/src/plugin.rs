//! The compute simulator's plugin face: routing and catalog entries.

use std::sync::Arc;

use uuid::Uuid;

use stratus_core::traits::CloudPlugin;
use stratus_core::types::{ApiRequest, ApiResponse, CatalogEntry, Endpoint, PageParams};
use stratus_core::{AppError, AppResult};

use crate::service::ComputeService;

/// Registers the compute simulator with the router.
#[derive(Debug)]
pub struct ComputePlugin {
    service: Arc<ComputeService>,
    service_id: String,
}

impl ComputePlugin {
    /// Wrap a compute service as a plugin.
    pub fn new(service: Arc<ComputeService>) -> Self {
        Self {
            service,
            service_id: Uuid::new_v4().to_string(),
        }
    }

    /// The wrapped service, for control-plane access.
    pub fn service(&self) -> &Arc<ComputeService> {
        &self.service
    }
}

impl CloudPlugin for ComputePlugin {
    fn service_id(&self) -> &str {
        &self.service_id
    }

    fn service_type(&self) -> &str {
        "compute"
    }

    fn service_name(&self) -> &str {
        "cloudServers"
    }

    fn catalog_entries(&self, tenant_id: &str, regions: &[String]) -> Vec<CatalogEntry> {
        let endpoints = regions
            .iter()
            .map(|region| Endpoint {
                region: region.clone(),
                tenant_id: tenant_id.to_string(),
                public_url: self.service.endpoint_prefix(tenant_id),
            })
            .collect();
        vec![CatalogEntry::new(
            self.service_name(),
            self.service_type(),
            endpoints,
        )]
    }

    fn handle(&self, request: &ApiRequest) -> AppResult<ApiResponse> {
        let tenant = request.tenant_id.as_str();
        let region = request.region.as_str();
        let segments: Vec<&str> = request.path.iter().map(String::as_str).collect();

        match (request.method.as_str(), segments.as_slice()) {
            ("POST", ["servers"]) => {
                self.service
                    .create_server(tenant, region, request.require_body()?)
            }
            ("GET", ["servers"]) => {
                let params = PageParams::from_query(&request.query)?;
                self.service.list_servers(tenant, region, &params, false)
            }
            ("GET", ["servers", "detail"]) => {
                let params = PageParams::from_query(&request.query)?;
                self.service.list_servers(tenant, region, &params, true)
            }
            ("GET", ["servers", id]) => self.service.get_server(tenant, region, id),
            ("PUT", ["servers", id]) => {
                self.service
                    .update_server(tenant, region, id, request.require_body()?)
            }
            ("DELETE", ["servers", id]) => self.service.delete_server(tenant, region, id),
            ("POST", ["servers", id, "action"]) => {
                self.service
                    .server_action(tenant, region, id, request.require_body()?)
            }
            _ => Err(AppError::not_found("Resource could not be found.")),
        }
    }
}
