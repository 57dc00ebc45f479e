//! Service catalog value types.
//!
//! Every registered plugin contributes one catalog entry per tenant; the
//! transport layer substitutes the URL prefix placeholder with the real base
//! URL of the running instance.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One endpoint of a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    /// Region this endpoint serves.
    pub region: String,
    /// Tenant the endpoint is scoped to.
    pub tenant_id: String,
    /// Public URL, with the configured prefix placeholder still embedded.
    pub public_url: String,
}

/// A `(service name, service type, endpoints)` tuple advertised to a tenant
/// for service discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Service name, e.g. `"cloudServersOpenStack"`.
    pub name: String,
    /// Service type, e.g. `"compute"`.
    pub service_type: String,
    /// Endpoints, one per advertised region.
    pub endpoints: Vec<Endpoint>,
}

impl CatalogEntry {
    /// Create a catalog entry.
    pub fn new(
        name: impl Into<String>,
        service_type: impl Into<String>,
        endpoints: Vec<Endpoint>,
    ) -> Self {
        Self {
            name: name.into(),
            service_type: service_type.into(),
            endpoints,
        }
    }

    /// Render this entry as a service-catalog JSON document.
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "type": self.service_type,
            "endpoints": self.endpoints.iter().map(|e| json!({
                "region": e.region,
                "tenantId": e.tenant_id,
                "publicURL": e.public_url,
            })).collect::<Vec<_>>(),
        })
    }
}
