//! Plugin system traits.

use crate::result::AppResult;
use crate::types::catalog::CatalogEntry;
use crate::types::request::{ApiRequest, ApiResponse};

/// Trait implemented by provider plugins.
///
/// A plugin emulates one provider API: it advertises itself in the per-tenant
/// service catalog and handles the requests the router dispatches to its
/// `(region, service id)` endpoints. Plugins are registered explicitly at
/// startup; there is no runtime discovery. Handlers are synchronous: the
/// core processes one request to completion before the next.
pub trait CloudPlugin: Send + Sync + 'static {
    /// Stable unique service identifier (a UUID string).
    fn service_id(&self) -> &str;

    /// Service type advertised in the catalog, e.g. `"compute"`.
    fn service_type(&self) -> &str;

    /// Service name advertised in the catalog.
    fn service_name(&self) -> &str;

    /// Catalog entries this plugin contributes for a tenant.
    fn catalog_entries(&self, tenant_id: &str, regions: &[String]) -> Vec<CatalogEntry>;

    /// Handle a request dispatched to one of this plugin's endpoints.
    ///
    /// Expected failures (validation, not-found, conflicts) are returned as
    /// `Err(AppError)` and rendered by the router; injected behaviors return
    /// their configured response directly in the `Ok` arm.
    fn handle(&self, request: &ApiRequest) -> AppResult<ApiResponse>;
}
