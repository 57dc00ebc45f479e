//! Integration tests for registering additional plugins with the router.

use std::sync::Arc;

use http::Method;
use serde_json::json;

use stratus::{
    ApiRequest, ApiResponse, AppConfig, AppResult, CatalogEntry, CloudPlugin, Endpoint,
    StratusCloud,
};

use crate::helpers::TestCloud;

/// A canned-JSON DNS mock, the shape most provider plugins take.
#[derive(Debug)]
struct DnsPlugin;

impl CloudPlugin for DnsPlugin {
    fn service_id(&self) -> &str {
        "8e40330e-23ac-4c96-b39a-53b493dcbe84"
    }

    fn service_type(&self) -> &str {
        "dns"
    }

    fn service_name(&self) -> &str {
        "cloudDNS"
    }

    fn catalog_entries(&self, tenant_id: &str, regions: &[String]) -> Vec<CatalogEntry> {
        vec![CatalogEntry::new(
            self.service_name(),
            self.service_type(),
            regions
                .iter()
                .map(|region| Endpoint {
                    region: region.clone(),
                    tenant_id: tenant_id.to_string(),
                    public_url: format!("{{base}}/dns/v1/{tenant_id}"),
                })
                .collect(),
        )]
    }

    fn handle(&self, request: &ApiRequest) -> AppResult<ApiResponse> {
        Ok(ApiResponse::ok(json!({
            "domains": [],
            "tenant": request.tenant_id,
        })))
    }
}

fn cloud_with_dns() -> StratusCloud {
    StratusCloud::with_plugins(AppConfig::default(), vec![Arc::new(DnsPlugin)])
        .expect("deployment with extra plugin")
}

#[test]
fn test_extra_plugin_appears_in_catalog() {
    let cloud = cloud_with_dns();
    let catalog = cloud.router().catalog_for("tenant-1");
    assert_eq!(catalog.len(), 2);
    let dns = catalog
        .iter()
        .find(|entry| entry["type"] == "dns")
        .expect("dns entry");
    assert_eq!(dns["name"], "cloudDNS");
}

#[test]
fn test_extra_plugin_receives_dispatched_requests() {
    let cloud = cloud_with_dns();
    let session = cloud
        .router()
        .identity()
        .store()
        .session_for_token("tok-1", None)
        .expect("session");

    let response = cloud.router().dispatch(
        "tok-1",
        "ORD",
        "8e40330e-23ac-4c96-b39a-53b493dcbe84",
        ApiRequest::new(Method::GET, ["domains"]),
    );
    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.body["tenant"], json!(session.tenant_id));
}

#[test]
fn test_per_plugin_session_data_round_trips() {
    let app = TestCloud::new();
    let store = app.cloud.router().identity().store().clone();
    let session = store.session_for_token("tok-1", None).expect("session");

    assert!(store.plugin_data(session.id, "dns").is_none());
    store.set_plugin_data(session.id, "dns", json!({"zones": ["example.org"]}));
    assert_eq!(
        store.plugin_data(session.id, "dns"),
        Some(json!({"zones": ["example.org"]}))
    );

    // A fresh lookup by the same token sees the stored data.
    let again = store.session_for_token("tok-1", None).expect("session");
    assert_eq!(
        again.plugin_data("dns"),
        Some(&json!({"zones": ["example.org"]}))
    );
}
