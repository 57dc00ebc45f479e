//! Integration tests for the session/identity layer.

use http::Method;
use serde_json::json;

use stratus::ApiRequest;

use crate::helpers::TestCloud;

#[test]
fn test_token_lookup_is_stable_across_calls() {
    let app = TestCloud::new();
    let store = app.cloud.router().identity().store().clone();

    let first = store.session_for_token("tok-abc", None).expect("session");
    let second = store.session_for_token("tok-abc", None).expect("session");
    assert_eq!(first.id, second.id);
    assert_eq!(first.tenant_id, second.tenant_id);
}

#[test]
fn test_auth_response_carries_catalog_and_token() {
    let app = TestCloud::new();
    let response = app.cloud.router().authenticate(
        &ApiRequest::new(Method::POST, ["tokens"]).with_body(json!({
            "auth": {"passwordCredentials": {"username": "alice", "password": "pw"}}
        })),
    );

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.body["access"]["user"]["name"], "alice");

    let catalog = response.body["access"]["serviceCatalog"]
        .as_array()
        .expect("catalog");
    let compute = catalog
        .iter()
        .find(|entry| entry["type"] == "compute")
        .expect("compute entry");
    assert_eq!(compute["name"], "cloudServers");
    assert_eq!(compute["endpoints"].as_array().expect("endpoints").len(), 3);
    assert!(compute["endpoints"][0]["publicURL"]
        .as_str()
        .expect("url")
        .starts_with("{base}/compute/v2/"));
}

#[test]
fn test_api_key_and_password_share_a_session() {
    let app = TestCloud::new();
    let password_token = app.login("bob");

    let response = app.cloud.router().authenticate(
        &ApiRequest::new(Method::POST, ["tokens"]).with_body(json!({
            "auth": {"apiKeyCredentials": {"username": "bob", "apiKey": "whatever"}}
        })),
    );
    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(
        response.body["access"]["token"]["id"]
            .as_str()
            .expect("token"),
        password_token
    );
}

#[test]
fn test_password_tenant_mismatch_uses_unauthorized_shape() {
    let app = TestCloud::new();
    let router = app.cloud.router();

    let ok = router.authenticate(
        &ApiRequest::new(Method::POST, ["tokens"]).with_body(json!({
            "auth": {
                "passwordCredentials": {"username": "carol", "password": "pw"},
                "tenantId": "777001",
            }
        })),
    );
    assert_eq!(ok.status.as_u16(), 200);

    let mismatch = router.authenticate(
        &ApiRequest::new(Method::POST, ["tokens"]).with_body(json!({
            "auth": {
                "passwordCredentials": {"username": "carol", "password": "pw"},
                "tenantId": "777002",
            }
        })),
    );
    assert_eq!(mismatch.status.as_u16(), 401);
    assert!(mismatch.body.get("unauthorized").is_some());
    assert!(mismatch.body.get("itemNotFound").is_none());
}

#[test]
fn test_token_tenant_mismatch_uses_item_not_found_shape() {
    let app = TestCloud::new();
    let router = app.cloud.router();
    let token = app.login("dave");

    let mismatch = router.authenticate(
        &ApiRequest::new(Method::POST, ["tokens"]).with_body(json!({
            "auth": {"token": {"id": token}, "tenantId": "000000-mismatch"}
        })),
    );
    assert_eq!(mismatch.status.as_u16(), 401);
    assert!(mismatch.body.get("itemNotFound").is_some());
    assert!(mismatch.body.get("unauthorized").is_none());
}

#[test]
fn test_validate_unknown_token_is_404() {
    let app = TestCloud::new();
    let response = app.cloud.router().validate_token("never-issued");
    assert_eq!(response.status.as_u16(), 404);
}

#[test]
fn test_impersonation_token_round_trip() {
    let app = TestCloud::new();
    let router = app.cloud.router();
    let admin_token = app.login("admin");

    let grant = router.impersonate(
        &ApiRequest::new(Method::POST, ["impersonation-tokens"]).with_body(json!({
            "impersonation": {
                "user": {"username": "victim"},
                "expire-in-seconds": 300,
            }
        })),
        Some(&admin_token),
    );
    assert_eq!(grant.status.as_u16(), 200);
    let impersonation_token = grant.body["access"]["token"]["id"]
        .as_str()
        .expect("token")
        .to_string();

    let validated = router.validate_token(&impersonation_token);
    assert_eq!(validated.status.as_u16(), 200);
    assert_eq!(validated.body["access"]["user"]["name"], "victim");
    assert_eq!(validated.body["access"]["impersonator"]["name"], "admin");
}

#[test]
fn test_impersonation_overwrites_expiry() {
    let app = TestCloud::new();
    let router = app.cloud.router();
    app.login("eve");

    let impersonate = |seconds: u64| {
        router.impersonate(
            &ApiRequest::new(Method::POST, ["impersonation-tokens"]).with_body(json!({
                "impersonation": {
                    "user": {"username": "eve"},
                    "expire-in-seconds": seconds,
                }
            })),
            None,
        )
    };

    let first = impersonate(60);
    let second = impersonate(7_200);
    let first_expiry = first.body["access"]["token"]["expires"]
        .as_str()
        .expect("expiry");
    let second_expiry = second.body["access"]["token"]["expires"]
        .as_str()
        .expect("expiry");
    assert!(second_expiry > first_expiry);
}
