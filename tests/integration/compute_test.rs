//! Integration tests for the compute lifecycle simulator.

use http::Method;
use serde_json::json;

use stratus::ApiRequest;

use crate::helpers::{TestCloud, created_id};

#[test]
fn test_create_then_get_round_trip() {
    let app = TestCloud::new();
    let token = app.login("alice");

    let response = app.create_server(&token, "web-1", None);
    assert_eq!(response.status.as_u16(), 202);
    assert!(response.body["server"]["adminPass"].is_string());

    let id = created_id(&response);
    let detail = app.get_server(&token, &id);
    assert_eq!(detail.status.as_u16(), 200);
    assert_eq!(detail.body["server"]["name"], "web-1");
    assert_eq!(detail.body["server"]["status"], "ACTIVE");
}

#[test]
fn test_building_server_activates_after_tick() {
    let app = TestCloud::new();
    let token = app.login("alice");

    let response = app.create_server(&token, "slow", Some(json!({"server_building": "5"})));
    let id = created_id(&response);

    let detail = app.get_server(&token, &id);
    assert_eq!(detail.body["server"]["status"], "BUILD");

    app.tick(5.0);
    let detail = app.get_server(&token, &id);
    assert_eq!(detail.body["server"]["status"], "ACTIVE");
}

#[test]
fn test_pagination_walks_in_creation_order() {
    let app = TestCloud::new();
    let token = app.login("alice");

    let ids: Vec<String> = (0..5)
        .map(|i| created_id(&app.create_server(&token, &format!("srv-{i}"), None)))
        .collect();

    let page = app.compute(
        &token,
        ApiRequest::new(Method::GET, ["servers"]).with_query("limit", "2"),
    );
    assert_eq!(page.status.as_u16(), 200);
    let servers = page.body["servers"].as_array().expect("servers");
    assert_eq!(servers.len(), 2);
    assert_eq!(servers[0]["id"], json!(ids[0]));
    assert_eq!(servers[1]["id"], json!(ids[1]));

    let next = page.body["servers_links"][0]["href"]
        .as_str()
        .expect("next link");
    assert!(next.contains(&format!("marker={}", ids[1])));

    let rest = app.compute(
        &token,
        ApiRequest::new(Method::GET, ["servers"]).with_query("marker", ids[1].clone()),
    );
    let servers = rest.body["servers"].as_array().expect("servers");
    assert_eq!(servers.len(), 3);
    assert_eq!(servers[0]["id"], json!(ids[2]));
    assert!(rest.body.get("servers_links").is_none());
}

#[test]
fn test_unknown_marker_is_400_regardless_of_other_params() {
    let app = TestCloud::new();
    let token = app.login("alice");
    app.create_server(&token, "web-1", None);

    let response = app.compute(
        &token,
        ApiRequest::new(Method::GET, ["servers"])
            .with_query("marker", "nonexistent-id")
            .with_query("limit", "1")
            .with_query("name", "web"),
    );
    assert_eq!(response.status.as_u16(), 400);
    assert_eq!(
        response.body["badRequest"]["message"],
        "marker [nonexistent-id] not found"
    );
}

#[test]
fn test_limit_validation() {
    let app = TestCloud::new();
    let token = app.login("alice");

    let response = app.compute(
        &token,
        ApiRequest::new(Method::GET, ["servers"]).with_query("limit", "-1"),
    );
    assert_eq!(response.status.as_u16(), 400);

    let response = app.compute(
        &token,
        ApiRequest::new(Method::GET, ["servers"]).with_query("limit", "two"),
    );
    assert_eq!(response.status.as_u16(), 400);
}

#[test]
fn test_confirm_resize_conflict_is_idempotent() {
    let app = TestCloud::new();
    let token = app.login("alice");
    let id = created_id(&app.create_server(&token, "web-1", None));

    let first = app.server_action(&token, &id, json!({"confirmResize": null}));
    let second = app.server_action(&token, &id, json!({"confirmResize": null}));
    assert_eq!(first.status.as_u16(), 409);
    assert_eq!(second.status.as_u16(), 409);
    assert_eq!(first.body, second.body);
    assert!(first.body["conflictingRequest"]["message"]
        .as_str()
        .expect("message")
        .contains("ACTIVE"));
}

#[test]
fn test_resize_confirm_flow_through_dispatch() {
    let app = TestCloud::new();
    let token = app.login("alice");
    let id = created_id(&app.create_server(&token, "web-1", None));

    let response = app.server_action(&token, &id, json!({"resize": {"flavorRef": "8"}}));
    assert_eq!(response.status.as_u16(), 202);
    assert_eq!(
        app.get_server(&token, &id).body["server"]["status"],
        "VERIFY_RESIZE"
    );

    let response = app.server_action(&token, &id, json!({"confirmResize": null}));
    assert_eq!(response.status.as_u16(), 204);
    let detail = app.get_server(&token, &id);
    assert_eq!(detail.body["server"]["status"], "ACTIVE");
    assert_eq!(detail.body["server"]["flavor"]["id"], "8");
}

#[test]
fn test_injected_creation_failure_scenario() {
    let app = TestCloud::new();
    let token = app.login("alice");
    app.register_behavior(
        "server-creation",
        Some("ORD"),
        json!({
            "name": "fail",
            "parameters": {"code": 500, "message": "boom"},
            "criteria": [{"server_name": "x"}],
        }),
    );

    let response = app.create_server(&token, "x", None);
    assert_eq!(response.status.as_u16(), 500);
    assert_eq!(response.body["computeFault"]["message"], "boom");

    let listing = app.compute(&token, ApiRequest::new(Method::GET, ["servers"]));
    assert_eq!(listing.body["servers"].as_array().expect("servers").len(), 0);

    let response = app.create_server(&token, "y", None);
    assert_eq!(response.status.as_u16(), 202);
}

#[test]
fn test_changes_since_reports_deletions() {
    let app = TestCloud::new();
    let token = app.login("alice");
    let keep = created_id(&app.create_server(&token, "keeper", None));
    let doomed = created_id(&app.create_server(&token, "doomed", None));

    app.tick(10.0);
    let response = app.compute(
        &token,
        ApiRequest::new(Method::DELETE, ["servers", doomed.as_str()]),
    );
    assert_eq!(response.status.as_u16(), 204);

    let changed = app.compute(
        &token,
        ApiRequest::new(Method::GET, ["servers", "detail"])
            .with_query("changes-since", "2024-01-01T00:00:05Z"),
    );
    let servers = changed.body["servers"].as_array().expect("servers");
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0]["id"], json!(doomed));
    assert_eq!(servers[0]["status"], "DELETED");

    // The plain listing hides the tombstone but keeps the survivor.
    let listing = app.compute(&token, ApiRequest::new(Method::GET, ["servers"]));
    let servers = listing.body["servers"].as_array().expect("servers");
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0]["id"], json!(keep));
}

#[test]
fn test_metadata_quota_is_forbidden() {
    let app = TestCloud::new();
    let token = app.login("alice");

    let metadata: serde_json::Map<String, serde_json::Value> = (0..41)
        .map(|i| (format!("key{i}"), json!("v")))
        .collect();
    let response = app.create_server(&token, "greedy", Some(json!(metadata)));
    assert_eq!(response.status.as_u16(), 403);
    assert!(response.body.get("forbidden").is_some());
}

#[test]
fn test_tenants_are_isolated() {
    let app = TestCloud::new();
    let alice = app.login("alice");
    let bob = app.login("bob");

    app.create_server(&alice, "alice-server", None);
    let listing = app.compute(&bob, ApiRequest::new(Method::GET, ["servers"]));
    assert_eq!(listing.body["servers"].as_array().expect("servers").len(), 0);
}
