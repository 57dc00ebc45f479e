//! Integration tests for the behavior-injection engine.

use http::Method;
use serde_json::json;

use stratus::ApiRequest;

use crate::helpers::TestCloud;

fn login_attempt(app: &TestCloud, username: &str) -> stratus::ApiResponse {
    app.cloud.router().authenticate(
        &ApiRequest::new(Method::POST, ["tokens"]).with_body(json!({
            "auth": {"passwordCredentials": {"username": username, "password": "pw"}}
        })),
    )
}

#[test]
fn test_registration_order_decides_overlapping_matches() {
    let app = TestCloud::new();
    let first = app.register_behavior(
        "authentication",
        None,
        json!({
            "name": "fail",
            "parameters": {"code": 401, "message": "first wins"},
            "criteria": [{"username": "alice"}],
        }),
    );
    let second = app.register_behavior(
        "authentication",
        None,
        json!({
            "name": "fail",
            "parameters": {"code": 403, "message": "second wins"},
            "criteria": [{"username": "ali.*"}],
        }),
    );

    let response = login_attempt(&app, "alice");
    assert_eq!(response.status.as_u16(), 401);
    assert_eq!(response.body["unauthorized"]["message"], "first wins");

    // Unregister the older entry: lookups fall through to the next-oldest.
    app.cloud
        .control()
        .unregister_behavior("authentication", None, &first)
        .expect("unregister");
    let response = login_attempt(&app, "alice");
    assert_eq!(response.status.as_u16(), 403);
    assert_eq!(response.body["forbidden"]["message"], "second wins");

    // With both gone, the default behavior authenticates normally.
    app.cloud
        .control()
        .unregister_behavior("authentication", None, &second)
        .expect("unregister");
    let response = login_attempt(&app, "alice");
    assert_eq!(response.status.as_u16(), 200);
}

#[test]
fn test_non_matching_requests_never_see_injected_behavior() {
    let app = TestCloud::new();
    app.register_behavior(
        "authentication",
        None,
        json!({
            "name": "fail",
            "parameters": {"code": 500, "message": "boom"},
            "criteria": [{"username": "doomed"}],
        }),
    );

    let response = login_attempt(&app, "lucky");
    assert_eq!(response.status.as_u16(), 200);
}

#[test]
fn test_unknown_behavior_name_is_rejected() {
    let app = TestCloud::new();
    let err = app
        .cloud
        .control()
        .register_behavior(
            "authentication",
            None,
            &json!({"name": "explode", "criteria": []}),
        )
        .unwrap_err();
    assert!(err.message.contains("no behavior named 'explode'"));
}

#[test]
fn test_unknown_criterion_name_is_rejected() {
    let app = TestCloud::new();
    let err = app
        .cloud
        .control()
        .register_behavior(
            "authentication",
            None,
            &json!({"name": "fail", "criteria": [{"shoe_size": "11"}]}),
        )
        .unwrap_err();
    assert!(err.message.contains("no criterion named 'shoe_size'"));
}

#[test]
fn test_unregister_unknown_id_is_404() {
    let app = TestCloud::new();
    let err = app
        .cloud
        .control()
        .unregister_behavior(
            "authentication",
            None,
            "11111111-2222-3333-4444-555555555555",
        )
        .unwrap_err();
    assert_eq!(err.kind, stratus::ErrorKind::NotFound);
}

#[test]
fn test_unknown_event_is_404() {
    let app = TestCloud::new();
    let err = app
        .cloud
        .control()
        .register_behavior("teleportation", None, &json!({"name": "fail"}))
        .unwrap_err();
    assert_eq!(err.kind, stratus::ErrorKind::NotFound);
}

#[test]
fn test_server_creation_registrations_require_a_region() {
    let app = TestCloud::new();
    let err = app
        .cloud
        .control()
        .register_behavior("server-creation", None, &json!({"name": "fail"}))
        .unwrap_err();
    assert_eq!(err.kind, stratus::ErrorKind::Validation);
}
