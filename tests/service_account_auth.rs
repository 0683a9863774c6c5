//! Integration tests for service account authentication
//!
//! Keys carry a `token_uri` pointing at the mock server, so the JWT grant
//! and the Compute Engine call both land on wiremock.

use gce_actions::{Action, ActionError, DispatchOptions, Dispatcher, Params};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{bearer_token, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRIVATE_KEY: &str = include_str!("fixtures/service-account-key.pem");

fn dispatcher(server: &MockServer, default_project: Option<&str>) -> Dispatcher {
    Dispatcher::new(DispatchOptions {
        endpoint: format!("{}/compute/v1", server.uri()),
        poll_interval: Duration::from_millis(10),
        default_project: default_project.map(str::to_string),
        default_zone: Some("us-east1-b".to_string()),
    })
}

fn service_account_key(server: &MockServer, project: Option<&str>) -> Value {
    let mut key = json!({
        "type": "service_account",
        "client_email": "dispatcher@key-project.iam.gserviceaccount.com",
        "private_key": PRIVATE_KEY,
        "token_uri": format!("{}/token", server.uri()),
    });
    if let Some(project) = project {
        key["project_id"] = json!(project);
    }
    key
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "minted-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_stop(server: &MockServer, project: &str) {
    Mock::given(method("POST"))
        .and(path(format!(
            "/compute/v1/projects/{}/zones/us-east1-b/instances/vm/stop",
            project
        )))
        .and(bearer_token("minted-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operation-stop",
            "status": "PENDING"
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_key_file_mints_token_and_supplies_project() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    mount_stop(&server, "key-project").await;

    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("key.json");
    std::fs::write(
        &key_path,
        service_account_key(&server, Some("key-project")).to_string(),
    )
    .unwrap();

    let action = Action::new(
        "STOP_INSTANCE",
        Params::new()
            .with("KEYFILE", key_path.to_string_lossy().into_owned())
            .with("NAME", "vm"),
    );

    // The key's own project outranks the configured default
    let result = dispatcher(&server, Some("cli-project"))
        .dispatch(&action)
        .await
        .unwrap();
    assert_eq!(result["name"], "operation-stop");
}

#[tokio::test]
async fn test_inline_credentials_object_with_explicit_project() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    mount_stop(&server, "param-project").await;

    let action = Action::new(
        "STOP_INSTANCE",
        Params::new()
            .with("PROJECT", "param-project")
            .with("CREDENTIALS", service_account_key(&server, Some("key-project")))
            .with("NAME", "vm"),
    );

    dispatcher(&server, Some("cli-project"))
        .dispatch(&action)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_inline_credentials_string_without_project_uses_default() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    mount_stop(&server, "cli-project").await;

    let action = Action::new(
        "STOP_INSTANCE",
        Params::new()
            .with("CREDENTIALS", service_account_key(&server, None).to_string())
            .with("NAME", "vm"),
    );

    dispatcher(&server, Some("cli-project"))
        .dispatch(&action)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_key_without_project_and_no_default_is_missing_project() {
    let server = MockServer::start().await;

    let action = Action::new(
        "STOP_INSTANCE",
        Params::new()
            .with("CREDENTIALS", service_account_key(&server, None))
            .with("NAME", "vm"),
    );

    let err = dispatcher(&server, None).dispatch(&action).await.unwrap_err();
    assert!(matches!(err, ActionError::MissingParam("PROJECT")));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_token_grant_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(
            "/compute/v1/projects/key-project/zones/us-east1-b/instances/vm/stop",
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let action = Action::new(
        "STOP_INSTANCE",
        Params::new()
            .with("CREDENTIALS", service_account_key(&server, Some("key-project")))
            .with("NAME", "vm"),
    );

    let err = dispatcher(&server, None).dispatch(&action).await.unwrap_err();
    assert!(matches!(err, ActionError::Auth(_)));
}

#[test]
fn test_malformed_key_fails_before_any_request() {
    let action = Action::new(
        "STOP_INSTANCE",
        Params::new()
            .with("PROJECT", "param-project")
            .with("CREDENTIALS", json!({"client_email": "x@y"}))
            .with("ZONE", "us-east1-b")
            .with("NAME", "vm"),
    );

    let dispatcher = Dispatcher::new(DispatchOptions {
        endpoint: "http://127.0.0.1:9/compute/v1".to_string(),
        ..DispatchOptions::default()
    });
    let err = tokio_test::block_on(dispatcher.dispatch(&action)).unwrap_err();
    assert!(matches!(err, ActionError::Auth(_)));
}
