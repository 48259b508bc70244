use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::path::PathBuf;

use tasklane_core::{AuthFailure, ClientError, Config, LogoutReason, Persistence, Workspace};

fn workspace_for(server: &Server) -> Workspace {
    let mut config = Config::new(PathBuf::from("/nonexistent"));
    config.api_base_url = server.url();
    Workspace::open_in_memory(config).unwrap()
}

#[tokio::test]
async fn login_then_call_then_expire() {
    let mut server = Server::new_async().await;
    let workspace = workspace_for(&server);
    let mut logout = workspace.client().subscribe_logout();

    workspace.select_tenant("acme").unwrap();

    server
        .mock("POST", "/auth/login")
        .match_header("x-tenant-id", "acme")
        .with_status(200)
        .with_body(r#"{"accessToken":"T1","refreshToken":"R1"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/projects")
        .match_header("authorization", "Bearer T1")
        .match_header("x-tenant-id", "acme")
        .with_status(200)
        .with_body(r#"[{"id":"p-1"}]"#)
        .create_async()
        .await;

    let session = workspace
        .login("ada@example.com", "secret", true)
        .await
        .unwrap();
    assert_eq!(session.tenant_id.as_deref(), Some("acme"));
    assert!(workspace.is_authenticated());
    assert_eq!(
        workspace.client().session_store().persistence(),
        Persistence::Durable
    );

    let projects: Vec<Value> = workspace.client().get_json("/projects").await.unwrap();
    assert_eq!(projects[0]["id"], "p-1");

    // Tasks reject T1, and the refresh token is revoked
    server
        .mock("GET", "/tasks")
        .match_header("authorization", "Bearer T1")
        .with_status(401)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .match_body(Matcher::Json(json!({"refreshToken": "R1"})))
        .with_status(403)
        .with_body(r#"{"message":"refresh token revoked"}"#)
        .expect(1)
        .create_async()
        .await;

    let err = workspace.client().get("/tasks").await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(AuthFailure::Rejected(403))));
    refresh.assert_async().await;

    assert!(!workspace.is_authenticated());
    assert_eq!(
        logout.recv().await.unwrap().reason,
        LogoutReason::RefreshRejected
    );
}

#[tokio::test]
async fn session_only_login_is_not_durable() {
    let mut server = Server::new_async().await;
    let workspace = workspace_for(&server);

    server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_body(r#"{"token":"T1"}"#)
        .create_async()
        .await;

    workspace
        .login("ada@example.com", "secret", false)
        .await
        .unwrap();

    assert!(workspace.is_authenticated());
    assert!(workspace.database().is_empty().unwrap());
    assert!(!workspace.session_scoped_store().is_empty());

    workspace.logout();
    assert!(!workspace.is_authenticated());
    assert!(workspace.session_scoped_store().is_empty());
}
