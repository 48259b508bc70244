use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use tasklane_client::{
    ApiClient, ClientError, Credentials, GuardSettings, ReqwestTransport, SessionGuard,
    StatusCode,
};
use tasklane_session::{Persistence, Session, SessionStore};
use tasklane_storage::{Database, MemoryStore};

fn client_for(base_url: &str) -> ApiClient {
    let store = SessionStore::new(
        Arc::new(Database::open_in_memory().unwrap()),
        Arc::new(MemoryStore::new()),
        Persistence::Durable,
    );
    let transport =
        ReqwestTransport::new(Url::parse(base_url).unwrap(), Duration::from_secs(5)).unwrap();
    let guard = SessionGuard::new(store, Arc::new(transport), GuardSettings::default());
    ApiClient::new(guard)
}

#[tokio::test]
async fn refresh_round_trip_over_http() {
    let mut server = Server::new_async().await;
    let client = client_for(&server.url());
    client
        .session_store()
        .save(
            &Session::new("T1").with_refresh_token("R1").with_tenant("acme"),
            Persistence::Durable,
        )
        .unwrap();

    let expired = server
        .mock("GET", "/tasks")
        .match_header("authorization", "Bearer T1")
        .match_header("x-tenant-id", "acme")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .match_header("x-tenant-id", "acme")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(json!({"refreshToken": "R1"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"accessToken":"T2","refreshToken":"R2"}"#)
        .expect(1)
        .create_async()
        .await;
    let replay = server
        .mock("GET", "/tasks")
        .match_header("authorization", "Bearer T2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id":1,"title":"Write report"}]"#)
        .expect(1)
        .create_async()
        .await;

    let tasks: Vec<Value> = client.get_json("/tasks").await.unwrap();
    assert_eq!(tasks[0]["title"], "Write report");

    expired.assert_async().await;
    refresh.assert_async().await;
    replay.assert_async().await;

    let session = client.current_session().unwrap();
    assert_eq!(session.access_token, "T2");
    assert_eq!(session.refresh_token.as_deref(), Some("R2"));
}

#[tokio::test]
async fn query_and_body_are_sent() {
    let mut server = Server::new_async().await;
    let client = client_for(&format!("{}/api", server.url()));
    client
        .session_store()
        .save(&Session::new("T1"), Persistence::Durable)
        .unwrap();

    let mock = server
        .mock("POST", "/api/tasks")
        .match_query(Matcher::UrlEncoded("project".into(), "p-1".into()))
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"title": "Plan sprint"})))
        .with_status(201)
        .with_body(r#"{"id":9}"#)
        .create_async()
        .await;

    let response = client
        .send(
            tasklane_client::ApiRequest::post("/tasks")
                .query("project", "p-1")
                .json(json!({"title": "Plan sprint"})),
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::CREATED);
    mock.assert_async().await;
}

#[tokio::test]
async fn login_stores_session() {
    let mut server = Server::new_async().await;
    let client = client_for(&server.url());

    let mock = server
        .mock("POST", "/auth/login")
        .match_body(Matcher::Json(
            json!({"email": "ada@example.com", "password": "secret"}),
        ))
        .with_status(200)
        .with_body(r#"{"token":"T1","refresh":"R1","tenantId":"acme"}"#)
        .create_async()
        .await;

    let credentials = Credentials::new("ada@example.com", "secret").session_only();
    let session = client.login(&credentials).await.unwrap();

    mock.assert_async().await;
    assert_eq!(session.access_token, "T1");
    assert_eq!(session.refresh_token.as_deref(), Some("R1"));
    assert_eq!(session.tenant_id.as_deref(), Some("acme"));
    assert_eq!(
        client.session_store().persistence(),
        Persistence::SessionScoped
    );
}

#[tokio::test]
async fn rejected_login_keeps_status() {
    let mut server = Server::new_async().await;
    let client = client_for(&server.url());

    server
        .mock("POST", "/auth/login")
        .with_status(401)
        .with_body(r#"{"message":"invalid credentials"}"#)
        .create_async()
        .await;

    let err = client
        .login(&Credentials::new("ada@example.com", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert!(client.current_session().is_none());
}

#[tokio::test]
async fn logout_clears_session_and_notifies() {
    let server = Server::new_async().await;
    let client = client_for(&server.url());
    client
        .session_store()
        .save(&Session::new("T1").with_refresh_token("R1"), Persistence::Durable)
        .unwrap();
    let mut events = client.subscribe_logout();

    client.logout();

    assert!(client.current_session().is_none());
    let event = events.recv().await.unwrap();
    assert_eq!(event.reason.as_str(), "user_logout");
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let client = client_for("http://127.0.0.1:1");

    let err = client.get("/tasks").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}
