use serde_json::json;
use std::sync::Arc;
use taskdeck_auth::{AuthError, MemoryTokenStore, SessionManager, SessionStatus, TokenStore};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn setup(server: &MockServer, store: Arc<MemoryTokenStore>) -> SessionManager {
    SessionManager::new(&server.uri(), reqwest::Client::new(), store)
}

async fn mount_user(server: &MockServer, token: &str, id: i64, email: &str) {
    Mock::given(method("GET"))
        .and(path("/auth/user"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "email": email
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_authenticates_and_persists_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({
            "email": "test@example.com",
            "password": "password123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "issued_token",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_user(&server, "issued_token", 7, "test@example.com").await;

    let store = Arc::new(MemoryTokenStore::new());
    let session = setup(&server, store.clone());
    session.initialize().await;

    let user = session
        .login("test@example.com", "password123")
        .await
        .unwrap();

    assert_eq!(user.id, 7);
    assert!(session.is_authenticated());
    assert!(!session.is_loading());
    assert_eq!(session.user().unwrap().email, "test@example.com");
    assert_eq!(session.token(), Some("issued_token".to_string()));
    assert_eq!(store.load().await.unwrap(), Some("issued_token".to_string()));
}

#[tokio::test]
async fn test_login_rejected_propagates_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Incorrect email or password" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let session = setup(&server, store.clone());

    let result = session.login("test@example.com", "wrong-password").await;

    match result {
        Err(AuthError::Rejected(msg)) => assert_eq!(msg, "Incorrect email or password"),
        other => panic!("expected Rejected, got {:?}", other),
    }
    assert_eq!(session.status(), SessionStatus::Unauthenticated);
    assert!(session.user().is_none());
    assert_eq!(store.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_login_fails_when_profile_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "issued_token",
            "token_type": "bearer"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/user"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let session = setup(&server, store.clone());
    session.initialize().await;

    let result = session.login("test@example.com", "password123").await;

    assert!(matches!(result, Err(AuthError::Fetch(_))));
    assert!(!session.is_authenticated());
    assert_eq!(store.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_register_signs_in() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "access_token": "fresh_token",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_user(&server, "fresh_token", 12, "new@example.com").await;

    let store = Arc::new(MemoryTokenStore::new());
    let session = setup(&server, store.clone());
    session.initialize().await;

    let user = session.register("new@example.com", "password123").await.unwrap();

    assert_eq!(user.email, "new@example.com");
    assert!(session.is_authenticated());
    assert_eq!(store.load().await.unwrap(), Some("fresh_token".to_string()));
}

#[tokio::test]
async fn test_register_conflict_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": "Email already registered"
        })))
        .mount(&server)
        .await;

    let session = setup(&server, Arc::new(MemoryTokenStore::new()));
    let err = session
        .register("taken@example.com", "password123")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Authentication rejected: Email already registered");
    assert_eq!(session.status(), SessionStatus::Unauthenticated);
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let server = MockServer::start().await;
    mount_user(&server, "stored_token", 3, "me@example.com").await;

    let store = Arc::new(MemoryTokenStore::with_token("stored_token"));
    let session = setup(&server, store.clone());
    session.initialize().await;
    assert!(session.is_authenticated());

    session.logout().await;

    assert!(!session.is_authenticated());
    assert!(session.user().is_none());
    assert!(session.token().is_none());
    assert_eq!(store.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_initialize_restores_persisted_session() {
    let server = MockServer::start().await;
    mount_user(&server, "stored_token", 3, "me@example.com").await;

    let store = Arc::new(MemoryTokenStore::with_token("stored_token"));
    let session = setup(&server, store);
    let mut changes = session.subscribe();

    let restored = session.initialize().await;

    assert!(restored.is_authenticated());
    assert!(!restored.is_loading());
    assert_eq!(restored.user.unwrap().id, 3);

    let first = changes.recv().await.unwrap();
    assert_eq!(first.status, SessionStatus::Loading);
    assert_eq!(first.token.as_deref(), Some("stored_token"));
    assert!(first.user.is_none());

    let second = changes.recv().await.unwrap();
    assert_eq!(second.status, SessionStatus::Authenticated);
}

#[tokio::test]
async fn test_initialize_with_rejected_token_clears_it() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Could not validate credentials"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("expired_token"));
    let session = setup(&server, store.clone());

    let result = session.initialize().await;

    assert!(!result.is_authenticated());
    assert!(!result.is_loading());
    assert!(result.user.is_none());
    assert!(result.token.is_none());
    assert_eq!(store.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_initialize_without_token_skips_network() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = setup(&server, Arc::new(MemoryTokenStore::new()));
    let result = session.initialize().await;

    assert_eq!(result.status, SessionStatus::Unauthenticated);
    assert!(!result.is_loading());

    // A second call does not re-enter loading
    let again = session.initialize().await;
    assert_eq!(again.status, SessionStatus::Unauthenticated);
}

#[tokio::test]
async fn test_verify_session_network_failure_is_silent() {
    // Nothing listens here, so every request fails at the transport level
    let session = SessionManager::new(
        "http://127.0.0.1:9",
        reqwest::Client::new(),
        Arc::new(MemoryTokenStore::with_token("stored_token")),
    );

    let result = session.initialize().await;

    assert_eq!(result.status, SessionStatus::Unauthenticated);
    assert!(!result.is_loading());
}

#[tokio::test]
async fn test_invalidate_ignores_stale_token() {
    let server = MockServer::start().await;
    mount_user(&server, "current_token", 3, "me@example.com").await;

    let store = Arc::new(MemoryTokenStore::with_token("current_token"));
    let session = setup(&server, store.clone());
    session.initialize().await;

    assert!(!session.invalidate("previous_token").await);
    assert!(session.is_authenticated());

    assert!(session.invalidate("current_token").await);
    assert!(!session.is_authenticated());
    assert!(!session.invalidate("current_token").await);
    assert_eq!(store.load().await.unwrap(), None);
}
