//! End-to-end session behaviour against an in-process HTTP backend.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use service::auth::repo::HttpAuthRepository;
use service::auth::{AuthError, AuthEventKind, SessionManager};
use service::errors::ServiceError;
use service::http::{ApiClient, RetryPolicy};
use service::provider::{DataProvider, HttpDataProvider};
use service::storage::{JsonFileSessionStore, SessionStore, TOKEN_KEY, USER_KEY};
use service::streak::StreakService;

const TOKEN: &str = "tok-ada-1";

#[derive(Default)]
struct Backend {
    revoked: AtomicBool,
    seen_auth: Mutex<Vec<Option<String>>>,
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] == "correct horse" {
        Json(json!({
            "token": TOKEN,
            "user": { "id": 42, "username": "ada", "email": body["email"], "streak_goal": 3 }
        }))
        .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response()
    }
}

async fn signup(Json(_): Json<Value>) -> Response {
    (StatusCode::CONFLICT, Json(json!({ "error": "Email already registered" }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_string)
}

async fn stats(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    let auth = bearer(&headers);
    backend.seen_auth.lock().unwrap().push(auth.clone());
    if backend.revoked.load(Ordering::SeqCst) || auth != Some(format!("Bearer {TOKEN}")) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "token expired" }))).into_response();
    }
    Json(json!({
        "current_streak": 9,
        "longest_streak": 15,
        "last_active": chrono::Utc::now(),
        "streak_percentage": 30.0,
        "problems_solved_today": 1,
        "weekly_activity": [false, false, true, true, true, true, true]
    }))
    .into_response()
}

async fn chat(Path(user_id): Path<String>) -> Response {
    if user_id.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!([])).into_response()
}

async fn spawn_backend() -> (String, Arc<Backend>) {
    let backend = Arc::new(Backend::default());
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/api/streaks/stats", get(stats))
        .route("/api/chat/:user_id", get(chat))
        .with_state(backend.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), backend)
}

fn scratch_file() -> PathBuf {
    std::env::temp_dir().join(format!("brainjar_it_{}", uuid::Uuid::new_v4())).join("session.json")
}

struct Harness {
    manager: Arc<SessionManager<HttpAuthRepository>>,
    store: Arc<JsonFileSessionStore>,
    provider: Arc<dyn DataProvider>,
}

async fn harness(base_url: &str) -> Harness {
    let base = ApiClient::new(base_url, Duration::from_secs(5), RetryPolicy::disabled()).unwrap();
    let store = JsonFileSessionStore::open(scratch_file()).await.unwrap();
    let manager = Arc::new(SessionManager::new(Arc::new(HttpAuthRepository::new(base.clone())), store.clone()));
    let provider: Arc<dyn DataProvider> = Arc::new(HttpDataProvider::new(base.with_credentials(manager.clone())));
    manager.restore().await;
    Harness { manager, store, provider }
}

#[tokio::test]
async fn login_persists_session_and_sends_bearer_token() {
    let (url, backend) = spawn_backend().await;
    let h = harness(&url).await;

    let user = h.manager.login("ada@example.com", "correct horse").await.unwrap();
    assert_eq!(user.id, "42");
    assert_eq!(user.extra.get("streak_goal"), Some(&json!(3)));
    assert_eq!(h.store.get(TOKEN_KEY).await.unwrap().as_deref(), Some(TOKEN));
    assert!(h.store.get(USER_KEY).await.unwrap().is_some());

    let overview = StreakService::new(h.provider.clone()).overview_today().await.unwrap();
    assert_eq!(overview.stats.current_streak, 9);
    assert_eq!(overview.calendar.active_days(), 9);
    assert_eq!(backend.seen_auth.lock().unwrap().as_slice(), &[Some(format!("Bearer {TOKEN}"))]);
}

#[tokio::test]
async fn persisted_session_survives_restart() {
    let (url, _backend) = spawn_backend().await;
    let h = harness(&url).await;
    h.manager.login("ada@example.com", "correct horse").await.unwrap();

    let base = ApiClient::new(&url, Duration::from_secs(5), RetryPolicy::disabled()).unwrap();
    let reopened = JsonFileSessionStore::open(h.store.path().to_path_buf()).await.unwrap();
    let restarted = SessionManager::new(Arc::new(HttpAuthRepository::new(base)), reopened);
    restarted.restore().await;
    assert!(restarted.is_authenticated());
    assert_eq!(restarted.current_user().map(|u| u.username), Some("ada".to_string()));
}

#[tokio::test]
async fn rejected_login_surfaces_plain_text_message() {
    let (url, _backend) = spawn_backend().await;
    let h = harness(&url).await;

    let err = h.manager.login("ada@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected { status: 401, .. }));
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(!h.manager.is_authenticated());
    assert_eq!(h.store.get(TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn rejected_signup_surfaces_json_error_field() {
    let (url, _backend) = spawn_backend().await;
    let h = harness(&url).await;

    let err = h.manager.register("ada", "ada@example.com", "pw").await.unwrap_err();
    assert_eq!(err.to_string(), "Email already registered");
    assert!(!h.manager.is_authenticated());
}

#[tokio::test]
async fn unauthorized_api_call_logs_the_user_out() {
    let (url, backend) = spawn_backend().await;
    let h = harness(&url).await;
    h.manager.login("ada@example.com", "correct horse").await.unwrap();

    let logouts: Arc<Mutex<Vec<Option<models::User>>>> = Arc::default();
    let sink = logouts.clone();
    let _sub = h.manager.on_auth_event(AuthEventKind::Logout, move |e| sink.lock().unwrap().push(e.user.clone()));

    backend.revoked.store(true, Ordering::SeqCst);
    let err = h.provider.streak_stats().await.unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized));
    assert!(!h.manager.is_authenticated());
    assert_eq!(h.store.get(TOKEN_KEY).await.unwrap(), None);
    assert_eq!(h.store.get(USER_KEY).await.unwrap(), None);

    let logouts = logouts.lock().unwrap();
    assert_eq!(logouts.len(), 1);
    assert_eq!(logouts[0].as_ref().map(|u| u.id.as_str()), Some("42"));
}

#[tokio::test]
async fn repeated_unauthorized_calls_log_out_once() {
    let (url, backend) = spawn_backend().await;
    let h = harness(&url).await;
    h.manager.login("ada@example.com", "correct horse").await.unwrap();

    let logouts: Arc<Mutex<Vec<Option<models::User>>>> = Arc::default();
    let sink = logouts.clone();
    let _sub = h.manager.on_auth_event(AuthEventKind::Logout, move |e| sink.lock().unwrap().push(e.user.clone()));

    backend.revoked.store(true, Ordering::SeqCst);
    for _ in 0..3 {
        let err = h.provider.streak_stats().await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
    }

    let seen: Vec<bool> = logouts.lock().unwrap().iter().map(Option::is_some).collect();
    assert_eq!(seen, vec![true]);
    // only the first call carried a token
    let sent = backend.seen_auth.lock().unwrap().clone();
    assert_eq!(sent, vec![Some(format!("Bearer {TOKEN}")), None, None]);
}

#[tokio::test]
async fn unreachable_backend_leaves_user_logged_out() {
    // bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let h = harness(&url).await;
    let err = h.manager.login("ada@example.com", "correct horse").await.unwrap_err();
    assert!(matches!(err, AuthError::Network(_)));
    assert!(!err.to_string().is_empty());
    assert!(!h.manager.is_authenticated());
    assert!(!h.manager.is_loading());
}

#[tokio::test]
async fn chat_requests_reach_the_conversation_route() {
    let (url, _backend) = spawn_backend().await;
    let h = harness(&url).await;
    let thread = h.provider.messages_with(uuid::Uuid::new_v4()).await.unwrap();
    assert!(thread.is_empty());
}
