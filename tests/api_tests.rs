//! Integration tests for the auth and user endpoints, driven through the
//! full router against a throwaway database.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use mandi::config::Config;
use mandi::token::{TokenKeys, TokenOutcome};
use tower::ServiceExt;

const TEST_JWT_SECRET: &str = "integration-test-secret";

fn test_config() -> Config {
    let db_path = std::env::temp_dir().join(format!("mandi-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.auth.jwt_secret = TEST_JWT_SECRET.to_string();
    config
}

async fn spawn_app() -> Router {
    let state = mandi::api::create_app_state(test_config(), None)
        .await
        .expect("failed to create app state");
    mandi::api::router(state)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header("Content-Type", mime::APPLICATION_JSON.as_ref())
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn register_body(email: &str) -> serde_json::Value {
    serde_json::json!({
        "email": email,
        "password": "hunter2-strong",
        "firstName": "Test",
        "lastName": "User",
        "phone": "0300-1234567",
        "city": "Lahore",
        "region": "Punjab",
    })
}

async fn register(app: &Router, email: &str) -> (i64, String) {
    let (status, body) = request(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(register_body(email)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let id = body["user"]["id"].as_i64().expect("user id in response");
    let token = body["token"].as_str().expect("token in response").to_string();
    (id, token)
}

#[tokio::test]
async fn test_register_returns_user_and_decodable_token() {
    let config = test_config();
    let auth_config = config.auth.clone();
    let state = mandi::api::create_app_state(config, None)
        .await
        .expect("failed to create app state");
    let app = mandi::api::router(state);

    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(register_body("alice@example.com")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["isSeller"], false);
    assert_eq!(body["user"]["country"], "Pakistan");

    // The password must never leave the server in any shape.
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());

    let token = body["token"].as_str().expect("token in response");
    let keys = TokenKeys::new(&auth_config);
    match keys.verify(token) {
        TokenOutcome::Valid(claims) => {
            assert_eq!(i64::from(claims.sub), body["user"]["id"].as_i64().unwrap());
            assert_eq!(claims.email, "alice@example.com");
        }
        other => panic!("expected valid token, got {other:?}"),
    }
}

#[tokio::test]
async fn test_register_validation_and_duplicate_email() {
    let app = spawn_app().await;

    // Missing phone.
    let mut body = register_body("bob@example.com");
    body.as_object_mut().unwrap().remove("phone");
    let (status, err) = request(&app, "POST", "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("phone"));

    register(&app, "bob@example.com").await;

    let (status, err) = request(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(register_body("bob@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["error"].is_string());

    // Emails are compared case-sensitively, so this is a different account.
    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(register_body("BOB@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_login_and_me() {
    let app = spawn_app().await;
    register(&app, "carol@example.com").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({
            "email": "carol@example.com",
            "password": "hunter2-strong",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = request(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "carol@example.com");

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({
            "email": "carol@example.com",
            "password": "wrong-password",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({
            "email": "nobody@example.com",
            "password": "hunter2-strong",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_reject_bad_tokens() {
    let app = spawn_app().await;

    // No Authorization header.
    let (status, body) = request(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    // Garbage token.
    let (status, _) = request(&app, "GET", "/api/auth/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Expired token, signed with the right secret.
    let now = chrono::Utc::now().timestamp();
    let expired = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &serde_json::json!({
            "sub": 1,
            "email": "ghost@example.com",
            "iat": now - 7200,
            "exp": now - 3600,
        }),
        &jsonwebtoken::EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let (status, body) = request(&app, "GET", "/api/auth/me", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized: Token expired");
}

#[tokio::test]
async fn test_user_profile_read() {
    let app = spawn_app().await;
    let (user_id, _) = register(&app, "dave@example.com").await;

    let (status, body) = request(&app, "GET", &format!("/api/users/{user_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "dave@example.com");
    assert_eq!(body["city"], "Lahore");
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
    // Not a seller yet, so no product list.
    assert!(body.get("products").is_none());

    let (status, _) = request(&app, "GET", "/api/users/99999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_update_is_self_only() {
    let app = spawn_app().await;
    let (alice_id, alice_token) = register(&app, "alice2@example.com").await;
    let (_, mallory_token) = register(&app, "mallory@example.com").await;

    // Someone else's profile.
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/users/{alice_id}"),
        Some(&mallory_token),
        Some(serde_json::json!({ "firstName": "Hacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // No token at all.
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/users/{alice_id}"),
        None,
        Some(serde_json::json!({ "firstName": "Hacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Own profile: only the provided fields change and email is immutable.
    let (status, body) = request(
        &app,
        "PUT",
        &format!("/api/users/{alice_id}"),
        Some(&alice_token),
        Some(serde_json::json!({
            "firstName": "Alicia",
            "city": "Karachi",
            "email": "evil@example.com",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstName"], "Alicia");
    assert_eq!(body["city"], "Karachi");
    assert_eq!(body["lastName"], "User");
    assert_eq!(body["email"], "alice2@example.com");
}

#[tokio::test]
async fn test_password_change_rehashes() {
    let app = spawn_app().await;
    let (user_id, token) = register(&app, "erin@example.com").await;

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/users/{user_id}"),
        Some(&token),
        Some(serde_json::json!({ "password": "brand-new-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({
            "email": "erin@example.com",
            "password": "hunter2-strong",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({
            "email": "erin@example.com",
            "password": "brand-new-password",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let app = spawn_app().await;

    let (status, body) = request(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "reachable");

    // No Prometheus recorder installed in tests; the endpoint still answers.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
