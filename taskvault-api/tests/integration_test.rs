/// Integration tests for the TaskVault API
///
/// These drive the full router end to end: registration and login, the task
/// CRUD surface with ownership enforcement, and error mapping. They need
/// live Postgres and Redis:
///
/// ```text
/// DATABASE_URL=postgresql://localhost/taskvault_test \
/// REDIS_URL=redis://localhost:6379 \
/// cargo test -p taskvault-api -- --ignored
/// ```

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(method: &str, uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        // A unique client per request keeps the auth rate limiter out of the
        // way; the limiter itself is covered by its own test below
        .header("x-forwarded-for", format!("test-{}", Uuid::new_v4()));

    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
#[ignore] // Requires running Postgres + Redis
async fn test_register_login_and_use_token() {
    let ctx = TestContext::new().await.unwrap();
    let username = format!("alice-{}", Uuid::new_v4());

    // Register
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/register",
            None,
            json!({"username": username, "password": "Passw0rd!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Registering the same username again conflicts
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/register",
            None,
            json!({"username": username, "password": "Other123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Login
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({"username": username, "password": "Passw0rd!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    // The issued token works against the task surface. It is signed with the
    // server's configured secret, which in this harness is the test secret.
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/tasks",
            Some(&format!("Bearer {}", token)),
            json!({"title": "Buy milk", "status": "pending"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
#[ignore] // Requires running Postgres + Redis
async fn test_wrong_password_is_unauthorized() {
    let ctx = TestContext::new().await.unwrap();
    let username = format!("bob-{}", Uuid::new_v4());

    ctx.app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/register",
            None,
            json!({"username": username, "password": "Passw0rd!"}),
        ))
        .await
        .unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({"username": username, "password": "WrongPass1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore] // Requires running Postgres + Redis
async fn test_task_routes_require_token() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/tasks")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
#[ignore] // Requires running Postgres + Redis
async fn test_create_task_validation() {
    let ctx = TestContext::new().await.unwrap();
    let (_, auth) = ctx.create_user().await.unwrap();

    // Title too short
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/tasks",
            Some(&auth),
            json!({"title": "ab", "status": "pending"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown status
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/tasks",
            Some(&auth),
            json!({"title": "Write report", "status": "archived"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore] // Requires running Postgres + Redis
async fn test_task_crud_lifecycle() {
    let ctx = TestContext::new().await.unwrap();
    let (_, auth) = ctx.create_user().await.unwrap();

    // Create
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/tasks",
            Some(&auth),
            json!({"title": "Write report", "description": "Q3 numbers", "status": "pending"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let task_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "pending");

    // Read
    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/v1/tasks/{}", task_id))
                .header("authorization", &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["title"], "Write report");
    assert_eq!(fetched["description"], "Q3 numbers");

    // Partial update
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/v1/tasks/{}", task_id),
            Some(&auth),
            json!({"status": "completed"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["status"], "completed");
    assert_eq!(updated["title"], "Write report");

    // List with status filter
    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/tasks?status=completed")
                .header("authorization", &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listing = body_json(response).await;
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["tasks"][0]["id"], task_id.as_str());

    // Delete, then delete again
    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/tasks/{}", task_id))
                .header("authorization", &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/tasks/{}", task_id))
                .header("authorization", &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore] // Requires running Postgres + Redis
async fn test_foreign_task_is_invisible() {
    let ctx = TestContext::new().await.unwrap();
    let (_, alice) = ctx.create_user().await.unwrap();
    let (_, mallory) = ctx.create_user().await.unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/tasks",
            Some(&alice),
            json!({"title": "Private task", "status": "pending"}),
        ))
        .await
        .unwrap();
    let task_id = body_json(response).await["id"].as_str().unwrap().to_string();

    // Another user's read, update, and delete all behave as if the task
    // does not exist
    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/v1/tasks/{}", task_id))
                .header("authorization", &mallory)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/v1/tasks/{}", task_id),
            Some(&mallory),
            json!({"status": "completed"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/tasks/{}", task_id))
                .header("authorization", &mallory)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Mallory's listing is empty
    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/tasks")
                .header("authorization", &mallory)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let listing = body_json(response).await;
    assert_eq!(listing["total"], 0);
}

#[tokio::test]
#[ignore] // Requires running Postgres + Redis
async fn test_auth_requests_are_rate_limited() {
    let ctx = TestContext::new().await.unwrap();
    let client = format!("limited-{}", Uuid::new_v4());

    let mut last_status = StatusCode::OK;
    for _ in 0..11 {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/auth/login")
            .header("content-type", "application/json")
            .header("x-forwarded-for", &client)
            .body(Body::from(
                json!({"username": "nobody-here", "password": "Passw0rd!"}).to_string(),
            ))
            .unwrap();

        last_status = ctx.app.clone().oneshot(request).await.unwrap().status();
    }

    assert_eq!(last_status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
#[ignore] // Requires running Postgres + Redis
async fn test_password_reset_flow() {
    let ctx = TestContext::new().await.unwrap();
    let username = format!("carol-{}", Uuid::new_v4());

    ctx.app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/register",
            None,
            json!({"username": username, "password": "Passw0rd!"}),
        ))
        .await
        .unwrap();

    // Request a reset token
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/password/reset-request",
            None,
            json!({"username": username}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["reset_token"]
        .as_str()
        .unwrap()
        .to_string();

    // Redeem it
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/password/reset",
            None,
            json!({"token": token, "new_password": "N3wPassword"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The token is consumed
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/password/reset",
            None,
            json!({"token": token, "new_password": "An0therPass"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The new password works; the old one does not
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({"username": username, "password": "N3wPassword"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({"username": username, "password": "Passw0rd!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
