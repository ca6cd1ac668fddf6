mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use care_marketplace_backend::{
    middleware::auth::{issue_token, Role},
    routes,
};
use chrono::Duration;
use common::{bearer, offline_state, JWT_SECRET, WEBHOOK_SECRET};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

fn app(public_rps: u32) -> Router {
    routes::router(offline_state(), public_rps, 100)
}

async fn body_json(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn create_job_request(auth: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/jobs")
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder
        .body(Body::from(
            json!({
                "title": "Post-op recovery visits",
                "care_type": "post-operative",
                "hourly_rate": "52.50"
            })
            .to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn missing_or_bad_tokens_are_unauthorized() {
    let app = app(100);

    let resp = app.clone().oneshot(create_job_request(None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "unauthorized");

    let resp = app
        .clone()
        .oneshot(create_job_request(Some("Bearer not-a-jwt".into())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(create_job_request(Some("Basic dXNlcjpwYXNz".into())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_role_is_forbidden_before_touching_the_store() {
    let app = app(100);

    let resp = app
        .clone()
        .oneshot(create_job_request(Some(bearer(Uuid::new_v4(), Role::Nurse))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["code"], "forbidden");

    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/timecards/{}/approve", Uuid::new_v4()))
        .header("authorization", bearer(Uuid::new_v4(), Role::Nurse))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/audit/timecard/{}", Uuid::new_v4()))
        .header("authorization", bearer(Uuid::new_v4(), Role::Client))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn collaborator_callbacks_require_the_webhook_secret() {
    let app = app(100);
    let payload = json!({ "timecard_id": Uuid::new_v4() }).to_string();

    let req = Request::builder()
        .method("POST")
        .uri("/api/webhook/payments/settled")
        .header("content-type", "application/json")
        .body(Body::from(payload.clone()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("POST")
        .uri("/api/internal/timecards/sweep")
        .header("x-webhook-secret", format!("{}-nope", WEBHOOK_SECRET))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["code"], "unauthorized");
}

#[tokio::test]
async fn invalid_payload_is_rejected_by_validation() {
    let app = app(100);
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/timecards/{}/reject", Uuid::new_v4()))
        .header("content-type", "application/json")
        .header("authorization", bearer(Uuid::new_v4(), Role::Client))
        .body(Body::from(json!({ "reason": "" }).to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], "validation_error");
}

#[tokio::test]
async fn rate_limit_follows_the_verified_user_not_the_token_string() {
    let app = app(1);
    let nurse_id = Uuid::new_v4();

    let first = app
        .clone()
        .oneshot(create_job_request(Some(bearer(nurse_id, Role::Nurse))))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::FORBIDDEN);

    let fresh_token = issue_token(JWT_SECRET, nurse_id, Role::Nurse, Duration::minutes(30)).unwrap();
    let second = app
        .clone()
        .oneshot(create_job_request(Some(format!("Bearer {}", fresh_token))))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key("retry-after"));

    let other_caller = app
        .clone()
        .oneshot(create_job_request(Some(bearer(Uuid::new_v4(), Role::Nurse))))
        .await
        .unwrap();
    assert_eq!(other_caller.status(), StatusCode::FORBIDDEN);

    for garbage in ["Bearer junk-1", "Bearer junk-2"] {
        let resp = app
            .clone()
            .oneshot(create_job_request(Some(garbage.to_string())))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn openapi_document_lists_lifecycle_routes() {
    let req = Request::builder()
        .uri("/api/openapi.json")
        .body(Body::empty())
        .unwrap();
    let resp = app(100).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let doc = body_json(resp).await;
    let paths = doc["paths"].as_object().expect("paths");
    assert!(paths.contains_key("/api/jobs"));
    assert!(paths.contains_key("/api/applications/{id}/status"));
    assert!(paths.contains_key("/api/internal/timecards/sweep"));
}
