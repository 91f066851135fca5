use axum::body::{ to_bytes, Body };
use axum::http::{ Request, StatusCode };
use axum::Router;
use course_assistant::auth::{ AccessClaims, TokenVerifier };
use course_assistant::config::prompt::builtin_prompts;
use course_assistant::course::CourseAssistant;
use course_assistant::llm::chat::mock::MockChatClient;
use course_assistant::server::{ router, AppState };
use jsonwebtoken::{ encode, EncodingKey, Header };
use serde_json::{ json, Value };
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

const COURSE_JSON: &str = r#"{
    "title": "Guitar for Teens",
    "description": "From first chord to first song",
    "modules": [{
        "title": "Basics",
        "description": "Holding the guitar",
        "content": [
            {"type": "video", "title": "Posture", "description": "Sit and hold"},
            {"type": "quiz", "title": "Parts", "description": "Name the parts"}
        ]
    }],
    "level": "beginner",
    "duration": "4 weeks",
    "category": "music"
}"#;

fn app(client: Arc<MockChatClient>) -> Router {
    let prompts = builtin_prompts().expect("bundled prompts");
    router(AppState {
        assistant: Arc::new(CourseAssistant::new(client, prompts)),
        verifier: Arc::new(TokenVerifier::new(Some(SECRET))),
        limiter: None,
        prompts_path: None,
    })
}

fn token() -> String {
    let claims = AccessClaims {
        sub: Some("instructor-1".into()),
        email: Some("instructor@example.com".into()),
        exp: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn complete_context() -> Value {
    json!([
        {"role": "user", "content": "The subject is guitar"},
        {"role": "assistant", "content": "Great, who is the audience?"},
        {"role": "user", "content": "The audience is teenagers"},
        {"role": "user", "content": "Objectives: play three songs"},
        {"role": "user", "content": "Duration: four weeks"}
    ])
}

#[tokio::test]
async fn first_message_gets_the_model_reply() {
    let client = Arc::new(MockChatClient::new().with_reply("Who is your target audience?"));
    let (status, body) = post_json(app(client.clone()), "/course-generation/generate", json!({
        "message": "I want to teach guitar",
        "context": [{"role": "user", "content": "I want to teach guitar"}],
        "access_token": token()
    })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Who is your target audience?"}));
    assert!(client.prompts()[0].contains("\"I want to teach guitar\""));
}

#[tokio::test]
async fn complete_conversation_returns_course_data() {
    let client = Arc::new(MockChatClient::new().with_reply(format!("```json\n{}\n```", COURSE_JSON)));
    let (status, body) = post_json(app(client.clone()), "/course-generation/generate", json!({
        "message": "",
        "context": complete_context(),
        "access_token": token()
    })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "I've generated your course structure! You can now review and customize it.");
    assert_eq!(body["courseData"]["title"], "Guitar for Teens");
    assert_eq!(body["courseData"]["modules"][0]["content"][1]["type"], "quiz");
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let client = Arc::new(MockChatClient::new());
    let (status, body) = post_json(app(client.clone()), "/course-generation/generate", json!({
        "message": "guitar",
        "context": []
    })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access token is missing");
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn forged_token_is_unauthorized() {
    let forged = encode(
        &Header::default(),
        &AccessClaims { sub: Some("x".into()), email: None, exp: None },
        &EncodingKey::from_secret(b"not-the-secret")
    ).unwrap();
    let (status, body) = post_json(app(Arc::new(MockChatClient::new())), "/course-generation/generate", json!({
        "message": "guitar",
        "context": [],
        "access_token": forged
    })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid access token");
}

#[tokio::test]
async fn non_array_context_is_rejected_before_auth() {
    let (status, body) = post_json(app(Arc::new(MockChatClient::new())), "/course-generation/generate", json!({
        "message": "guitar",
        "context": "subject audience"
    })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid context format");
}

#[tokio::test]
async fn bad_course_shape_is_a_bad_gateway() {
    let bad = COURSE_JSON.replace("\"quiz\"", "\"slideshow\"");
    let client = Arc::new(MockChatClient::new().with_reply(bad));
    let (status, body) = post_json(app(client), "/course-generation/generate", json!({
        "message": "",
        "context": complete_context(),
        "access_token": token()
    })).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"message": "Failed to generate course structure", "kind": "schema_mismatch"}));
}

#[tokio::test]
async fn model_outage_is_service_unavailable() {
    let client = Arc::new(MockChatClient::new().with_failure("connection refused"));
    let (status, body) = post_json(app(client), "/course-generation/generate", json!({
        "message": "guitar",
        "context": [],
        "access_token": token()
    })).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Failed to generate response");
    assert_eq!(body["kind"], "model_unavailable");
}

#[tokio::test]
async fn incomplete_brief_is_a_bad_request() {
    let client = Arc::new(MockChatClient::new());
    let (status, body) = post_json(app(client.clone()), "/course-generation/generate", json!({
        "message": "",
        "context": [],
        "access_token": token(),
        "stage": "final",
        "brief": {"subject": "Guitar", "audience": "Teens"}
    })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "incomplete_brief");
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn outline_modes_return_raw_content() {
    let client = Arc::new(MockChatClient::new().with_reply("{\"objectives\": []}"));
    let (status, body) = post_json(app(client.clone()), "/course-generation", json!({
        "mode": "objectives",
        "subject": "Rust",
        "level": "beginner"
    })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"content": "{\"objectives\": []}"}));
    assert!(client.prompts()[0].contains("Rust at beginner level"));
}

#[tokio::test]
async fn unknown_mode_is_rejected() {
    let client = Arc::new(MockChatClient::new());
    let (status, body) = post_json(app(client.clone()), "/course-generation", json!({
        "mode": "enhance",
        "subject": "Rust",
        "level": "beginner"
    })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid generation mode");
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn enhance_wraps_the_content() {
    let client = Arc::new(MockChatClient::new().with_reply("Enhanced!"));
    let (status, body) = post_json(app(client.clone()), "/course-generation/enhance", json!({
        "content": "Week 1: scales"
    })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Enhanced!");
    assert!(client.prompts()[0].ends_with("Content: Week 1: scales"));
}

#[tokio::test]
async fn health_reports_ok() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app(Arc::new(MockChatClient::new())).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn reload_without_a_prompts_file_reports_failure() {
    let request = Request::builder().uri("/api/reload-prompts").body(Body::empty()).unwrap();
    let response = app(Arc::new(MockChatClient::new())).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn spent_quota_returns_too_many_requests() {
    use governor::{ Quota, RateLimiter };
    use std::num::NonZeroU32;

    let client = Arc::new(MockChatClient::new());
    let limiter = RateLimiter::direct(Quota::per_second(NonZeroU32::new(1).unwrap()));
    let app = router(AppState {
        assistant: Arc::new(CourseAssistant::new(client.clone(), builtin_prompts().unwrap())),
        verifier: Arc::new(TokenVerifier::new(Some(SECRET))),
        limiter: Some(Arc::new(limiter)),
        prompts_path: None,
    });
    let body = json!({"content": "Week 1"});

    let (first, _) = post_json(app.clone(), "/course-generation/enhance", body.clone()).await;
    let (second, reply) = post_json(app, "/course-generation/enhance", body).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(reply["message"], "Too many requests");
    assert_eq!(client.call_count(), 1);
}
