use axum::{
    routing::{ get, post },
    Router,
    extract::State,
    response::{ IntoResponse, Response },
    http::StatusCode,
    Json,
};
use governor::{ RateLimiter, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };
use log::{ debug, error, info, warn };
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{ Any, CorsLayer };
use uuid::Uuid;

use crate::auth::TokenVerifier;
use crate::course::{ CourseAssistant, CourseError, ErrorKind };
use crate::models::api::{
    ContentReply,
    EnhanceRequest,
    ErrorBody,
    GenerateRequest,
    OutlineRequest,
    ReloadResponse,
};
use crate::models::course::GenerationMode;

pub type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<CourseAssistant>,
    pub verifier: Arc<TokenVerifier>,
    pub limiter: Option<Arc<GlobalLimiter>>,
    pub prompts_path: Option<String>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/course-generation/generate", post(generate_handler))
        .route("/course-generation", post(outline_handler))
        .route("/course-generation/enhance", post(enhance_handler))
        .route("/api/reload-prompts", get(reload_prompts_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>, kind: Option<ErrorKind>) -> Response {
    (status, Json(ErrorBody { message: message.into(), kind })).into_response()
}

fn course_error_response(request_id: &Uuid, err: CourseError) -> Response {
    let kind = err.kind();
    let status = match kind {
        ErrorKind::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::UnparsableOutput | ErrorKind::SchemaMismatch => StatusCode::BAD_GATEWAY,
        ErrorKind::IncompleteBrief => StatusCode::BAD_REQUEST,
    };
    match err.raw_output() {
        Some(raw) => error!("[{}] {:?}: {} (raw reply: {})", request_id, kind, err, raw),
        None => error!("[{}] {:?}: {}", request_id, kind, err),
    }
    error_response(status, err.to_string(), Some(kind))
}

/// `Some` with a 429 when the global quota is spent.
fn throttle(state: &AppState, request_id: &Uuid) -> Option<Response> {
    let limiter = state.limiter.as_ref()?;
    if limiter.check().is_ok() {
        return None;
    }
    warn!("[{}] Global rate limit exceeded. Dropping request.", request_id);
    Some(error_response(StatusCode::TOO_MANY_REQUESTS, "Too many requests", None))
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>
) -> Response {
    let request_id = Uuid::new_v4();
    info!("[{}] Generate request", request_id);
    if let Some(resp) = throttle(&state, &request_id) {
        return resp;
    }

    if !req.context.is_array() {
        warn!("[{}] Rejecting non-array context", request_id);
        return error_response(StatusCode::BAD_REQUEST, "Invalid context format", None);
    }

    match state.verifier.verify(req.access_token.as_deref()) {
        Ok(claims) => debug!("[{}] Caller sub={:?}", request_id, claims.sub),
        Err(e) => {
            warn!("[{}] {}", request_id, e);
            return error_response(StatusCode::UNAUTHORIZED, e.to_string(), None);
        }
    }

    match state.assistant.converse(&req.message, &req.context, req.stage, req.brief.as_ref()).await {
        Ok(reply) => {
            info!(
                "[{}] Replied{}",
                request_id,
                if reply.course_data.is_some() { " with course structure" } else { "" }
            );
            Json(reply).into_response()
        }
        Err(e) => course_error_response(&request_id, e),
    }
}

async fn outline_handler(
    State(state): State<AppState>,
    Json(req): Json<OutlineRequest>
) -> Response {
    let request_id = Uuid::new_v4();
    info!("[{}] Outline request, mode '{}'", request_id, req.mode);
    if let Some(resp) = throttle(&state, &request_id) {
        return resp;
    }

    let Some(mode) = GenerationMode::from_request_mode(&req.mode) else {
        warn!("[{}] Unknown generation mode '{}'", request_id, req.mode);
        return error_response(StatusCode::BAD_REQUEST, "Invalid generation mode", None);
    };

    match state.assistant.generate_content(mode, &req.subject, &req.level, "").await {
        Ok(content) => Json(ContentReply { content }).into_response(),
        Err(e) => course_error_response(&request_id, e),
    }
}

async fn enhance_handler(
    State(state): State<AppState>,
    Json(req): Json<EnhanceRequest>
) -> Response {
    let request_id = Uuid::new_v4();
    info!("[{}] Enhance request ({} chars)", request_id, req.content.len());
    if let Some(resp) = throttle(&state, &request_id) {
        return resp;
    }

    match state.assistant.generate_content(GenerationMode::Enhance, "", "", &req.content).await {
        Ok(content) => Json(ContentReply { content }).into_response(),
        Err(e) => course_error_response(&request_id, e),
    }
}

async fn reload_prompts_handler(State(state): State<AppState>) -> Response {
    let Some(path) = state.prompts_path.as_deref() else {
        return (StatusCode::BAD_REQUEST, Json(ReloadResponse {
            success: false,
            message: "No prompts file configured; using built-in templates".into(),
            details: None,
        })).into_response();
    };

    let (ok, detail) = match state.assistant.reload_prompts_if_changed(path).await {
        Ok(true) => (true, format!("{} reloaded", path)),
        Ok(false) => (true, format!("{} unchanged", path)),
        Err(e) => {
            error!("Prompt reload from {} failed: {}", path, e);
            (false, format!("{} error: {}", path, e))
        }
    };

    let code = if ok { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    (code, Json(ReloadResponse {
        success: ok,
        message: if ok { "Reload complete".into() } else { "Reload errors".into() },
        details: Some(vec![detail]),
    })).into_response()
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
