//! API route handlers.
//!
//! Every handler checks its quota category before touching the request
//! body, then validates input. Forwarding to the backing data service is
//! outside this crate; handlers acknowledge what they accepted.

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::ApiError;
use crate::form::{EstimateForm, SignupForm};
use crate::ratelimit::{resolve_identity, Category, Quota, QuotaBackend};
use crate::upload::{self, UploadKind};

/// Longest chat message accepted, in characters.
pub const MAX_CHAT_MESSAGE_CHARS: usize = 2000;

/// Request body ceiling; slightly above the largest upload so oversized
/// files reach the upload validator.
const BODY_LIMIT: usize = 11 * 1024 * 1024;

type ApiResult = Result<(StatusCode, Json<Value>), ApiError>;

/// Shared state for the API handlers.
#[derive(Clone)]
pub struct AppState {
    limiter: Arc<dyn QuotaBackend>,
    user_header: String,
}

impl AppState {
    pub fn new(limiter: Arc<dyn QuotaBackend>, user_header: impl Into<String>) -> Self {
        Self {
            limiter,
            user_header: user_header.into().to_ascii_lowercase(),
        }
    }

    /// The authenticated user id forwarded by the session layer, if any.
    fn user_id<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get(self.user_header.as_str())
            .and_then(|v| v.to_str().ok())
    }

    /// Run the quota check for `category`.
    async fn guard(&self, category: Category, headers: &HeaderMap) -> Result<Quota, ApiError> {
        let identity = resolve_identity(headers, self.user_id(headers));
        self.limiter
            .check(category, &identity)
            .await
            .into_result()
            .map_err(ApiError::RateLimited)
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/businesses", post(create_business))
        .route("/api/estimates", post(create_estimate))
        .route("/api/estimates/images", post(upload_estimate_image))
        .route("/api/uploads", post(upload_document))
        .route("/api/chat/messages", post(send_chat_message))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

fn accepted(body: Value) -> ApiResult {
    Ok((StatusCode::ACCEPTED, Json(body)))
}

fn require(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Invalid(format!("{} is required", field)));
    }
    Ok(())
}

async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SignupForm>, JsonRejection>,
) -> ApiResult {
    state.guard(Category::Auth, &headers).await?;
    let Json(form) = body?;

    let incomplete = form.incomplete();
    if !incomplete.is_empty() {
        debug!(sections = ?incomplete, "Signup form incomplete");
        return Err(ApiError::Incomplete(json!(incomplete)));
    }

    accepted(json!({ "status": "pending_verification" }))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult {
    state.guard(Category::Auth, &headers).await?;
    let Json(req) = body?;

    require(&req.email, "email")?;
    require(&req.password, "password")?;

    accepted(json!({ "status": "accepted" }))
}

#[derive(Debug, Deserialize)]
struct BusinessRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    trades: Vec<String>,
}

async fn create_business(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<BusinessRequest>, JsonRejection>,
) -> ApiResult {
    state.guard(Category::Business, &headers).await?;
    let Json(req) = body?;

    require(&req.name, "name")?;
    if req.trades.iter().all(|t| t.trim().is_empty()) {
        return Err(ApiError::Invalid("at least one trade is required".to_string()));
    }

    let id = Uuid::new_v4();
    info!(business_id = %id, "Accepted business listing");
    accepted(json!({ "id": id, "status": "accepted" }))
}

async fn create_estimate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<EstimateForm>, JsonRejection>,
) -> ApiResult {
    state.guard(Category::General, &headers).await?;
    let Json(form) = body?;

    let incomplete = form.incomplete();
    if !incomplete.is_empty() {
        debug!(sections = ?incomplete, "Estimate request incomplete");
        return Err(ApiError::Incomplete(json!(incomplete)));
    }

    let id = Uuid::new_v4();
    info!(estimate_id = %id, trades = form.trades.len(), "Accepted estimate request");
    accepted(json!({ "id": id, "status": "accepted" }))
}

async fn upload_estimate_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    state.guard(Category::EstimateUpload, &headers).await?;
    store_upload(UploadKind::Image, "estimates", &headers, &body?)
}

async fn upload_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    state.guard(Category::Upload, &headers).await?;
    store_upload(UploadKind::Document, "documents", &headers, &body?)
}

fn store_upload(kind: UploadKind, prefix: &str, headers: &HeaderMap, bytes: &[u8]) -> ApiResult {
    let declared = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let upload = upload::validate(kind, bytes, declared)?;
    let path = upload.storage_key(prefix);

    info!(path = %path, size = upload.size, "Accepted upload");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "path": path,
            "contentType": upload.content_type,
            "size": upload.size,
        })),
    ))
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    message: String,
}

async fn send_chat_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatMessage>, JsonRejection>,
) -> ApiResult {
    state.guard(Category::Chat, &headers).await?;
    let Json(req) = body?;

    let length = req.message.trim().chars().count();
    if length == 0 {
        return Err(ApiError::Invalid("message is required".to_string()));
    }
    if length > MAX_CHAT_MESSAGE_CHARS {
        return Err(ApiError::Invalid(format!(
            "message must be at most {} characters",
            MAX_CHAT_MESSAGE_CHARS
        )));
    }

    accepted(json!({ "status": "accepted" }))
}
