//! Axum route handlers for the feedback portal.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extract::{ApiJson, ApiQuery};
use crate::feedback::query::{query, FeedbackFilters};
use crate::feedback::stats::{dashboard_stats, landing_summary, DashboardStats, LandingSummary};
use crate::feedback::validation::{
    validate_response, validate_submission, SubmitFeedbackRequest,
};
use crate::models::feedback::{FeedbackPatch, FeedbackRecord, FeedbackStatus};
use crate::models::user::{Session, User};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: FeedbackStatus,
}

#[derive(Debug, Deserialize)]
pub struct ResponseRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchUserRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: Option<User>,
    pub is_official: bool,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            is_official: session.is_official(),
            user: session.user,
        }
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Feedback {id} not found"))
}

async fn official_session(state: &AppState) -> Result<Session, AppError> {
    if !state.store.is_official().await? {
        return Err(AppError::Forbidden);
    }
    Ok(state.store.session().await?)
}

// ────────────────────────────────────────────────────────────────────────────
// Feedback
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/feedback?status=&category=&search=&sortBy=
pub async fn handle_list_feedback(
    State(state): State<AppState>,
    ApiQuery(filters): ApiQuery<FeedbackFilters>,
) -> Result<Json<Vec<FeedbackRecord>>, AppError> {
    let records = state.store.get_all().await?;
    Ok(Json(query(&records, &filters)))
}

/// POST /api/v1/feedback
pub async fn handle_submit_feedback(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SubmitFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackRecord>), AppError> {
    let report = validate_submission(&req);
    if !report.passed {
        return Err(AppError::Validation(report.summary()));
    }

    let session = state.store.session().await?;
    let input = req.into_new_feedback(&session);
    let record = state.store.add(&session, input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/feedback/:id
pub async fn handle_get_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FeedbackRecord>, AppError> {
    let record = state.store.get_by_id(&id).await?.ok_or_else(|| not_found(&id))?;
    Ok(Json(record))
}

/// PATCH /api/v1/feedback/:id
///
/// Raw partial update. Restricted to officials since it can rewrite any field.
pub async fn handle_patch_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<FeedbackPatch>,
) -> Result<Json<FeedbackRecord>, AppError> {
    official_session(&state).await?;
    let record = state.store.update(&id, patch).await?.ok_or_else(|| not_found(&id))?;
    Ok(Json(record))
}

/// PUT /api/v1/feedback/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<StatusChangeRequest>,
) -> Result<Json<FeedbackRecord>, AppError> {
    official_session(&state).await?;
    let record = state
        .store
        .update_status(&id, req.status)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(record))
}

/// POST /api/v1/feedback/:id/upvote
pub async fn handle_upvote(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FeedbackRecord>, AppError> {
    let record = state.store.upvote(&id).await?.ok_or_else(|| not_found(&id))?;
    Ok(Json(record))
}

/// POST /api/v1/feedback/:id/response
pub async fn handle_add_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ResponseRequest>,
) -> Result<Json<FeedbackRecord>, AppError> {
    let session = official_session(&state).await?;

    let report = validate_response(&req.content);
    if !report.passed {
        return Err(AppError::Validation(report.summary()));
    }

    let record = state
        .store
        .add_official_response(&session, &id, req.content.trim())
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(record))
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregates
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let records = state.store.get_all().await?;
    Ok(Json(dashboard_stats(&records)))
}

/// GET /api/v1/summary
pub async fn handle_summary(
    State(state): State<AppState>,
) -> Result<Json<LandingSummary>, AppError> {
    let records = state.store.get_all().await?;
    Ok(Json(landing_summary(&records)))
}

// ────────────────────────────────────────────────────────────────────────────
// Identity
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/users
pub async fn handle_list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.store.users().await?))
}

/// GET /api/v1/session
pub async fn handle_get_session(
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(state.store.session().await?.into()))
}

/// PUT /api/v1/session
pub async fn handle_switch_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SwitchUserRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let user = state
        .store
        .switch_user(&req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", req.user_id)))?;
    Ok(Json(Session::for_user(user).into()))
}
