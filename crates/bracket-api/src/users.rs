use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;
use uuid::Uuid;

use bracket_rules::validate_username;
use bracket_types::api::RegisterRequest;
use bracket_types::models::User;

use crate::error::ApiError;
use crate::state::{AppState, run_db};

/// POST /users: registers a username, or returns the existing user with
/// that name. 201 when created, 200 when it already existed.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let username = validate_username(&req.username).inspect_err(|e| {
        warn!("Rejected username '{}': {}", req.username, e);
    })?;

    let (user, created) = run_db(&state, move |db| db.get_or_create_user(&username)).await?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(user)))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = run_db(&state, |db| db.list_users()).await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    run_db(&state, move |db| db.get_user_by_id(user_id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("User"))
}
