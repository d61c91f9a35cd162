use axum::{
    Json,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
};
use tracing::{info, warn};
use uuid::Uuid;

use bracket_db::Advance;
use bracket_rules::submission_status as compute_status;
use bracket_types::api::{AdvanceRequest, SubmissionStatusResponse};
use bracket_types::models::Bracket;

use crate::error::ApiError;
use crate::state::{AppState, run_db};

/// GET /bracket: the single active bracket, created on first use.
pub async fn get_default_bracket(State(state): State<AppState>) -> Result<Json<Bracket>, ApiError> {
    let bracket = run_db(&state, |db| db.get_or_create_default_bracket()).await?;
    Ok(Json(bracket))
}

pub async fn list_brackets(State(state): State<AppState>) -> Result<Json<Vec<Bracket>>, ApiError> {
    let brackets = run_db(&state, |db| db.list_brackets()).await?;
    Ok(Json(brackets))
}

pub async fn get_bracket(
    State(state): State<AppState>,
    Path(bracket_id): Path<Uuid>,
) -> Result<Json<Bracket>, ApiError> {
    run_db(&state, move |db| db.get_bracket(bracket_id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Bracket"))
}

/// POST /brackets/{id}/advance: moves the bracket to its next episode.
///
/// Does not check that everyone has submitted; clients consult
/// `/brackets/{id}/status` first. An `expectedEpisode` in the JSON body (or
/// the query string) turns this into a compare-and-set so two clients cannot
/// both advance past N. The body wins when both are present.
pub async fn advance_episode(
    State(state): State<AppState>,
    Path(bracket_id): Path<Uuid>,
    query: Result<Query<AdvanceRequest>, QueryRejection>,
    body: Result<Option<Json<AdvanceRequest>>, JsonRejection>,
) -> Result<Json<Bracket>, ApiError> {
    let Query(query) = query?;
    let expected = body?
        .and_then(|Json(body)| body.expected_episode)
        .or(query.expected_episode);

    match run_db(&state, move |db| db.advance_episode(bracket_id, expected)).await? {
        Advance::Advanced(bracket) => {
            info!(
                "Episode advanced on bracket {} (now {})",
                bracket.id, bracket.current_episode
            );
            Ok(Json(bracket))
        }
        Advance::NotFound => Err(ApiError::NotFound("Bracket")),
        Advance::Stale { current } => {
            warn!(
                "Stale advance on bracket {}: expected episode {:?}, bracket is on {}",
                bracket_id, expected, current
            );
            Err(ApiError::Conflict(format!(
                "Bracket is already on episode {}",
                current
            )))
        }
        Advance::Exhausted => {
            warn!("Bracket {} is on its last representable episode", bracket_id);
            Err(ApiError::Conflict(
                "Bracket cannot advance past its last episode".to_string(),
            ))
        }
    }
}

/// GET /brackets/{id}/status: which registered users have submitted for
/// the current episode, and whether that is everyone.
pub async fn submission_status(
    State(state): State<AppState>,
    Path(bracket_id): Path<Uuid>,
) -> Result<Json<SubmissionStatusResponse>, ApiError> {
    let (bracket, users, rankings) = run_db(&state, move |db| {
        let Some(bracket) = db.get_bracket(bracket_id)? else {
            return Ok(None);
        };
        let users = db.list_users()?;
        let rankings = db.rankings_for_episode(bracket_id, bracket.current_episode)?;
        Ok(Some((bracket, users, rankings)))
    })
    .await?
    .ok_or(ApiError::NotFound("Bracket"))?;

    let status = compute_status(&bracket, &users, &rankings);

    Ok(Json(SubmissionStatusResponse {
        bracket_id: bracket.id,
        current_episode: bracket.current_episode,
        ready_to_advance: status.is_ready(),
        submitted_user_ids: status.submitted,
        pending_user_ids: status.pending,
    }))
}
