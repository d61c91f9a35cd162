use axum::{
    Json,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

use bracket_db::UpsertOutcome;
use bracket_rules::{Standings, ValidationError, validate_submission};
use bracket_types::api::{RankingsQuery, StandingsResponse, SubmitRankingRequest};
use bracket_types::models::Ranking;

use crate::error::ApiError;
use crate::state::{AppState, run_db};

/// POST /rankings: validates a submission and stores it, replacing any
/// earlier ranking by the same user for the same bracket and episode.
/// 201 when a ranking was created, 200 when one was replaced.
pub async fn submit_ranking(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRankingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let (Some(user_id), Some(bracket_id)) = (req.user_id, req.bracket_id) else {
        return Err(ValidationError::MissingFields.into());
    };

    let (bracket, user) = run_db(&state, move |db| {
        Ok((db.get_bracket(bracket_id)?, db.get_user_by_id(user_id)?))
    })
    .await?;
    let bracket = bracket.ok_or(ApiError::NotFound("Bracket"))?;
    if user.is_none() {
        return Err(ApiError::NotFound("User"));
    }

    let submission = validate_submission(req, &bracket).inspect_err(|e| {
        warn!("Rejected ranking from user {}: {}", user_id, e);
    })?;

    let (ranking, outcome) = run_db(&state, move |db| db.upsert_ranking(&submission)).await?;

    let status = match outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Replaced => StatusCode::OK,
    };
    info!(
        "Ranking {} {:?} for user {} episode {}",
        ranking.id, outcome, ranking.user_id, ranking.episode_number
    );

    Ok((status, Json(ranking)))
}

/// GET /brackets/{id}/rankings[?episode=N]
pub async fn list_rankings(
    State(state): State<AppState>,
    Path(bracket_id): Path<Uuid>,
    query: Result<Query<RankingsQuery>, QueryRejection>,
) -> Result<Json<Vec<Ranking>>, ApiError> {
    let Query(query) = query?;

    run_db(&state, move |db| {
        if db.get_bracket(bracket_id)?.is_none() {
            return Ok(None);
        }
        let rankings = match query.episode {
            Some(episode) => db.rankings_for_episode(bracket_id, episode)?,
            None => db.rankings_for_bracket(bracket_id)?,
        };
        Ok(Some(rankings))
    })
    .await?
    .map(Json)
    .ok_or(ApiError::NotFound("Bracket"))
}

/// GET /brackets/{id}/standings: the couple x user grid for every
/// completed episode.
pub async fn standings(
    State(state): State<AppState>,
    Path(bracket_id): Path<Uuid>,
) -> Result<Json<StandingsResponse>, ApiError> {
    let (bracket, users, rankings) = run_db(&state, move |db| {
        let Some(bracket) = db.get_bracket(bracket_id)? else {
            return Ok(None);
        };
        Ok(Some((bracket, db.list_users()?, db.rankings_for_bracket(bracket_id)?)))
    })
    .await?
    .ok_or(ApiError::NotFound("Bracket"))?;

    Ok(Json(Standings::new(&bracket, &users, &rankings).to_response()))
}
