pub mod brackets;
pub mod error;
pub mod rankings;
pub mod state;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

/// All routes, without transport layers. The server adds CORS and tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", get(users::list_users).post(users::register))
        .route("/users/{user_id}", get(users::get_user))
        .route("/bracket", get(brackets::get_default_bracket))
        .route("/brackets", get(brackets::list_brackets))
        .route("/brackets/{bracket_id}", get(brackets::get_bracket))
        .route("/brackets/{bracket_id}/advance", post(brackets::advance_episode))
        .route("/brackets/{bracket_id}/status", get(brackets::submission_status))
        .route("/brackets/{bracket_id}/rankings", get(rankings::list_rankings))
        .route("/brackets/{bracket_id}/standings", get(rankings::standings))
        .route("/rankings", post(rankings::submit_ranking))
        .with_state(state)
}

pub async fn health() -> &'static str {
    "ok"
}
