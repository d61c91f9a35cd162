use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::CoupleRank;

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
}

// -- Rankings --

/// Raw submission body. Every field is optional here so that a missing field
/// surfaces as a validation error rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRankingRequest {
    pub user_id: Option<Uuid>,
    pub bracket_id: Option<Uuid>,
    pub episode_number: Option<u32>,
    pub rankings: Option<Vec<CoupleRank>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RankingsQuery {
    pub episode: Option<u32>,
}

// -- Brackets --

/// When `expected_episode` is set, advancement only happens if the bracket is
/// still on that episode. Guards against double advancement by two clients.
/// Accepted either as the JSON body or as `?expectedEpisode=N`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRequest {
    pub expected_episode: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStatusResponse {
    pub bracket_id: Uuid,
    pub current_episode: u32,
    pub ready_to_advance: bool,
    pub submitted_user_ids: Vec<Uuid>,
    pub pending_user_ids: Vec<Uuid>,
}

// -- Standings --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserColumn {
    pub id: Uuid,
    pub username: String,
}

/// One table row: a couple and the rank each user gave it, in column order.
/// `None` means the user ranked nothing for this couple in this episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupleStandingRow {
    pub couple_id: u32,
    pub names: String,
    pub ranks: Vec<Option<u32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeStandingsResponse {
    pub episode_number: u32,
    pub rows: Vec<CoupleStandingRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsResponse {
    pub bracket_id: Uuid,
    pub current_episode: u32,
    pub users: Vec<UserColumn>,
    pub episodes: Vec<EpisodeStandingsResponse>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_request_uses_camel_case_fields() {
        let body = r#"{
            "userId": "6f1c1a9e-3b7f-4b1e-9c43-0e1a2b3c4d5e",
            "bracketId": "00000000-0000-0000-0000-000000000001",
            "episodeNumber": 2,
            "rankings": [{"coupleId": 1, "rank": 3}]
        }"#;
        let req: SubmitRankingRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.episode_number, Some(2));
        assert_eq!(
            req.rankings.unwrap(),
            vec![CoupleRank { couple_id: 1, rank: 3 }]
        );
    }

    #[test]
    fn submit_request_tolerates_missing_fields() {
        let req: SubmitRankingRequest = serde_json::from_str(r#"{"episodeNumber": 1}"#).unwrap();
        assert!(req.user_id.is_none());
        assert!(req.rankings.is_none());
    }

    #[test]
    fn submit_request_ignores_extra_keys() {
        let req: SubmitRankingRequest =
            serde_json::from_str(r#"{"episodeNumber": 1, "username": "alice"}"#).unwrap();
        assert_eq!(req.episode_number, Some(1));
    }

    #[test]
    fn advance_request_is_optional_camel_case() {
        let req: AdvanceRequest = serde_json::from_str(r#"{"expectedEpisode": 4}"#).unwrap();
        assert_eq!(req.expected_episode, Some(4));
        let req: AdvanceRequest = serde_json::from_str("{}").unwrap();
        assert!(req.expected_episode.is_none());
    }

    #[test]
    fn submit_request_rejects_non_array_rankings() {
        let res = serde_json::from_str::<SubmitRankingRequest>(r#"{"rankings": "1,2,3"}"#);
        assert!(res.is_err());
    }
}
