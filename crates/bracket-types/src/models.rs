use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub joined_at: DateTime<Utc>,
}

/// A contestant pair. Ids are small integers fixed when the bracket is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Couple {
    pub id: u32,
    pub names: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    pub id: Uuid,
    pub name: String,
    /// 1-based; only ever moves forward.
    pub current_episode: u32,
    pub couples: Vec<Couple>,
    pub created_at: DateTime<Utc>,
}

impl Bracket {
    pub fn couple(&self, couple_id: u32) -> Option<&Couple> {
        self.couples.iter().find(|c| c.id == couple_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupleRank {
    pub couple_id: u32,
    pub rank: u32,
}

/// One user's rank assignment over every couple for one episode.
/// At most one exists per (user_id, bracket_id, episode_number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bracket_id: Uuid,
    pub episode_number: u32,
    pub rankings: Vec<CoupleRank>,
    pub submitted_at: DateTime<Utc>,
}

impl Ranking {
    pub fn rank_for(&self, couple_id: u32) -> Option<u32> {
        self.rankings
            .iter()
            .find(|r| r.couple_id == couple_id)
            .map(|r| r.rank)
    }
}

/// A submission that has passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingSubmission {
    pub user_id: Uuid,
    pub bracket_id: Uuid,
    pub episode_number: u32,
    pub rankings: Vec<CoupleRank>,
}
