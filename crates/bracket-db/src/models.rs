//! Database row types. These map directly to SQLite rows and are converted
//! into the shared bracket-types models on the way out.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use bracket_types::models::{Bracket, Couple, CoupleRank, Ranking, User};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub joined_at: String,
}

pub struct BracketRow {
    pub id: String,
    pub name: String,
    pub current_episode: u32,
    pub created_at: String,
}

pub struct RankingRow {
    pub id: String,
    pub user_id: String,
    pub bracket_id: String,
    pub episode_number: u32,
    pub submitted_at: String,
}

impl UserRow {
    pub fn into_model(self) -> Result<User> {
        Ok(User {
            id: parse_id(&self.id)?,
            joined_at: parse_timestamp(&self.joined_at)?,
            username: self.username,
        })
    }
}

impl BracketRow {
    pub fn into_model(self, couples: Vec<Couple>) -> Result<Bracket> {
        Ok(Bracket {
            id: parse_id(&self.id)?,
            created_at: parse_timestamp(&self.created_at)?,
            name: self.name,
            current_episode: self.current_episode,
            couples,
        })
    }
}

impl RankingRow {
    pub fn into_model(self, rankings: Vec<CoupleRank>) -> Result<Ranking> {
        Ok(Ranking {
            id: parse_id(&self.id)?,
            user_id: parse_id(&self.user_id)?,
            bracket_id: parse_id(&self.bracket_id)?,
            episode_number: self.episode_number,
            rankings,
            submitted_at: parse_timestamp(&self.submitted_at)?,
        })
    }
}

/// Fixed-width RFC 3339 so stored timestamps sort lexically.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // SQLite's datetime('now') has no timezone; treat it as UTC.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .with_context(|| format!("Corrupt timestamp '{}'", raw))
}

fn parse_id(raw: &str) -> Result<Uuid> {
    raw.parse::<Uuid>()
        .with_context(|| format!("Corrupt id '{}'", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_survive_storage_format() {
        let now = Utc::now();
        let parsed = parse_timestamp(&format_timestamp(now)).unwrap();
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }

    #[test]
    fn sqlite_default_timestamps_parse_as_utc() {
        let parsed = parse_timestamp("2025-02-14 20:30:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-02-14T20:30:00+00:00");
    }

    #[test]
    fn corrupt_rows_are_errors() {
        let row = UserRow {
            id: "not-a-uuid".into(),
            username: "abc".into(),
            joined_at: "2025-02-14 20:30:00".into(),
        };
        assert!(row.into_model().is_err());
    }
}
