use crate::Database;
use crate::models::{BracketRow, RankingRow, UserRow, format_timestamp};
use anyhow::{Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, ToSql};
use tracing::info;
use uuid::Uuid;

use bracket_types::models::{Bracket, Couple, CoupleRank, Ranking, RankingSubmission, User};

/// The one active bracket. Fixed id so lookups never depend on collection order.
pub const DEFAULT_BRACKET_ID: Uuid = Uuid::from_u128(1);
const DEFAULT_BRACKET_NAME: &str = "Love is Blind Season 8";
const DEFAULT_COUPLES: &[(u32, &str)] = &[
    (1, "Joey and Monica"),
    (2, "Ben and Sara"),
    (3, "Dave and Lauren"),
    (4, "Devin and Virginia"),
    (5, "Daniel and Taylor"),
];

/// Result of [`Database::advance_episode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Advanced(Bracket),
    NotFound,
    /// An expected episode was given and the bracket has already moved past it.
    Stale { current: u32 },
    /// The bracket is on `u32::MAX` and has no next episode.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Replaced,
}

impl Database {
    // -- Users --

    /// Returns the existing user when the name is taken, otherwise registers it.
    /// The bool is true when a new user was created.
    pub fn get_or_create_user(&self, username: &str) -> Result<(User, bool)> {
        self.with_conn_mut(|conn| {
            if let Some(user) = query_user_by_username(conn, username)? {
                return Ok((user, false));
            }

            let user = User {
                id: Uuid::new_v4(),
                username: username.to_string(),
                joined_at: Utc::now(),
            };
            conn.execute(
                "INSERT INTO users (id, username, joined_at) VALUES (?1, ?2, ?3)",
                (user.id.to_string(), &user.username, format_timestamp(user.joined_at)),
            )?;
            info!("Registered user {} ({})", user.username, user.id);
            Ok((user, true))
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_by_id(conn, &id.to_string()))
    }

    /// Registration order. Standings columns follow this order.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, joined_at FROM users ORDER BY joined_at, rowid",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        joined_at: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(UserRow::into_model).collect()
        })
    }

    // -- Brackets --

    pub fn get_bracket(&self, id: Uuid) -> Result<Option<Bracket>> {
        self.with_conn(|conn| query_bracket(conn, &id.to_string()))
    }

    pub fn list_brackets(&self) -> Result<Vec<Bracket>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM brackets ORDER BY created_at, rowid")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut brackets = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(bracket) = query_bracket(conn, &id)? {
                    brackets.push(bracket);
                }
            }
            Ok(brackets)
        })
    }

    /// Singleton record: inserts the seeded bracket if its row is missing,
    /// then reads it back. Safe to call on every request.
    pub fn get_or_create_default_bracket(&self) -> Result<Bracket> {
        self.with_conn_mut(|conn| {
            let id = DEFAULT_BRACKET_ID.to_string();
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO brackets (id, name, current_episode, created_at) VALUES (?1, ?2, 1, ?3)",
                (&id, DEFAULT_BRACKET_NAME, format_timestamp(Utc::now())),
            )?;
            if inserted > 0 {
                for (position, (couple_id, names)) in DEFAULT_COUPLES.iter().enumerate() {
                    tx.execute(
                        "INSERT INTO couples (bracket_id, id, names, position) VALUES (?1, ?2, ?3, ?4)",
                        rusqlite::params![&id, couple_id, names, position as i64],
                    )?;
                }
                info!("Created default bracket '{}'", DEFAULT_BRACKET_NAME);
            }
            tx.commit()?;

            query_bracket(conn, &id)?.ok_or_else(|| anyhow!("Default bracket missing after insert"))
        })
    }

    /// Moves the bracket to its next episode in a single conditional UPDATE.
    ///
    /// With `expected_episode` set, nothing changes unless the bracket is
    /// still on that episode. Without it this is an unconditional increment;
    /// whether everyone has submitted is the caller's concern.
    pub fn advance_episode(&self, bracket_id: Uuid, expected_episode: Option<u32>) -> Result<Advance> {
        self.with_conn_mut(|conn| {
            let id = bracket_id.to_string();
            let changed = conn.execute(
                "UPDATE brackets SET current_episode = current_episode + 1
                 WHERE id = ?1 AND (?2 IS NULL OR current_episode = ?2) AND current_episode < ?3",
                rusqlite::params![&id, expected_episode, u32::MAX],
            )?;

            let outcome = match (changed, query_bracket(conn, &id)?) {
                (_, None) => Advance::NotFound,
                (0, Some(bracket)) if expected_episode.is_some_and(|ep| ep != bracket.current_episode) => {
                    Advance::Stale {
                        current: bracket.current_episode,
                    }
                }
                (0, Some(_)) => Advance::Exhausted,
                (_, Some(bracket)) => Advance::Advanced(bracket),
            };
            Ok(outcome)
        })
    }

    // -- Rankings --

    pub fn find_ranking(&self, user_id: Uuid, bracket_id: Uuid, episode_number: u32) -> Result<Option<Ranking>> {
        self.with_conn(|conn| {
            let user_id = user_id.to_string();
            let bracket_id = bracket_id.to_string();
            let mut found = query_rankings(
                conn,
                "r.user_id = ?1 AND r.bracket_id = ?2 AND r.episode_number = ?3",
                &[&user_id, &bracket_id, &episode_number],
            )?;
            Ok(found.pop())
        })
    }

    /// Creates the ranking for (user, bracket, episode) or replaces the
    /// payload of the existing one, keeping its id. The lookup and the write
    /// share one transaction.
    pub fn upsert_ranking(&self, submission: &RankingSubmission) -> Result<(Ranking, UpsertOutcome)> {
        self.with_conn_mut(|conn| {
            let user_id = submission.user_id.to_string();
            let bracket_id = submission.bracket_id.to_string();
            let submitted_at = Utc::now();

            let tx = conn.transaction()?;
            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM rankings WHERE user_id = ?1 AND bracket_id = ?2 AND episode_number = ?3",
                    rusqlite::params![&user_id, &bracket_id, submission.episode_number],
                    |row| row.get(0),
                )
                .optional()?;

            let (id, outcome) = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE rankings SET submitted_at = ?1 WHERE id = ?2",
                        (format_timestamp(submitted_at), &id),
                    )?;
                    tx.execute("DELETE FROM ranking_entries WHERE ranking_id = ?1", [&id])?;
                    (id.parse::<Uuid>()?, UpsertOutcome::Replaced)
                }
                None => {
                    let id = Uuid::new_v4();
                    tx.execute(
                        "INSERT INTO rankings (id, user_id, bracket_id, episode_number, submitted_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        rusqlite::params![
                            id.to_string(),
                            &user_id,
                            &bracket_id,
                            submission.episode_number,
                            format_timestamp(submitted_at)
                        ],
                    )?;
                    (id, UpsertOutcome::Created)
                }
            };

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO ranking_entries (ranking_id, position, couple_id, rank_value) VALUES (?1, ?2, ?3, ?4)",
                )?;
                let ranking_id = id.to_string();
                for (position, entry) in submission.rankings.iter().enumerate() {
                    stmt.execute(rusqlite::params![
                        &ranking_id,
                        position as i64,
                        entry.couple_id,
                        entry.rank
                    ])?;
                }
            }
            tx.commit()?;

            let ranking = Ranking {
                id,
                user_id: submission.user_id,
                bracket_id: submission.bracket_id,
                episode_number: submission.episode_number,
                rankings: submission.rankings.clone(),
                submitted_at,
            };
            Ok((ranking, outcome))
        })
    }

    pub fn rankings_for_bracket(&self, bracket_id: Uuid) -> Result<Vec<Ranking>> {
        self.with_conn(|conn| {
            let bracket_id = bracket_id.to_string();
            query_rankings(conn, "r.bracket_id = ?1", &[&bracket_id])
        })
    }

    pub fn rankings_for_episode(&self, bracket_id: Uuid, episode_number: u32) -> Result<Vec<Ranking>> {
        self.with_conn(|conn| {
            let bracket_id = bracket_id.to_string();
            query_rankings(
                conn,
                "r.bracket_id = ?1 AND r.episode_number = ?2",
                &[&bracket_id, &episode_number],
            )
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    query_user(conn, "SELECT id, username, joined_at FROM users WHERE username = ?1", username)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_user(conn, "SELECT id, username, joined_at FROM users WHERE id = ?1", id)
}

fn query_user(conn: &Connection, sql: &str, key: &str) -> Result<Option<User>> {
    let row = conn
        .query_row(sql, [key], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                joined_at: row.get(2)?,
            })
        })
        .optional()?;

    row.map(UserRow::into_model).transpose()
}

fn query_bracket(conn: &Connection, id: &str) -> Result<Option<Bracket>> {
    let row = conn
        .query_row(
            "SELECT id, name, current_episode, created_at FROM brackets WHERE id = ?1",
            [id],
            |row| {
                Ok(BracketRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    current_episode: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        )
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut stmt =
        conn.prepare("SELECT id, names FROM couples WHERE bracket_id = ?1 ORDER BY position")?;
    let couples = stmt
        .query_map([id], |row| {
            Ok(Couple {
                id: row.get(0)?,
                names: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    row.into_model(couples).map(Some)
}

/// Loads rankings matching `filter` together with their entries in one
/// query, then folds the joined rows back into one `Ranking` each.
fn query_rankings(conn: &Connection, filter: &str, params: &[&dyn ToSql]) -> Result<Vec<Ranking>> {
    let sql = format!(
        "SELECT r.id, r.user_id, r.bracket_id, r.episode_number, r.submitted_at, e.couple_id, e.rank_value
         FROM rankings r
         LEFT JOIN ranking_entries e ON e.ranking_id = r.id
         WHERE {}
         ORDER BY r.episode_number, r.rowid, e.position",
        filter
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, |row| {
            let ranking = RankingRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                bracket_id: row.get(2)?,
                episode_number: row.get(3)?,
                submitted_at: row.get(4)?,
            };
            let couple_id: Option<u32> = row.get(5)?;
            let rank: Option<u32> = row.get(6)?;
            let entry = couple_id
                .zip(rank)
                .map(|(couple_id, rank)| CoupleRank { couple_id, rank });
            Ok((ranking, entry))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut grouped: Vec<(RankingRow, Vec<CoupleRank>)> = Vec::new();
    for (row, entry) in rows {
        let same_ranking = grouped.last().is_some_and(|(head, _)| head.id == row.id);
        if same_ranking {
            if let (Some((_, entries)), Some(entry)) = (grouped.last_mut(), entry) {
                entries.push(entry);
            }
        } else {
            grouped.push((row, entry.into_iter().collect()));
        }
    }

    grouped
        .into_iter()
        .map(|(row, entries)| row.into_model(entries))
        .collect()
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
