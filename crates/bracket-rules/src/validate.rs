use std::collections::HashSet;

use thiserror::Error;
use uuid::Uuid;

use bracket_types::api::SubmitRankingRequest;
use bracket_types::models::{Bracket, RankingSubmission};

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Username must be between 3 and 32 characters")]
    InvalidUsername,

    #[error("Submission is for bracket {actual}, not {expected}")]
    BracketMismatch { expected: Uuid, actual: Uuid },

    #[error("Must rank exactly {expected} couples, got {actual}")]
    WrongCoupleCount { expected: usize, actual: usize },

    #[error("Duplicate ranks are not allowed (rank {0} used twice)")]
    DuplicateRank(u32),

    #[error("Rank {rank} is outside 1..={max}")]
    RankOutOfRange { rank: u32, max: u32 },

    #[error("Couple {0} is not part of this bracket")]
    UnknownCouple(u32),

    #[error("Couple {0} is ranked more than once")]
    DuplicateCouple(u32),
}

/// Returns the trimmed username when it is long enough to register.
pub fn validate_username(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return Err(ValidationError::InvalidUsername);
    }
    Ok(trimmed.to_string())
}

/// Checks a raw submission against the bracket it targets.
///
/// On success the ranks form a permutation of `1..=N` over exactly the
/// bracket's couples, where `N` is the couple count.
pub fn validate_submission(
    req: SubmitRankingRequest,
    bracket: &Bracket,
) -> Result<RankingSubmission, ValidationError> {
    let (Some(user_id), Some(bracket_id), Some(episode_number), Some(rankings)) =
        (req.user_id, req.bracket_id, req.episode_number, req.rankings)
    else {
        return Err(ValidationError::MissingFields);
    };
    // Episodes are 1-based; zero is treated as absent.
    if episode_number == 0 {
        return Err(ValidationError::MissingFields);
    }

    if bracket_id != bracket.id {
        return Err(ValidationError::BracketMismatch {
            expected: bracket.id,
            actual: bracket_id,
        });
    }

    let expected = bracket.couples.len();
    if rankings.len() != expected {
        return Err(ValidationError::WrongCoupleCount {
            expected,
            actual: rankings.len(),
        });
    }

    let mut ranks = HashSet::with_capacity(rankings.len());
    for entry in &rankings {
        if !ranks.insert(entry.rank) {
            return Err(ValidationError::DuplicateRank(entry.rank));
        }
    }

    let max = u32::try_from(expected).unwrap_or(u32::MAX);
    let mut couples = HashSet::with_capacity(rankings.len());
    for entry in &rankings {
        if entry.rank == 0 || entry.rank > max {
            return Err(ValidationError::RankOutOfRange { rank: entry.rank, max });
        }
        if bracket.couple(entry.couple_id).is_none() {
            return Err(ValidationError::UnknownCouple(entry.couple_id));
        }
        if !couples.insert(entry.couple_id) {
            return Err(ValidationError::DuplicateCouple(entry.couple_id));
        }
    }

    Ok(RankingSubmission {
        user_id,
        bracket_id,
        episode_number,
        rankings,
    })
}
