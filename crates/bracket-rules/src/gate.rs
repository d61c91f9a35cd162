use std::collections::HashSet;

use uuid::Uuid;

use bracket_types::models::{Bracket, Ranking, User};

/// Who has and hasn't submitted for the bracket's current episode.
/// Both lists follow the order of the `users` slice they were built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionStatus {
    pub episode_number: u32,
    pub submitted: Vec<Uuid>,
    pub pending: Vec<Uuid>,
}

impl SubmissionStatus {
    /// An episode with no registered users is never ready.
    pub fn is_ready(&self) -> bool {
        !self.submitted.is_empty() && self.pending.is_empty()
    }
}

/// Only the registered users passed in are considered; rankings from anyone
/// else, or for another bracket or episode, are ignored.
pub fn submission_status(bracket: &Bracket, users: &[User], rankings: &[Ranking]) -> SubmissionStatus {
    let episode = bracket.current_episode;
    let submitted_ids: HashSet<Uuid> = rankings
        .iter()
        .filter(|r| r.bracket_id == bracket.id && r.episode_number == episode)
        .map(|r| r.user_id)
        .collect();

    let (submitted, pending): (Vec<&User>, Vec<&User>) =
        users.iter().partition(|u| submitted_ids.contains(&u.id));

    SubmissionStatus {
        episode_number: episode,
        submitted: submitted.into_iter().map(|u| u.id).collect(),
        pending: pending.into_iter().map(|u| u.id).collect(),
    }
}

/// True when every registered user has a ranking for the current episode.
pub fn is_ready_to_advance(bracket: &Bracket, users: &[User], rankings: &[Ranking]) -> bool {
    submission_status(bracket, users, rankings).is_ready()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bracket_types::models::{Couple, CoupleRank};
    use chrono::Utc;

    fn bracket(current_episode: u32) -> Bracket {
        Bracket {
            id: Uuid::from_u128(1),
            name: "Test".into(),
            current_episode,
            couples: vec![Couple { id: 1, names: "A".into() }],
            created_at: Utc::now(),
        }
    }

    fn user(n: u128) -> User {
        User {
            id: Uuid::from_u128(100 + n),
            username: format!("user{n}"),
            joined_at: Utc::now(),
        }
    }

    fn ranking(user: &User, bracket_id: Uuid, episode_number: u32) -> Ranking {
        Ranking {
            id: Uuid::new_v4(),
            user_id: user.id,
            bracket_id,
            episode_number,
            rankings: vec![CoupleRank { couple_id: 1, rank: 1 }],
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn ready_when_every_user_submitted() {
        let b = bracket(1);
        let (u1, u2) = (user(1), user(2));
        let rankings = vec![ranking(&u1, b.id, 1), ranking(&u2, b.id, 1)];
        assert!(is_ready_to_advance(&b, &[u1, u2], &rankings));
    }

    #[test]
    fn unregistered_submitter_is_not_considered() {
        let b = bracket(1);
        let (u1, u2, stranger) = (user(1), user(2), user(3));
        let rankings = vec![
            ranking(&u1, b.id, 1),
            ranking(&u2, b.id, 1),
            ranking(&stranger, b.id, 1),
        ];
        let status = submission_status(&b, &[u1.clone(), u2.clone()], &rankings);
        assert_eq!(status.submitted, vec![u1.id, u2.id]);
        assert!(status.is_ready());
    }

    #[test]
    fn pending_user_blocks_advance() {
        let b = bracket(2);
        let (u1, u2) = (user(1), user(2));
        // u2 only has a ranking for the previous episode.
        let rankings = vec![ranking(&u1, b.id, 2), ranking(&u2, b.id, 1)];
        let status = submission_status(&b, &[u1.clone(), u2.clone()], &rankings);
        assert_eq!(status.pending, vec![u2.id]);
        assert!(!status.is_ready());
    }

    #[test]
    fn other_bracket_rankings_do_not_count() {
        let b = bracket(1);
        let u1 = user(1);
        let rankings = vec![ranking(&u1, Uuid::from_u128(9), 1)];
        assert!(!is_ready_to_advance(&b, &[u1], &rankings));
    }

    #[test]
    fn no_users_is_not_ready() {
        let b = bracket(1);
        assert!(!is_ready_to_advance(&b, &[], &[]));
    }
}
