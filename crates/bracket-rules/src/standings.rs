use std::collections::{BTreeSet, HashMap};

use uuid::Uuid;

use bracket_types::api::{CoupleStandingRow, EpisodeStandingsResponse, StandingsResponse, UserColumn};
use bracket_types::models::{Bracket, Couple, Ranking, User};

/// Per-episode standings rebuilt from a bracket's flat ranking list.
///
/// Only completed episodes are shown: those that have at least one ranking
/// and are strictly before the bracket's current episode. Each episode is a
/// couple x user grid in bracket order and `users` order. Iterators borrow
/// from `self` and can be walked any number of times; nothing is mutated.
pub struct Standings<'a> {
    bracket: &'a Bracket,
    users: &'a [User],
    by_user_episode: HashMap<(Uuid, u32), &'a Ranking>,
    completed: Vec<u32>,
}

impl<'a> Standings<'a> {
    pub fn new(bracket: &'a Bracket, users: &'a [User], rankings: &'a [Ranking]) -> Self {
        let mut by_user_episode = HashMap::new();
        let mut episodes = BTreeSet::new();

        for ranking in rankings.iter().filter(|r| r.bracket_id == bracket.id) {
            episodes.insert(ranking.episode_number);
            // First one wins if the feed ever carries duplicates.
            by_user_episode
                .entry((ranking.user_id, ranking.episode_number))
                .or_insert(ranking);
        }

        let completed = episodes
            .into_iter()
            .filter(|&ep| ep < bracket.current_episode)
            .collect();

        Self {
            bracket,
            users,
            by_user_episode,
            completed,
        }
    }

    /// Ascending.
    pub fn completed_episodes(&self) -> &[u32] {
        &self.completed
    }

    pub fn episodes(&self) -> impl Iterator<Item = EpisodeStandings<'_>> {
        self.completed
            .iter()
            .map(move |&episode_number| EpisodeStandings {
                standings: self,
                episode_number,
            })
    }

    /// The rank `user_id` gave `couple_id` in `episode`, if any.
    pub fn rank(&self, user_id: Uuid, episode: u32, couple_id: u32) -> Option<u32> {
        self.by_user_episode
            .get(&(user_id, episode))
            .and_then(|ranking| ranking.rank_for(couple_id))
    }

    pub fn to_response(&self) -> StandingsResponse {
        StandingsResponse {
            bracket_id: self.bracket.id,
            current_episode: self.bracket.current_episode,
            users: self
                .users
                .iter()
                .map(|u| UserColumn {
                    id: u.id,
                    username: u.username.clone(),
                })
                .collect(),
            episodes: self
                .episodes()
                .map(|episode| EpisodeStandingsResponse {
                    episode_number: episode.episode_number(),
                    rows: episode
                        .rows()
                        .map(|row| CoupleStandingRow {
                            couple_id: row.couple().id,
                            names: row.couple().names.clone(),
                            ranks: row.cells().map(|cell| cell.rank).collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[derive(Clone, Copy)]
pub struct EpisodeStandings<'s> {
    standings: &'s Standings<'s>,
    episode_number: u32,
}

impl<'s> EpisodeStandings<'s> {
    pub fn episode_number(&self) -> u32 {
        self.episode_number
    }

    pub fn rows(self) -> impl Iterator<Item = CoupleRow<'s>> {
        let Self {
            standings,
            episode_number,
        } = self;
        standings.bracket.couples.iter().map(move |couple| CoupleRow {
            standings,
            episode_number,
            couple,
        })
    }
}

#[derive(Clone, Copy)]
pub struct CoupleRow<'s> {
    standings: &'s Standings<'s>,
    episode_number: u32,
    couple: &'s Couple,
}

impl<'s> CoupleRow<'s> {
    pub fn couple(&self) -> &'s Couple {
        self.couple
    }

    /// One cell per user, in user order.
    pub fn cells(self) -> impl Iterator<Item = RankCell<'s>> {
        let Self {
            standings,
            episode_number,
            couple,
        } = self;
        standings.users.iter().map(move |user| RankCell {
            user,
            rank: standings.rank(user.id, episode_number, couple.id),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankCell<'s> {
    pub user: &'s User,
    /// `None` when the user ranked nothing for this couple, or nothing at all
    /// for the episode.
    pub rank: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bracket_types::models::CoupleRank;
    use chrono::Utc;

    fn bracket(current_episode: u32) -> Bracket {
        Bracket {
            id: Uuid::from_u128(1),
            name: "Test".into(),
            current_episode,
            couples: ["A", "B", "C", "D", "E"]
                .iter()
                .zip(1..)
                .map(|(names, id)| Couple {
                    id,
                    names: names.to_string(),
                })
                .collect(),
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

    fn ranking(user: &User, episode_number: u32, ranks: &[u32]) -> Ranking {
        Ranking {
            id: Uuid::new_v4(),
            user_id: user.id,
            bracket_id: Uuid::from_u128(1),
            episode_number,
            rankings: ranks
                .iter()
                .zip(1..)
                .map(|(&rank, couple_id)| CoupleRank { couple_id, rank })
                .collect(),
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn no_rankings_means_no_completed_episodes() {
        let b = bracket(1);
        let users = vec![user(1)];
        let standings = Standings::new(&b, &users, &[]);
        assert!(standings.completed_episodes().is_empty());
        assert_eq!(standings.episodes().count(), 0);
        assert!(standings.to_response().episodes.is_empty());
    }

    #[test]
    fn current_and_later_episodes_are_excluded() {
        let b = bracket(3);
        let u1 = user(1);
        let rankings = vec![
            ranking(&u1, 3, &[1, 2, 3, 4, 5]),
            ranking(&u1, 1, &[1, 2, 3, 4, 5]),
            ranking(&u1, 4, &[1, 2, 3, 4, 5]),
            ranking(&u1, 2, &[5, 4, 3, 2, 1]),
        ];
        let users = vec![u1];
        let standings = Standings::new(&b, &users, &rankings);
        assert_eq!(standings.completed_episodes(), &[1, 2]);
        let episodes: Vec<u32> = standings.episodes().map(|e| e.episode_number()).collect();
        assert_eq!(episodes, vec![1, 2]);
    }

    #[test]
    fn grid_follows_couple_and_user_order_with_gaps() {
        let b = bracket(2);
        let (u1, u2, u3) = (user(1), user(2), user(3));
        let mut partial = ranking(&u2, 1, &[2, 1, 3, 4, 5]);
        // u2 left couple C out.
        partial.rankings.retain(|r| r.couple_id != 3);
        let rankings = vec![ranking(&u1, 1, &[5, 4, 3, 2, 1]), partial];
        let users = vec![u1, u2, u3];

        let standings = Standings::new(&b, &users, &rankings);
        let episode = standings.episodes().next().unwrap();
        let rows: Vec<(String, Vec<Option<u32>>)> = episode
            .rows()
            .map(|row| (row.couple().names.clone(), row.cells().map(|c| c.rank).collect()))
            .collect();

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], ("A".to_string(), vec![Some(5), Some(2), None]));
        assert_eq!(rows[2], ("C".to_string(), vec![Some(3), None, None]));
        assert_eq!(rows[4], ("E".to_string(), vec![Some(1), Some(5), None]));
    }

    #[test]
    fn iteration_is_restartable() {
        let b = bracket(2);
        let u1 = user(1);
        let rankings = vec![ranking(&u1, 1, &[1, 2, 3, 4, 5])];
        let users = vec![u1];
        let standings = Standings::new(&b, &users, &rankings);

        let first: Vec<Option<u32>> = standings
            .episodes()
            .flat_map(|e| e.rows())
            .flat_map(|r| r.cells())
            .map(|c| c.rank)
            .collect();
        let second: Vec<Option<u32>> = standings
            .episodes()
            .flat_map(|e| e.rows())
            .flat_map(|r| r.cells())
            .map(|c| c.rank)
            .collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn rankings_from_other_brackets_are_ignored() {
        let b = bracket(3);
        let u1 = user(1);
        let mut foreign = ranking(&u1, 1, &[1, 2, 3, 4, 5]);
        foreign.bracket_id = Uuid::from_u128(9);
        let rankings = vec![foreign];
        let users = vec![u1];
        let standings = Standings::new(&b, &users, &rankings);
        assert!(standings.completed_episodes().is_empty());
    }

    #[test]
    fn response_carries_user_columns() {
        let b = bracket(2);
        let (u1, u2) = (user(1), user(2));
        let rankings = vec![ranking(&u1, 1, &[1, 2, 3, 4, 5])];
        let users = vec![u1, u2];
        let resp = Standings::new(&b, &users, &rankings).to_response();
        assert_eq!(resp.current_episode, 2);
        assert_eq!(resp.users.len(), 2);
        assert_eq!(resp.users[1].username, "user2");
        assert_eq!(resp.episodes[0].rows[1].ranks, vec![Some(2), None]);
    }
}
