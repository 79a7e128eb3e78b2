use super::player_match::PlayerMatch;
use crate::model::{constants::COLD_START_THRESHOLD, premade::PremadeTracker};
use std::collections::HashSet;
use tokio::sync::Mutex;

/// In-memory state of one player for the duration of a run.
#[derive(Debug)]
pub struct Player {
    pub puuid: String,
    pub points_count: f64,
    pub recap: Option<String>,
    pub solo: Vec<PlayerMatch>,
    pub premade: Vec<PlayerMatch>,
    /// Shared by every concurrent observer during this player's pass
    pub premades: Mutex<PremadeTracker>
}

impl Player {
    pub fn new(puuid: impl Into<String>, points_count: f64) -> Player {
        Player {
            puuid: puuid.into(),
            points_count,
            recap: None,
            solo: Vec::new(),
            premade: Vec::new(),
            premades: Mutex::new(PremadeTracker::default())
        }
    }

    pub fn with_matches(puuid: impl Into<String>, points_count: f64, matches: Vec<PlayerMatch>) -> Player {
        let mut player = Player::new(puuid, points_count);
        for m in matches {
            player.push(m);
        }

        player
    }

    /// A player that has never been scored builds its sample from scratch.
    pub fn is_cold_start(&self) -> bool {
        self.points_count < COLD_START_THRESHOLD
    }

    pub fn total(&self) -> usize {
        self.solo.len() + self.premade.len()
    }

    pub fn push(&mut self, m: PlayerMatch) {
        if m.is_solo() {
            self.solo.push(m);
        } else {
            self.premade.push(m);
        }
    }

    pub fn matches(&self) -> impl Iterator<Item = &PlayerMatch> {
        self.solo.iter().chain(self.premade.iter())
    }

    pub fn known_ids(&self) -> HashSet<String> {
        self.matches().map(|m| m.id.clone()).collect()
    }

    /// Moves every solo match whose roster contains a confirmed premade into
    /// the premade collection. Returns the number of matches moved.
    pub fn reclassify(&mut self) -> usize {
        let tracker = self.premades.get_mut();
        let puuid = self.puuid.as_str();

        let (grouped, solo): (Vec<_>, Vec<_>) = std::mem::take(&mut self.solo)
            .into_iter()
            .partition(|m| m.roster.iter().any(|p| p != puuid && tracker.is_confirmed(p)));

        self.solo = solo;
        let moved = grouped.len();
        for mut m in grouped {
            m.mark_premade();
            self.premade.push(m);
        }

        moved
    }

    /// Most recent first in both collections.
    pub fn sort_by_recency(&mut self) {
        self.solo.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.premade.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    pub fn clear_rosters(&mut self) {
        self.solo.iter_mut().for_each(|m| m.roster.clear());
    }
}

#[cfg(test)]
mod tests {
    use super::Player;
    use crate::utils::test_utils::generate_player_match;

    #[test]
    fn test_push_by_kind() {
        let player = Player::with_matches(
            "me",
            0.0,
            vec![
                generate_player_match("1", 100, true, true, Some(7)),
                generate_player_match("2", 200, false, false, Some(8)),
            ]
        );

        assert_eq!(player.solo.len(), 1);
        assert_eq!(player.premade.len(), 1);
        assert!(player.known_ids().contains("2"));
    }

    #[test]
    fn test_cold_start() {
        assert!(Player::new("me", 0.0).is_cold_start());
        assert!(Player::new("me", 0.49).is_cold_start());
        assert!(!Player::new("me", 7.3).is_cold_start());
    }

    #[test]
    fn test_reclassify_moves_confirmed_rosters() {
        let mut first = generate_player_match("1", 100, true, true, Some(7));
        first.roster = vec!["mate".to_string(), "other".to_string()];
        let mut second = generate_player_match("2", 200, true, false, Some(8));
        second.roster = vec!["stranger".to_string()];

        let mut player = Player::with_matches("me", 0.0, vec![first, second]);
        {
            let tracker = player.premades.get_mut();
            tracker.observe("mate");
            tracker.observe("mate");
            tracker.observe("stranger");
        }

        assert_eq!(player.reclassify(), 1);
        assert_eq!(player.solo.len(), 1);
        assert_eq!(player.premade.len(), 1);

        let moved = &player.premade[0];
        assert_eq!(moved.id, "1");
        assert!(!moved.is_solo());
        assert!(moved.roster.is_empty());
        assert_eq!(moved.value(), Some(7));
    }

    #[test]
    fn test_reclassify_ignores_self() {
        let mut m = generate_player_match("1", 100, true, true, Some(7));
        m.roster = vec!["me".to_string()];

        let mut player = Player::with_matches("me", 0.0, vec![m]);
        player.premades.get_mut().observe("me");
        player.premades.get_mut().observe("me");

        assert_eq!(player.reclassify(), 0);
    }

    #[test]
    fn test_sort_by_recency() {
        let mut player = Player::with_matches(
            "me",
            0.0,
            vec![
                generate_player_match("old", 100, true, true, Some(7)),
                generate_player_match("new", 300, true, true, Some(7)),
                generate_player_match("mid", 200, true, true, Some(7)),
            ]
        );

        player.sort_by_recency();

        let ids = player.solo.iter().map(|m| m.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }
}
