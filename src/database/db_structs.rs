use crate::model::structures::{
    outcome::{Outcome, PlayKind},
    player_match::{MatchPoints, PlayerMatch}
};
use serde::Serialize;

/// A player waiting for a score update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedPlayer {
    pub puuid: String,
    pub points_count: f64
}

/// A match as stored for one player (`algo_games` joined with
/// `algo_players_games`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMatch {
    pub match_id: String,
    pub created_at: i64,
    pub solo_queue: bool,
    pub win_points: Option<i32>,
    pub lose_points: Option<i32>,
    pub is_solo: bool,
    pub is_win: bool
}

/// A match as known globally, independent of any player (`algo_games`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedMatch {
    pub match_id: String,
    pub created_at: i64,
    pub solo_queue: bool,
    pub win_points: Option<i32>,
    pub lose_points: Option<i32>
}

impl SharedMatch {
    pub fn points(&self) -> MatchPoints {
        MatchPoints {
            win: self.win_points,
            lose: self.lose_points
        }
    }
}

impl From<StoredMatch> for PlayerMatch {
    fn from(row: StoredMatch) -> Self {
        PlayerMatch {
            id: row.match_id,
            created_at: row.created_at,
            solo_queue: row.solo_queue,
            kind: PlayKind::from_solo(row.is_solo),
            outcome: Outcome::from_win(row.is_win),
            points: MatchPoints {
                win: row.win_points,
                lose: row.lose_points
            },
            roster: Vec::new(),
            is_new: false
        }
    }
}

impl From<&PlayerMatch> for StoredMatch {
    fn from(m: &PlayerMatch) -> Self {
        StoredMatch {
            match_id: m.id.clone(),
            created_at: m.created_at,
            solo_queue: m.solo_queue,
            win_points: m.points.win,
            lose_points: m.points.lose,
            is_solo: m.is_solo(),
            is_win: m.is_win()
        }
    }
}

impl From<&StoredMatch> for SharedMatch {
    fn from(m: &StoredMatch) -> Self {
        SharedMatch {
            match_id: m.match_id.clone(),
            created_at: m.created_at,
            solo_queue: m.solo_queue,
            win_points: m.win_points,
            lose_points: m.lose_points
        }
    }
}
