use super::outcome::{Outcome, PlayKind};

/// Point values of a match. A match is valued from the side of whichever
/// player computed it, so the same shared match can carry both fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchPoints {
    pub win: Option<i32>,
    pub lose: Option<i32>
}

impl MatchPoints {
    pub fn for_outcome(&self, outcome: Outcome) -> Option<i32> {
        match outcome {
            Outcome::Win => self.win,
            Outcome::Lose => self.lose
        }
    }

    pub fn set(&mut self, outcome: Outcome, value: i32) {
        match outcome {
            Outcome::Win => self.win = Some(value),
            Outcome::Lose => self.lose = Some(value)
        }
    }
}

/// A match seen from one player's side.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMatch {
    pub id: String,
    /// Creation time, unix seconds
    pub created_at: i64,
    pub solo_queue: bool,
    pub kind: PlayKind,
    pub outcome: Outcome,
    pub points: MatchPoints,
    /// Other participants. Only kept while the match is solo and still
    /// awaiting premade verification.
    pub roster: Vec<String>,
    /// Fetched during this run, not yet persisted for this player
    pub is_new: bool
}

impl PlayerMatch {
    pub fn is_solo(&self) -> bool {
        self.kind == PlayKind::Solo
    }

    pub fn is_win(&self) -> bool {
        self.outcome.is_win()
    }

    /// The point value relevant to this player's outcome.
    pub fn value(&self) -> Option<i32> {
        self.points.for_outcome(self.outcome)
    }

    pub fn mark_premade(&mut self) {
        self.kind = PlayKind::Premade;
        self.roster.clear();
    }
}
