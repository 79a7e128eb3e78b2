use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win,
    Lose
}

impl Outcome {
    pub fn from_win(win: bool) -> Outcome {
        if win {
            Outcome::Win
        } else {
            Outcome::Lose
        }
    }

    pub fn is_win(self) -> bool {
        self == Outcome::Win
    }
}

/// Solo or grouped play, from the point of view of one player.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayKind {
    Solo,
    Premade
}

impl PlayKind {
    pub fn from_solo(solo: bool) -> PlayKind {
        if solo {
            PlayKind::Solo
        } else {
            PlayKind::Premade
        }
    }
}
