use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Ranked ladder categories, lowest first.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumString, Display,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger
}

impl Tier {
    /// Master and above have no divisions.
    pub fn is_apex(self) -> bool {
        matches!(self, Tier::Master | Tier::Grandmaster | Tier::Challenger)
    }

    /// Base strength of a divided tier. Apex tiers share a flat base instead.
    pub fn base_value(self) -> f64 {
        match self {
            Tier::Iron => 1.0,
            Tier::Bronze => 3.0,
            Tier::Silver => 5.0,
            Tier::Gold => 7.0,
            Tier::Platinum => 9.0,
            Tier::Emerald => 11.0,
            Tier::Diamond => 13.0,
            Tier::Master | Tier::Grandmaster | Tier::Challenger => 14.5
        }
    }
}

/// Sub-rank inside a divided tier, lowest first.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumString, Display)]
pub enum Division {
    IV,
    III,
    II,
    I
}

impl Division {
    pub fn offset(self) -> f64 {
        match self {
            Division::IV => -0.5,
            Division::III => 0.0,
            Division::II => 0.5,
            Division::I => 1.0
        }
    }
}

impl TryFrom<u8> for Division {
    type Error = ();

    /// Numeric divisions as shown on profile pages ("Gold 2").
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Division::I),
            2 => Ok(Division::II),
            3 => Ok(Division::III),
            4 => Ok(Division::IV),
            _ => Err(())
        }
    }
}
