use super::tier::{Division, Tier};
use crate::api::api_structs::LeagueEntryDTO;
use std::str::FromStr;

/// One league points is worth 1/200 of a strength unit.
const LEAGUE_POINTS_SCALE: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankRecord {
    pub tier: Tier,
    /// Always `None` for apex tiers
    pub division: Option<Division>,
    pub league_points: u32
}

impl RankRecord {
    pub fn new(tier: Tier, division: Option<Division>, league_points: u32) -> RankRecord {
        RankRecord {
            tier,
            division: if tier.is_apex() { None } else { division },
            league_points
        }
    }

    /// Converts the rank into a real-valued strength.
    ///
    /// Apex tiers: `14.5 + lp / 200`.
    /// Divided tiers: `tier base + division offset + lp / 200`. A divided tier
    /// without a known division is treated as its middle (`III`, offset 0).
    pub fn value(&self) -> f64 {
        let lp = self.league_points as f64 / LEAGUE_POINTS_SCALE;
        if self.tier.is_apex() {
            return self.tier.base_value() + lp;
        }

        let offset = self.division.map_or(0.0, Division::offset);
        self.tier.base_value() + offset + lp
    }

    /// Parses a profile-page label such as `"Gold 2"` or `"Master"`.
    pub fn from_label(label: &str, league_points: u32) -> Option<RankRecord> {
        let mut parts = label.trim().split_whitespace();
        let tier = Tier::from_str(parts.next()?).ok()?;

        let division = match parts.next() {
            Some(raw) => Some(
                raw.parse::<u8>()
                    .ok()
                    .and_then(|n| Division::try_from(n).ok())
                    .or_else(|| Division::from_str(&raw.to_uppercase()).ok())?
            ),
            None => None
        };

        if !tier.is_apex() && division.is_none() {
            return None;
        }

        Some(RankRecord::new(tier, division, league_points))
    }
}

impl TryFrom<&LeagueEntryDTO> for RankRecord {
    type Error = ();

    fn try_from(entry: &LeagueEntryDTO) -> Result<Self, Self::Error> {
        let tier = Tier::from_str(&entry.tier).map_err(|_| ())?;
        let division = match &entry.rank {
            Some(rank) if !tier.is_apex() => Some(Division::from_str(rank).map_err(|_| ())?),
            None if !tier.is_apex() => return Err(()),
            _ => None
        };

        Ok(RankRecord::new(tier, division, entry.league_points))
    }
}
