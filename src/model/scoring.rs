use crate::{
    config::Config,
    model::{
        constants::RECAP_PASS_SEPARATOR,
        structures::{player::Player, player_match::PlayerMatch}
    }
};
use std::collections::BTreeMap;
use strum_macros::Display;
use thiserror::Error;
use tracing::{debug, warn};

/// Normalisation span of the tier-distance formula in the average pass
const TIER_DISTANCE_SPAN: f64 = 13.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Pass {
    #[strum(serialize = "max-solo")]
    MaxSolo,
    #[strum(serialize = "average")]
    Average
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScoringError {
    #[error("No tier qualifies for the {pass} pass")]
    NoQualifyingTier { pass: Pass }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassScore {
    pub score: f64,
    pub recap: String
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    /// `max(max_solo, average)` rounded to one decimal
    pub points_count: f64,
    /// Max-solo recap, `FF`, average recap
    pub recap: String,
    pub max_solo: PassScore,
    pub average: PassScore
}

/// Matches of one pass bucketed by point value, ascending.
struct Sample<'m> {
    buckets: BTreeMap<i32, Vec<&'m PlayerMatch>>,
    scaling_per_solo: f64
}

/// Dampens tiers of the average pass that sit far from the max-solo score.
#[derive(Debug, Clone, Copy)]
struct TierDistance {
    center: f64,
    power: f64,
    factor: f64,
    direction: f64
}

impl TierDistance {
    fn dis_tier(&self, tier: i32) -> f64 {
        let delta = self.center - tier as f64;
        1.0 + self.factor * (delta.abs() + delta * self.direction).powf(self.power)
    }
}

/// Tiered, winrate- and volume-weighted aggregation of a player's matches.
pub struct ScoringEngine<'a> {
    config: &'a Config
}

impl<'a> ScoringEngine<'a> {
    pub fn new(config: &'a Config) -> Self {
        ScoringEngine { config }
    }

    /// Scores a player whose collections are sorted most recent first.
    pub fn score(&self, player: &Player) -> Result<ScoreResult, ScoringError> {
        let max_solo_sample = self.sample(player, Pass::MaxSolo);
        let average_sample = self.sample(player, Pass::Average);

        let max_solo = self.pass_score(Pass::MaxSolo, &max_solo_sample, None)?;

        let c = self.config;
        let sps_max = max_solo_sample.scaling_per_solo;
        let sps_avg = average_sample.scaling_per_solo;
        let power = c.power_distier_min + c.flat_distier_power * (sps_max - sps_avg);
        let distance = TierDistance {
            center: max_solo.score,
            power,
            factor: (c.scaling_distier_min + c.flat_distier_scaling * (sps_max - 2.0))
                / (TIER_DISTANCE_SPAN - TIER_DISTANCE_SPAN * c.scaling_distier_dir).powf(power),
            direction: c.scaling_distier_dir
        };
        let average = self.pass_score(Pass::Average, &average_sample, Some(&distance))?;

        let points_count = (max_solo.score.max(average.score) * 10.0).round() / 10.0;
        let recap = format!("{}{}{}", max_solo.recap, RECAP_PASS_SEPARATOR, average.recap);

        debug!(
            max_solo = max_solo.score,
            average = average.score,
            points_count,
            "Scored player {}",
            player.puuid
        );

        Ok(ScoreResult {
            points_count,
            recap,
            max_solo,
            average
        })
    }

    fn sample<'m>(&self, player: &'m Player, pass: Pass) -> Sample<'m> {
        let target = self.config.games_min_total;
        let solo_available = player.solo.len();

        let (solo_count, per_solo) = match pass {
            Pass::MaxSolo => {
                let solo_count = solo_available.min(target);
                (solo_count, solo_count as f64 / target as f64)
            }
            Pass::Average => {
                let floor = self.config.games_min_solo as f64 / target as f64;
                let actual = if player.total() == 0 {
                    0.0
                } else {
                    solo_available as f64 / player.total() as f64
                };
                let per_solo = actual.max(floor);
                ((per_solo * target as f64).round_ties_even() as usize, per_solo)
            }
        };
        let premade_count = target.saturating_sub(solo_count);

        let mut buckets: BTreeMap<i32, Vec<&PlayerMatch>> = BTreeMap::new();
        for m in player.solo.iter().take(solo_count).chain(player.premade.iter().take(premade_count)) {
            match m.value() {
                Some(value) => buckets.entry(value).or_default().push(m),
                None => warn!("Match {} has no point value for its outcome, skipped", m.id)
            }
        }

        Sample {
            buckets,
            scaling_per_solo: self.config.scaling_per_solo_min + self.config.flat_per_solo_scaling * (3.0 * per_solo - 1.0)
        }
    }

    fn pass_score(
        &self,
        pass: Pass,
        sample: &Sample<'_>,
        distance: Option<&TierDistance>
    ) -> Result<PassScore, ScoringError> {
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        let mut recap = String::new();

        for (&tier, matches) in &sample.buckets {
            if matches.len() < self.config.games_min_tier {
                continue;
            }

            let dis_tier = distance.map_or(1.0, |d| d.dis_tier(tier));
            let (weight, tier_recap) = self.tier_weight(tier, matches, sample.scaling_per_solo, dis_tier);

            numerator += tier as f64 * weight;
            denominator += weight;
            recap.push_str(&tier_recap);
        }

        let score = numerator / denominator;
        if !(denominator > 0.0) || !score.is_finite() {
            return Err(ScoringError::NoQualifyingTier { pass });
        }

        Ok(PassScore { score, recap })
    }

    /// Weight of one tier and its recap fragment
    /// (`tier, solo, premade, solo wins, premade wins` as two hex digits each).
    pub fn tier_weight(&self, tier: i32, matches: &[&PlayerMatch], scaling_per_solo: f64, dis_tier: f64) -> (f64, String) {
        let c = self.config;
        let n = matches.len();
        let volume = (c.scaling_log * n as f64 + c.flat_log).ln().powf(c.power_log);

        let solo_games = matches.iter().filter(|m| m.is_solo()).count();
        let premade_games = n - solo_games;
        let solo_wins = matches.iter().filter(|m| m.is_solo() && m.is_win()).count();
        let premade_wins = matches.iter().filter(|m| !m.is_solo() && m.is_win()).count();

        let tier_per_solo = solo_games as f64 / n as f64;
        let solo_winrate = winrate(solo_wins, solo_games);
        let premade_winrate = winrate(premade_wins, premade_games);

        let balance = 1.0 - 2.0 * (tier_per_solo - 0.5).abs();
        let premade_pond = f64::max(
            1.0 - c.scaling_pond_max * balance,
            1.0 - (solo_winrate - premade_winrate).abs() * c.scaling_pond_max / c.threshold_pond_max * balance
        );
        let solo_pond = 1.0 + (1.0 - premade_pond) / scaling_per_solo;

        let solo_term = tier_per_solo
            * scaling_per_solo
            * solo_pond
            * shortfall_factor(solo_winrate).powf(c.power_delta_winrate);
        let premade_term = (1.0 - tier_per_solo) * premade_pond * shortfall_factor(premade_winrate).powf(c.power_delta_winrate);

        let winrate_factor = (1.0 + (c.scaling_winrate / dis_tier) * (solo_term + premade_term))
            .powf(1.0 + c.scaling_tier_power * tier as f64)
            - 1.0;

        let recap = format!(
            "{:02X}{:02X}{:02X}{:02X}{:02X}",
            tier, solo_games, premade_games, solo_wins, premade_wins
        );

        (volume * winrate_factor, recap)
    }
}

fn winrate(wins: usize, games: usize) -> f64 {
    if wins == 0 {
        return 0.0;
    }

    wins as f64 / games as f64
}

/// Penalty applied to a winrate under 50%.
fn shortfall_factor(winrate: f64) -> f64 {
    if winrate >= 0.5 {
        1.0
    } else {
        1.0 + 2.0 * (winrate - 0.5)
    }
}
