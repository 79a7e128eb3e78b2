use crate::{
    api::{ApiError, MatchDataSource},
    config::PacingConfig,
    model::{
        constants::{MIN_OPPONENT_SAMPLES, RANKED_SOLO_QUEUE_TYPE},
        rank_oracle::RankOracle,
        structures::rank_record::RankRecord
    }
};
use futures::{stream, StreamExt, TryStreamExt};
use std::time::Duration;
use tracing::debug;

/// Estimates opponent strength from live ranks, falling back to a
/// historical oracle.
pub struct SkillEstimator<'a, A, O> {
    api: &'a A,
    oracle: &'a O,
    launch_delay: Duration
}

impl<'a, A: MatchDataSource, O: RankOracle> SkillEstimator<'a, A, O> {
    pub fn new(api: &'a A, oracle: &'a O, pacing: &PacingConfig) -> Self {
        SkillEstimator {
            api,
            oracle,
            launch_delay: Duration::from_millis(pacing.opponent_launch_delay_ms)
        }
    }

    /// Strength of one participant, `None` when no rank can be found.
    /// Transport failures propagate.
    pub async fn opponent_value(&self, puuid: &str) -> Result<Option<f64>, ApiError> {
        if let Some(record) = self.live_rank(puuid).await? {
            return Ok(Some(record.value()));
        }

        let Some(name) = self.api.account_by_puuid(puuid).await?.and_then(|a| a.display_name()) else {
            return Ok(None);
        };

        let previous = self.oracle.previous_rank(&name).await?;
        Ok(previous.map(|record| record.value()))
    }

    async fn live_rank(&self, puuid: &str) -> Result<Option<RankRecord>, ApiError> {
        let Some(summoner) = self.api.summoner_by_puuid(puuid).await? else {
            return Ok(None);
        };

        let entries = self.api.league_entries(&summoner.id).await?;
        Ok(entries
            .iter()
            .find(|e| e.queue_type == RANKED_SOLO_QUEUE_TYPE)
            .and_then(|e| RankRecord::try_from(e).ok()))
    }

    /// Mean strength of the opposing team, or `None` when fewer than three
    /// opponents could be valued.
    pub async fn match_value(&self, enemies: &[String]) -> Result<Option<f64>, ApiError> {
        let delay = self.launch_delay;
        let values: Vec<Option<f64>> = stream::iter(enemies.iter().enumerate())
            .then(|(i, puuid)| async move {
                if i > 0 {
                    tokio::time::sleep(delay).await;
                }
                puuid
            })
            .map(|puuid| self.opponent_value(puuid))
            .buffer_unordered(enemies.len().max(1))
            .try_collect()
            .await?;

        let valid = values.into_iter().flatten().collect::<Vec<_>>();
        if valid.len() < MIN_OPPONENT_SAMPLES {
            debug!(valid = valid.len(), "Not enough valued opponents");
            return Ok(None);
        }

        Ok(Some(valid.iter().sum::<f64>() / valid.len() as f64))
    }
}
