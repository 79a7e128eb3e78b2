use crate::{
    api::{ApiError, MatchDataSource},
    config::Config,
    database::{
        db_structs::{QueuedPlayer, StoredMatch},
        Storage, StorageError
    },
    model::{
        rank_oracle::RankOracle,
        scoring::{ScoreResult, ScoringEngine, ScoringError},
        structures::{player::Player, player_match::PlayerMatch}
    },
    pipeline::{classify::min_met, IngestionPipeline}
};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("No account found for player {0}")]
    UnknownAccount(String)
}

impl ProcessError {
    /// The remote service is presumed down; the drain loop must stop.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, ProcessError::Api(ApiError::TransportFailure { .. }))
    }
}

/// How one player's run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerOutcome {
    Scored { points_count: f64, recap: String },
    /// Too few matches to score; the previous score stays
    Unscored { solo: usize, total: usize }
}

/// Tally of one pass over the queue.
#[derive(Debug, Default)]
pub struct DrainReport {
    pub scored: usize,
    pub unscored: usize,
    pub failed: usize,
    /// Set when a transport failure stopped the pass
    pub aborted: Option<ApiError>
}

/// Drains the player queue, one player at a time.
pub struct Processor<'a, A, O, S> {
    api: &'a A,
    oracle: &'a O,
    storage: &'a S,
    config: &'a Config
}

impl<'a, A: MatchDataSource, O: RankOracle, S: Storage> Processor<'a, A, O, S> {
    pub fn new(api: &'a A, oracle: &'a O, storage: &'a S, config: &'a Config) -> Self {
        Processor {
            api,
            oracle,
            storage,
            config
        }
    }

    /// Polls the queue forever, pausing between passes.
    pub async fn run_forever(&self) {
        let idle = Duration::from_millis(self.config.pacing.idle_delay_ms);
        loop {
            match self.drain_queue().await {
                Ok(report) => info!(
                    scored = report.scored,
                    unscored = report.unscored,
                    failed = report.failed,
                    aborted = report.aborted.is_some(),
                    "Queue pass complete"
                ),
                Err(e) => error!("Failed to read the player queue: {}", e)
            }

            tokio::time::sleep(idle).await;
        }
    }

    /// Processes every queued player once.
    ///
    /// A transport failure saves the matches gathered for the current player
    /// and ends the pass. Any other failure skips the player.
    pub async fn drain_queue(&self) -> Result<DrainReport, StorageError> {
        let queued = self.storage.queued_players().await?;
        let mut report = DrainReport::default();
        let run_id = Uuid::new_v4();

        info!(%run_id, players = queued.len(), "Draining player queue");

        for entry in &queued {
            match self.process_player(entry).await {
                Ok(PlayerOutcome::Scored { points_count, .. }) => {
                    info!(puuid = %entry.puuid, points_count, "Player scored");
                    report.scored += 1;
                }
                Ok(PlayerOutcome::Unscored { solo, total }) => {
                    info!(
                        puuid = %entry.puuid,
                        solo,
                        min_solo = self.config.games_min_solo,
                        total,
                        min_total = self.config.games_min_total,
                        "Not enough matches to score"
                    );
                    report.unscored += 1;
                }
                Err(ProcessError::Api(e)) => {
                    error!(%run_id, puuid = %entry.puuid, "Remote service unavailable, stopping: {}", e);
                    report.aborted = Some(e);
                    break;
                }
                Err(e) => {
                    warn!(puuid = %entry.puuid, "Skipping player: {}", e);
                    report.failed += 1;
                    continue;
                }
            }

            tokio::time::sleep(Duration::from_millis(self.config.pacing.player_delay_ms)).await;
        }

        Ok(report)
    }

    /// Runs one player end to end and persists the result.
    pub async fn process_player(&self, entry: &QueuedPlayer) -> Result<PlayerOutcome, ProcessError> {
        let stored = self.storage.player_matches(&entry.puuid).await?;
        let mut player = Player::with_matches(
            entry.puuid.clone(),
            entry.points_count,
            stored.into_iter().map(PlayerMatch::from).collect()
        );

        info!(puuid = %entry.puuid, known = player.total(), points_count = player.points_count, "Processing player");

        let pipeline = IngestionPipeline::new(self.api, self.oracle, self.storage, self.config);
        let summary = match pipeline.run(&mut player).await {
            Ok(summary) => summary,
            Err(e) if e.is_transport_failure() => {
                if let Err(save_error) = self.save(&player, None, false).await {
                    error!(puuid = %entry.puuid, "Partial save failed: {}", save_error);
                }
                return Err(e);
            }
            Err(e) => return Err(e)
        };

        info!(
            puuid = %entry.puuid,
            discovered = summary.discovered,
            adopted = summary.adopted,
            fetched = summary.fetched,
            backfilled = summary.backfilled,
            evicted = summary.evicted,
            "Ingestion finished"
        );

        self.finish(&player).await
    }

    async fn finish(&self, player: &Player) -> Result<PlayerOutcome, ProcessError> {
        if !min_met(player, self.config) {
            self.save(player, None, true).await?;
            return Ok(PlayerOutcome::Unscored {
                solo: player.solo.len(),
                total: player.total()
            });
        }

        let score = ScoringEngine::new(self.config).score(player)?;
        self.save(player, Some(&score), true).await?;

        Ok(PlayerOutcome::Scored {
            points_count: score.points_count,
            recap: score.recap
        })
    }

    /// Persists reclassified stored matches and new matches. With `finish`
    /// the player also leaves the queue, taking `score` when there is one.
    async fn save(&self, player: &Player, score: Option<&ScoreResult>, finish: bool) -> Result<(), StorageError> {
        let puuid = player.puuid.as_str();

        let reclassified = player
            .premade
            .iter()
            .filter(|m| !m.is_new)
            .map(|m| m.id.clone())
            .collect::<Vec<_>>();
        self.storage.mark_premade(puuid, &reclassified).await?;

        let new_matches = player
            .matches()
            .filter(|m| m.is_new)
            .map(StoredMatch::from)
            .collect::<Vec<_>>();
        self.storage.save_matches(puuid, &new_matches).await?;
        info!(puuid, saved = new_matches.len(), "Matches saved");

        if finish {
            self.storage
                .finish_player(puuid, score.map(|s| (s.points_count, s.recap.as_str())))
                .await?;
        }

        self.storage.update_current_player("", 0).await
    }
}
