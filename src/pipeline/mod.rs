pub mod classify;

use crate::{
    api::{list_match_ids, ApiError, MatchDataSource},
    config::Config,
    database::{db_structs::SharedMatch, Storage},
    model::{
        constants::SECONDS_PER_MATCH,
        premade::PremadeTracker,
        rank_oracle::RankOracle,
        skill::SkillEstimator,
        structures::{
            outcome::PlayKind,
            player::Player,
            player_match::{MatchPoints, PlayerMatch}
        }
    },
    processor::ProcessError,
    utils::progress_utils::progress_bar
};
use classify::{cold_target_met, evict, min_met, queue_of, window_start, MatchView};
use futures::{stream, Stream, StreamExt};
use indicatif::ProgressBar;
use std::{collections::HashSet, pin::pin, time::Duration};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Counters of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Unknown ids found in the discovery window
    pub discovered: usize,
    pub adopted: usize,
    /// Newly fetched matches that survived classification
    pub fetched: usize,
    pub reclassified: usize,
    pub backfilled: usize,
    pub evicted: usize,
    pub stopped_early: bool
}

/// Brings one player's match sample up to date.
pub struct IngestionPipeline<'a, A, O, S> {
    api: &'a A,
    storage: &'a S,
    config: &'a Config,
    estimator: SkillEstimator<'a, A, O>
}

impl<'a, A: MatchDataSource, O: RankOracle, S: Storage> IngestionPipeline<'a, A, O, S> {
    pub fn new(api: &'a A, oracle: &'a O, storage: &'a S, config: &'a Config) -> Self {
        IngestionPipeline {
            api,
            storage,
            config,
            estimator: SkillEstimator::new(api, oracle, &config.pacing)
        }
    }

    /// Runs discovery, re-verification, adoption, batch processing,
    /// backfill and eviction on `player`.
    ///
    /// On error `player` keeps every match completed so far, so the caller
    /// can persist them.
    pub async fn run(&self, player: &mut Player) -> Result<RunSummary, ProcessError> {
        let mut summary = RunSummary::default();
        let display_name = self
            .api
            .account_by_puuid(&player.puuid)
            .await?
            .and_then(|account| account.display_name())
            .ok_or_else(|| ProcessError::UnknownAccount(player.puuid.clone()))?;

        let start = window_start(player, self.config);
        let known = player.known_ids();
        let mut ids = list_match_ids(
            self.api,
            &player.puuid,
            Some(start),
            Some(self.config.max_date),
            &self.config.pacing
        )
        .await?;
        ids.retain(|id| !known.contains(id));
        summary.discovered = ids.len();

        info!(
            player = %display_name,
            window_start = start,
            known = known.len(),
            discovered = ids.len(),
            "Discovered matches"
        );

        let duration = (ids.len() as f64 * SECONDS_PER_MATCH).round_ties_even() as i32;
        self.storage.update_current_player(&display_name, duration).await?;

        let progress = progress_bar(ids.len() as u64, format!("Matches of {}", display_name));
        // Ids fetched in this run, never fetched again by backfill
        let mut tried = HashSet::new();

        if !ids.is_empty() || !min_met(player, self.config) {
            summary.reclassified += self.reverify(player).await?;

            let (adopted, reclassified) = self.adopt(player, &mut ids).await?;
            summary.adopted = adopted;
            summary.reclassified += reclassified;
            progress.inc(adopted as u64);

            for batch in ids.chunks(self.config.pacing.batch_size) {
                tried.extend(batch.iter().cloned());
                summary.fetched += self.process_batch(player, batch, &progress).await?;
                summary.reclassified += player.reclassify();

                let stop = player.is_cold_start() && cold_target_met(player, self.config);
                tokio::time::sleep(Duration::from_millis(self.config.pacing.batch_delay_ms)).await;
                if stop {
                    info!(solo = player.solo.len(), total = player.total(), "Cold start target reached");
                    summary.stopped_early = true;
                    break;
                }
            }
        }

        summary.backfilled = self.backfill(player, tried, &progress).await?;
        summary.evicted = evict(player, self.config);
        player.sort_by_recency();
        player.clear_rosters();
        progress.finish_and_clear();

        info!(
            player = %display_name,
            solo = player.solo.len(),
            premade = player.premade.len(),
            "Matches up to date"
        );
        debug!(?summary, "Ingestion summary");

        Ok(summary)
    }

    /// Feeds every stored match back through the premade tracker and picks
    /// up the rosters of stored solo matches outside ranked solo/duo.
    async fn reverify(&self, player: &mut Player) -> Result<usize, ProcessError> {
        let targets = player
            .matches()
            .map(|m| (m.id.clone(), m.is_solo() && !m.solo_queue))
            .collect::<Vec<_>>();
        if targets.is_empty() {
            return Ok(0);
        }

        let puuid = player.puuid.as_str();
        let tracker = &player.premades;
        let delay = Duration::from_millis(self.config.pacing.reverify_launch_delay_ms);
        let results = staggered(targets.iter(), move || delay)
            .map(|(id, verify)| self.reverify_one(puuid, tracker, id, *verify))
            .buffer_unordered(self.config.pacing.max_concurrent_fetches);
        let (rosters, failure) = collect_until_failure(results).await;

        for (id, roster) in rosters {
            if let Some(m) = player.solo.iter_mut().find(|m| m.id == id) {
                m.roster = roster;
            }
        }
        if let Some(e) = failure {
            return Err(e.into());
        }

        let moved = player.reclassify();
        info!(stored = targets.len(), reclassified = moved, "Re-verified stored matches");

        Ok(moved)
    }

    async fn reverify_one(
        &self,
        puuid: &str,
        tracker: &Mutex<PremadeTracker>,
        id: &str,
        verify: bool
    ) -> Result<Option<(String, Vec<String>)>, ApiError> {
        let Some(dto) = self.api.match_detail(id).await? else {
            warn!(match_id = id, "Stored match has no detail");
            return Ok(None);
        };
        let Some(view) = MatchView::of(&dto, puuid) else {
            warn!(match_id = id, "Player missing from stored match");
            return Ok(None);
        };

        observe(tracker, id, &view.others).await;
        Ok(verify.then(|| (id.to_string(), view.others)))
    }

    /// Takes over discovered matches another player already valued from
    /// this player's side. Adopted ids leave `ids`. Returns the number
    /// adopted and the number of matches reclassified afterwards.
    async fn adopt(&self, player: &mut Player, ids: &mut Vec<String>) -> Result<(usize, usize), ProcessError> {
        if ids.is_empty() {
            return Ok((0, 0));
        }

        let shared = self.storage.shared_matches(ids).await?;
        if shared.is_empty() {
            return Ok((0, 0));
        }

        let puuid = player.puuid.as_str();
        let tracker = &player.premades;
        let delay = Duration::from_millis(self.config.pacing.reverify_launch_delay_ms);
        let results = staggered(shared.iter(), move || delay)
            .map(|stored| self.adopt_one(puuid, tracker, stored))
            .buffer_unordered(self.config.pacing.max_concurrent_fetches);
        let (adopted, failure) = collect_until_failure(results).await;

        let count = adopted.len();
        let adopted_ids = adopted.iter().map(|m| m.id.clone()).collect::<HashSet<_>>();
        ids.retain(|id| !adopted_ids.contains(id));
        for m in adopted {
            player.push(m);
        }
        if let Some(e) = failure {
            return Err(e.into());
        }

        let moved = player.reclassify();
        info!(known_elsewhere = shared.len(), adopted = count, "Adopted shared matches");

        Ok((count, moved))
    }

    async fn adopt_one(
        &self,
        puuid: &str,
        tracker: &Mutex<PremadeTracker>,
        stored: &SharedMatch
    ) -> Result<Option<PlayerMatch>, ApiError> {
        let id = stored.match_id.as_str();
        let Some(dto) = self.api.match_detail(id).await? else {
            return Ok(None);
        };
        let Some(view) = MatchView::of(&dto, puuid) else {
            return Ok(None);
        };

        let points = stored.points();
        if points.for_outcome(view.outcome).is_none() {
            debug!(match_id = id, "Shared match not valued for this side");
            return Ok(None);
        }

        observe(tracker, id, &view.others).await;

        Ok(Some(PlayerMatch {
            id: stored.match_id.clone(),
            created_at: stored.created_at,
            solo_queue: stored.solo_queue,
            kind: PlayKind::Solo,
            outcome: view.outcome,
            points,
            roster: if stored.solo_queue { Vec::new() } else { view.others },
            is_new: true
        }))
    }

    /// Fetches and classifies `batch` with bounded concurrency and jittered
    /// launches. Survivors are added to `player`, even when a transport
    /// failure ends the batch early. Returns the number kept.
    async fn process_batch(&self, player: &mut Player, batch: &[String], progress: &ProgressBar) -> Result<usize, ProcessError> {
        let puuid = player.puuid.as_str();
        let tracker = &player.premades;
        let pacing = &self.config.pacing;
        let results = staggered(batch.iter(), || pacing.launch_jitter())
            .map(|id| async move {
                let result = self.process_new(puuid, tracker, id).await;
                progress.inc(1);
                result
            })
            .buffer_unordered(pacing.max_concurrent_fetches);
        let (kept, failure) = collect_until_failure(results).await;

        let count = kept.len();
        for m in kept {
            player.push(m);
        }
        if let Some(e) = failure {
            warn!(kept = count, "Batch aborted by transport failure");
            return Err(e.into());
        }

        debug!(size = batch.len(), kept = count, "Processed batch");
        Ok(count)
    }

    async fn process_new(
        &self,
        puuid: &str,
        tracker: &Mutex<PremadeTracker>,
        id: &str
    ) -> Result<Option<PlayerMatch>, ApiError> {
        let Some(dto) = self.api.match_detail(id).await? else {
            debug!(match_id = id, "Match detail absent");
            return Ok(None);
        };
        let Some(queue) = queue_of(&dto) else {
            debug!(match_id = id, queue = dto.info.queue_id, "Discarding unrecognized queue");
            return Ok(None);
        };
        let Some(view) = MatchView::of(&dto, puuid) else {
            warn!(match_id = id, "Player missing from match");
            return Ok(None);
        };

        observe(tracker, id, &view.others).await;

        let Some(mean) = self.estimator.match_value(&view.enemies).await? else {
            debug!(match_id = id, "Discarding match without enough valued opponents");
            return Ok(None);
        };

        let mut points = MatchPoints::default();
        points.set(view.outcome, mean.round() as i32);

        Ok(Some(PlayerMatch {
            id: id.to_string(),
            created_at: dto.info.game_creation.div_euclid(1000),
            solo_queue: queue.is_solo_duo(),
            kind: PlayKind::Solo,
            outcome: view.outcome,
            points,
            roster: if queue.is_solo_duo() { Vec::new() } else { view.others },
            is_new: true
        }))
    }

    /// Reaches into matches from `max_date` on, oldest first and one at a
    /// time, until the minimum sample is met or no untried id remains.
    /// `attempted` holds the ids already fetched in this run.
    async fn backfill(
        &self,
        player: &mut Player,
        mut attempted: HashSet<String>,
        progress: &ProgressBar
    ) -> Result<usize, ProcessError> {
        let mut added = 0;

        while !min_met(player, self.config) {
            let known = player.known_ids();
            let mut ids = list_match_ids(self.api, &player.puuid, Some(self.config.max_date), None, &self.config.pacing).await?;
            ids.retain(|id| !known.contains(id) && !attempted.contains(id));
            if ids.is_empty() {
                break;
            }

            ids.reverse();
            info!(
                solo = player.solo.len(),
                total = player.total(),
                candidates = ids.len(),
                "Backfilling below minimum sample"
            );
            progress.inc_length(ids.len() as u64);

            for id in ids {
                let batch = std::slice::from_ref(&id);
                added += self.process_batch(player, batch, progress).await?;
                attempted.insert(id);
                player.reclassify();

                if min_met(player, self.config) {
                    break;
                }
            }
        }

        Ok(added)
    }
}

async fn observe(tracker: &Mutex<PremadeTracker>, match_id: &str, participants: &[String]) {
    if !tracker.lock().await.observe_match(match_id, participants) {
        debug!(match_id, "Participants already observed");
    }
}

/// Yields `items` one by one, waiting `delay()` before every item but the
/// first. Placed ahead of `buffer_unordered`, this spreads task launches.
fn staggered<I, F>(items: I, delay: F) -> impl Stream<Item = I::Item>
where
    I: IntoIterator,
    F: Fn() -> Duration
{
    stream::iter(items.into_iter().enumerate()).then(move |(i, item)| {
        let wait = if i == 0 { Duration::ZERO } else { delay() };
        async move {
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
            item
        }
    })
}

/// Drains `results` until the first error. Returns everything completed
/// before it; dropping the stream cancels the fetches still in flight.
async fn collect_until_failure<St, T, E>(results: St) -> (Vec<T>, Option<E>)
where
    St: Stream<Item = Result<Option<T>, E>>
{
    let mut results = pin!(results);
    let mut completed = Vec::new();

    while let Some(result) = results.next().await {
        match result {
            Ok(Some(item)) => completed.push(item),
            Ok(None) => {}
            Err(e) => return (completed, Some(e))
        }
    }

    (completed, None)
}
