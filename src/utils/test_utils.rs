use crate::{
    api::{
        api_structs::{AccountDTO, InfoDTO, LeagueEntryDTO, MatchDTO, MetadataDTO, ParticipantDTO, SummonerDTO},
        ApiError, MatchDataSource, MatchIdQuery
    },
    config::{Config, PacingConfig, RetryPolicy},
    database::{
        db_structs::{QueuedPlayer, SharedMatch, StoredMatch},
        Storage, StorageError
    },
    model::{
        constants::RANKED_SOLO_QUEUE_TYPE,
        rank_oracle::RankOracle,
        structures::{
            outcome::{Outcome, PlayKind},
            player_match::{MatchPoints, PlayerMatch},
            rank_record::RankRecord
        }
    }
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, MutexGuard
    }
};

pub fn generate_player_match(id: &str, created_at: i64, solo: bool, win: bool, value: Option<i32>) -> PlayerMatch {
    let outcome = Outcome::from_win(win);
    let mut points = MatchPoints::default();
    if let Some(value) = value {
        points.set(outcome, value);
    }

    PlayerMatch {
        id: id.to_string(),
        created_at,
        solo_queue: true,
        kind: PlayKind::from_solo(solo),
        outcome,
        points,
        roster: Vec::new(),
        is_new: false
    }
}

/// `count` matches with values in `tiers`, a seeded 60/40 solo split and
/// random outcomes, most recent first.
pub fn random_player_matches(count: usize, tiers: std::ops::Range<i32>, seed: u64) -> Vec<PlayerMatch> {
    // Initialize seeded RNG for reproducible results
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    (0..count)
        .map(|i| {
            let solo = rng.random_bool(0.6);
            let win = rng.random_bool(0.5);
            let value = rng.random_range(tiers.clone());
            generate_player_match(&format!("EUW1_{}", i), 1_000_000 - i as i64, solo, win, Some(value))
        })
        .collect()
}

/// A match detail in which `player` and `allies` share a team against
/// `enemies`. `created_at` is in unix seconds.
pub fn generate_match(
    id: &str,
    created_at: i64,
    queue_id: i32,
    player: &str,
    allies: &[String],
    enemies: &[String],
    win: bool
) -> MatchDTO {
    let mut participants = Vec::new();
    let mut results = Vec::new();
    for p in std::iter::once(player.to_string()).chain(allies.iter().cloned()) {
        participants.push(p);
        results.push(ParticipantDTO { win });
    }
    for p in enemies {
        participants.push(p.clone());
        results.push(ParticipantDTO { win: !win });
    }

    MatchDTO {
        metadata: MetadataDTO {
            match_id: id.to_string(),
            participants
        },
        info: InfoDTO {
            game_creation: created_at * 1000,
            queue_id,
            participants: results
        }
    }
}

/// Tunables with a 20 solo / 40 total / 50 max sample and no pacing.
pub fn test_config() -> Config {
    Config {
        min_date: 1_000,
        max_date: 1_000_000,
        games_min_solo: 20,
        games_min_total: 40,
        games_max_total: 50,
        games_min_tier: 2,
        scaling_log: 1.0,
        flat_log: 2.0,
        power_log: 1.0,
        scaling_pond_max: 0.5,
        threshold_pond_max: 0.2,
        scaling_per_solo_min: 1.0,
        flat_per_solo_scaling: 0.5,
        scaling_winrate: 1.0,
        power_delta_winrate: 1.0,
        scaling_tier_power: 0.05,
        power_distier_min: 1.0,
        flat_distier_power: 0.5,
        scaling_distier_min: 1.0,
        flat_distier_scaling: 0.5,
        scaling_distier_dir: 0.5,
        pacing: PacingConfig::immediate(),
        retry: RetryPolicy::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner()
    }
}

fn mock_failure(url: String) -> ApiError {
    ApiError::TransportFailure {
        url,
        last_status: Some(429),
        attempts: 5
    }
}

/// In-memory remote service. Listings are answered newest first, filtered
/// by an inclusive time window and paged like the real endpoint.
#[derive(Default)]
pub struct MockApi {
    accounts: HashMap<String, AccountDTO>,
    summoners: HashMap<String, SummonerDTO>,
    leagues: HashMap<String, Vec<LeagueEntryDTO>>,
    listings: HashMap<String, Vec<(String, i64)>>,
    matches: HashMap<String, MatchDTO>,
    failing_players: HashSet<String>,
    failing_matches: HashSet<String>,
    page_calls: AtomicUsize,
    detail_calls: AtomicUsize
}

impl MockApi {
    pub fn add_account(&mut self, puuid: &str, display_name: &str) {
        let (name, tag) = display_name.split_once('#').unwrap_or((display_name, "EUW"));
        self.accounts.insert(
            puuid.to_string(),
            AccountDTO {
                puuid: puuid.to_string(),
                game_name: Some(name.to_string()),
                tag_line: Some(tag.to_string())
            }
        );
    }

    /// A participant with a live ranked solo entry.
    pub fn add_ranked(&mut self, puuid: &str, record: RankRecord) {
        let summoner_id = self.add_summoner(puuid);
        self.leagues.insert(
            summoner_id,
            vec![LeagueEntryDTO {
                queue_type: RANKED_SOLO_QUEUE_TYPE.to_string(),
                tier: record.tier.to_string(),
                rank: record.division.map(|d| d.to_string()),
                league_points: record.league_points
            }]
        );
    }

    /// A participant ranked only in flex, known by `display_name`.
    pub fn add_flex_only(&mut self, puuid: &str, display_name: &str) {
        let summoner_id = self.add_summoner(puuid);
        self.leagues.insert(
            summoner_id,
            vec![LeagueEntryDTO {
                queue_type: "RANKED_FLEX_SR".to_string(),
                tier: "GOLD".to_string(),
                rank: Some("I".to_string()),
                league_points: 10
            }]
        );
        self.add_account(puuid, display_name);
    }

    fn add_summoner(&mut self, puuid: &str) -> String {
        let summoner_id = format!("summoner-{}", puuid);
        self.summoners.insert(
            puuid.to_string(),
            SummonerDTO {
                id: summoner_id.clone(),
                puuid: puuid.to_string()
            }
        );

        summoner_id
    }

    /// Every lookup about `puuid` exhausts its retries.
    pub fn fail_player(&mut self, puuid: &str) {
        self.failing_players.insert(puuid.to_string());
    }

    /// The detail of `match_id` exhausts its retries.
    pub fn fail_match(&mut self, match_id: &str) {
        self.failing_matches.insert(match_id.to_string());
    }

    /// Lists `match_id` for `puuid` without a detail record.
    pub fn list_match(&mut self, puuid: &str, match_id: &str, created_at: i64) {
        self.listings
            .entry(puuid.to_string())
            .or_default()
            .push((match_id.to_string(), created_at));
    }

    /// Stores the detail and lists the match for `owner`.
    pub fn add_match(&mut self, owner: &str, dto: MatchDTO) {
        let created_at = dto.info.game_creation / 1000;
        self.list_match(owner, &dto.metadata.match_id, created_at);
        self.matches.insert(dto.metadata.match_id.clone(), dto);
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    fn check_player(&self, puuid: &str) -> Result<(), ApiError> {
        if self.failing_players.contains(puuid) {
            return Err(mock_failure(format!("mock://players/{}", puuid)));
        }

        Ok(())
    }
}

impl MatchDataSource for MockApi {
    async fn account_by_puuid(&self, puuid: &str) -> Result<Option<AccountDTO>, ApiError> {
        self.check_player(puuid)?;
        Ok(self.accounts.get(puuid).cloned())
    }

    async fn summoner_by_puuid(&self, puuid: &str) -> Result<Option<SummonerDTO>, ApiError> {
        self.check_player(puuid)?;
        Ok(self.summoners.get(puuid).cloned())
    }

    async fn league_entries(&self, summoner_id: &str) -> Result<Vec<LeagueEntryDTO>, ApiError> {
        Ok(self.leagues.get(summoner_id).cloned().unwrap_or_default())
    }

    async fn match_ids(&self, puuid: &str, query: &MatchIdQuery) -> Result<Vec<String>, ApiError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);

        let mut listed = self
            .listings
            .get(puuid)
            .map(|l| {
                l.iter()
                    .filter(|(_, t)| query.start_time.map_or(true, |start| *t >= start))
                    .filter(|(_, t)| query.end_time.map_or(true, |end| *t <= end))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        listed.sort_by(|a, b| b.1.cmp(&a.1));

        let count = if query.count == 0 { 20 } else { query.count as usize };
        Ok(listed
            .into_iter()
            .skip(query.start as usize)
            .take(count)
            .map(|(id, _)| id)
            .collect())
    }

    async fn match_detail(&self, match_id: &str) -> Result<Option<MatchDTO>, ApiError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_matches.contains(match_id) {
            return Err(mock_failure(format!("mock://matches/{}", match_id)));
        }

        Ok(self.matches.get(match_id).cloned())
    }
}

/// Historical ranks keyed by display name.
#[derive(Debug, Default)]
pub struct StaticRankOracle {
    ranks: HashMap<String, RankRecord>
}

impl StaticRankOracle {
    pub fn insert(&mut self, display_name: &str, record: RankRecord) {
        self.ranks.insert(display_name.to_string(), record);
    }
}

impl RankOracle for StaticRankOracle {
    async fn previous_rank(&self, display_name: &str) -> Result<Option<RankRecord>, ApiError> {
        Ok(self.ranks.get(display_name).cloned())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredPlayer {
    pub points_count: f64,
    pub recap: Option<String>,
    pub is_queued: bool
}

#[derive(Default)]
struct MemoryState {
    players: Vec<(String, StoredPlayer)>,
    games: HashMap<String, SharedMatch>,
    links: HashMap<(String, String), (bool, bool)>,
    current_player: (String, i32),
    progress_updates: Vec<(String, i32)>
}

/// Storage kept in memory, mirroring the upsert rules of the database.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>
}

impl MemoryStorage {
    pub fn queue_player(&self, puuid: &str, points_count: f64) {
        let mut state = lock(&self.state);
        let stored = StoredPlayer {
            points_count,
            recap: None,
            is_queued: true
        };
        match state.players.iter_mut().find(|(p, _)| p == puuid) {
            Some((_, existing)) => existing.is_queued = true,
            None => state.players.push((puuid.to_string(), stored))
        }
    }

    pub fn player(&self, puuid: &str) -> Option<StoredPlayer> {
        lock(&self.state)
            .players
            .iter()
            .find(|(p, _)| p == puuid)
            .map(|(_, stored)| stored.clone())
    }

    /// Links matches to `puuid` without going through a run.
    pub fn seed_matches(&self, puuid: &str, matches: &[StoredMatch]) {
        let mut state = lock(&self.state);
        for m in matches {
            state.games.insert(m.match_id.clone(), SharedMatch::from(m));
            state
                .links
                .insert((puuid.to_string(), m.match_id.clone()), (m.is_solo, m.is_win));
        }
    }

    pub fn stored_matches(&self, puuid: &str) -> Vec<StoredMatch> {
        let state = lock(&self.state);
        let mut matches = state
            .links
            .iter()
            .filter(|((p, _), _)| p == puuid)
            .filter_map(|((_, id), (is_solo, is_win))| {
                state.games.get(id).map(|g| StoredMatch {
                    match_id: id.clone(),
                    created_at: g.created_at,
                    solo_queue: g.solo_queue,
                    win_points: g.win_points,
                    lose_points: g.lose_points,
                    is_solo: *is_solo,
                    is_win: *is_win
                })
            })
            .collect::<Vec<_>>();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.match_id.cmp(&b.match_id)));

        matches
    }

    pub fn current_player(&self) -> (String, i32) {
        lock(&self.state).current_player.clone()
    }

    pub fn progress_updates(&self) -> Vec<(String, i32)> {
        lock(&self.state).progress_updates.clone()
    }
}

impl Storage for MemoryStorage {
    async fn queued_players(&self) -> Result<Vec<QueuedPlayer>, StorageError> {
        Ok(lock(&self.state)
            .players
            .iter()
            .filter(|(_, stored)| stored.is_queued)
            .map(|(puuid, stored)| QueuedPlayer {
                puuid: puuid.clone(),
                points_count: stored.points_count
            })
            .collect())
    }

    async fn player_matches(&self, puuid: &str) -> Result<Vec<StoredMatch>, StorageError> {
        Ok(self.stored_matches(puuid))
    }

    async fn shared_matches(&self, match_ids: &[String]) -> Result<Vec<SharedMatch>, StorageError> {
        let state = lock(&self.state);
        Ok(match_ids.iter().filter_map(|id| state.games.get(id).cloned()).collect())
    }

    async fn save_matches(&self, puuid: &str, matches: &[StoredMatch]) -> Result<(), StorageError> {
        let mut state = lock(&self.state);
        for m in matches {
            let game = state
                .games
                .entry(m.match_id.clone())
                .or_insert_with(|| SharedMatch::from(m));
            game.win_points = game.win_points.or(m.win_points);
            game.lose_points = game.lose_points.or(m.lose_points);

            state
                .links
                .insert((puuid.to_string(), m.match_id.clone()), (m.is_solo, m.is_win));
        }

        Ok(())
    }

    async fn mark_premade(&self, puuid: &str, match_ids: &[String]) -> Result<(), StorageError> {
        let mut state = lock(&self.state);
        for id in match_ids {
            if let Some(link) = state.links.get_mut(&(puuid.to_string(), id.clone())) {
                link.0 = false;
            }
        }

        Ok(())
    }

    async fn finish_player(&self, puuid: &str, score: Option<(f64, &str)>) -> Result<(), StorageError> {
        let mut state = lock(&self.state);
        let Some((_, stored)) = state.players.iter_mut().find(|(p, _)| p == puuid) else {
            return Err(StorageError::Unavailable(format!("unknown player {}", puuid)));
        };

        stored.is_queued = false;
        if let Some((points_count, recap)) = score {
            stored.points_count = points_count;
            stored.recap = Some(recap.to_string());
        }

        Ok(())
    }

    async fn update_current_player(&self, display_name: &str, duration_secs: i32) -> Result<(), StorageError> {
        let mut state = lock(&self.state);
        state.current_player = (display_name.to_string(), duration_secs);
        state.progress_updates.push((display_name.to_string(), duration_secs));

        Ok(())
    }
}
