use crate::{api::ApiError, config::ConfigError, model::structures::rank_record::RankRecord};
use serde::Deserialize;
use std::{collections::HashMap, path::Path};
use tracing::{debug, info};

/// Historical rank lookup, consulted only for participants without a live
/// ranked solo entry (typically early in a season).
#[allow(async_fn_in_trait)]
pub trait RankOracle {
    /// `display_name` is `gameName#tagLine`.
    async fn previous_rank(&self, display_name: &str) -> Result<Option<RankRecord>, ApiError>;
}

/// Oracle for deployments without a historical source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistoricalRank;

impl RankOracle for NoHistoricalRank {
    async fn previous_rank(&self, _display_name: &str) -> Result<Option<RankRecord>, ApiError> {
        Ok(None)
    }
}

/// Seasons a historical rank must come from, most recent first. Passed to an
/// oracle at construction and never shared mutably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonLabels(Vec<String>);

impl SeasonLabels {
    pub fn new<I, S>(labels: I) -> SeasonLabels
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        SeasonLabels(labels.into_iter().map(Into::into).collect())
    }

    /// Labels, most recent first
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether a season cell on a profile page names one of these seasons.
    pub fn matches(&self, cell: &str) -> bool {
        self.0.iter().any(|label| cell.contains(label.as_str()))
    }
}

/// One season row of a profile page, as exported by an external scraper.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeasonRankRow {
    pub display_name: String,
    /// Season cell, e.g. `"S2024 S2"`
    pub season: String,
    /// Rank label, e.g. `"Gold 2"` or `"Master"`
    pub label: String,
    #[serde(default)]
    pub league_points: u32
}

/// Historical ranks read from exported profile rows. The most recent of
/// `seasons` with a parsable label wins.
#[derive(Debug, Clone)]
pub struct HistoricalRankTable {
    seasons: SeasonLabels,
    rows: HashMap<String, Vec<SeasonRankRow>>
}

impl HistoricalRankTable {
    pub fn new(seasons: SeasonLabels, rows: Vec<SeasonRankRow>) -> HistoricalRankTable {
        let mut by_player: HashMap<String, Vec<SeasonRankRow>> = HashMap::new();
        for row in rows.into_iter().filter(|row| seasons.matches(&row.season)) {
            by_player.entry(row.display_name.clone()).or_default().push(row);
        }

        HistoricalRankTable {
            seasons,
            rows: by_player
        }
    }

    /// Reads a JSON array of `SeasonRankRow`.
    pub fn load(path: impl AsRef<Path>, seasons: SeasonLabels) -> Result<HistoricalRankTable, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let rows: Vec<SeasonRankRow> = serde_json::from_str(&raw)?;
        let table = HistoricalRankTable::new(seasons, rows);

        info!(players = table.rows.len(), "Loaded historical ranks");
        Ok(table)
    }

    fn lookup(&self, display_name: &str) -> Option<RankRecord> {
        let rows = self.rows.get(display_name)?;
        self.seasons.labels().find_map(|season| {
            rows.iter()
                .filter(|row| row.season.contains(season))
                .find_map(|row| RankRecord::from_label(&row.label, row.league_points))
        })
    }
}

impl RankOracle for HistoricalRankTable {
    async fn previous_rank(&self, display_name: &str) -> Result<Option<RankRecord>, ApiError> {
        let record = self.lookup(display_name);
        debug!(display_name, found = record.is_some(), "Historical rank lookup");
        Ok(record)
    }
}
