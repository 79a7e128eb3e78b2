pub mod db;
pub mod db_structs;

use db_structs::{QueuedPlayer, SharedMatch, StoredMatch};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String)
}

/// Persistence boundary of the processor.
#[allow(async_fn_in_trait)]
pub trait Storage {
    /// Players flagged for an update, with their current score
    async fn queued_players(&self) -> Result<Vec<QueuedPlayer>, StorageError>;

    /// Every match stored for `puuid`, most recent first
    async fn player_matches(&self, puuid: &str) -> Result<Vec<StoredMatch>, StorageError>;

    /// Matches already recorded by any player
    async fn shared_matches(&self, match_ids: &[String]) -> Result<Vec<SharedMatch>, StorageError>;

    /// Upserts matches and links them to `puuid`
    async fn save_matches(&self, puuid: &str, matches: &[StoredMatch]) -> Result<(), StorageError>;

    /// Flips stored solo links of `puuid` to premade
    async fn mark_premade(&self, puuid: &str, match_ids: &[String]) -> Result<(), StorageError>;

    /// Clears the queued flag, recording a new score when one was computed
    async fn finish_player(&self, puuid: &str, score: Option<(f64, &str)>) -> Result<(), StorageError>;

    /// Progress row read by external monitoring
    async fn update_current_player(&self, display_name: &str, duration_secs: i32) -> Result<(), StorageError>;
}
