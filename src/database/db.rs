use super::{
    db_structs::{QueuedPlayer, SharedMatch, StoredMatch},
    Storage, StorageError
};
use chrono::Utc;
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info};

pub struct DbClient {
    // Transactions need exclusive access to the client
    client: Mutex<Client>
}

impl DbClient {
    /// Connects, spawns the connection driver and makes sure the single
    /// progress row exists.
    pub async fn connect(connection_str: &str) -> Result<Self, StorageError> {
        let (client, connection) = tokio_postgres::connect(connection_str, NoTls).await?;

        // Spawn the connection object to run in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });

        let db = DbClient {
            client: Mutex::new(client)
        };
        db.init_current_player().await?;

        info!("Connected to database");
        Ok(db)
    }

    async fn init_current_player(&self) -> Result<(), StorageError> {
        let client = self.client.lock().await;
        let existing = client.query_opt("SELECT 1 FROM algo_current_player LIMIT 1", &[]).await?;
        if existing.is_none() {
            client
                .execute(
                    "INSERT INTO algo_current_player (riot_ign, duration, updated_at) VALUES ('', 0, $1)",
                    &[&Utc::now().naive_utc()]
                )
                .await?;
        }

        Ok(())
    }

    fn stored_match_from_row(row: &Row) -> StoredMatch {
        StoredMatch {
            match_id: row.get("riot_game_id"),
            created_at: row.get("game_date"),
            solo_queue: row.get("is_soloq"),
            win_points: row.get("win_points_count"),
            lose_points: row.get("lose_points_count"),
            is_solo: row.get("is_solo"),
            is_win: row.get("is_win")
        }
    }

    fn shared_match_from_row(row: &Row) -> SharedMatch {
        SharedMatch {
            match_id: row.get("riot_game_id"),
            created_at: row.get("game_date"),
            solo_queue: row.get("is_soloq"),
            win_points: row.get("win_points_count"),
            lose_points: row.get("lose_points_count")
        }
    }
}

impl Storage for DbClient {
    async fn queued_players(&self) -> Result<Vec<QueuedPlayer>, StorageError> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                "SELECT riot_puuid, points_count FROM algo_players WHERE is_queued ORDER BY updated_at NULLS FIRST",
                &[]
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| QueuedPlayer {
                puuid: row.get("riot_puuid"),
                points_count: row.get("points_count")
            })
            .collect())
    }

    async fn player_matches(&self, puuid: &str) -> Result<Vec<StoredMatch>, StorageError> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                "SELECT g.riot_game_id, g.game_date, g.is_soloq, g.win_points_count, g.lose_points_count,
                        pg.is_solo, pg.is_win
                 FROM algo_players_games pg
                     JOIN algo_games g ON g.riot_game_id = pg.riot_game_id
                 WHERE pg.riot_puuid = $1
                 ORDER BY g.game_date DESC",
                &[&puuid]
            )
            .await?;

        Ok(rows.iter().map(Self::stored_match_from_row).collect())
    }

    async fn shared_matches(&self, match_ids: &[String]) -> Result<Vec<SharedMatch>, StorageError> {
        if match_ids.is_empty() {
            return Ok(Vec::new());
        }

        let client = self.client.lock().await;
        let rows = client
            .query(
                "SELECT riot_game_id, game_date, is_soloq, win_points_count, lose_points_count
                 FROM algo_games WHERE riot_game_id = ANY($1)",
                &[&match_ids]
            )
            .await?;

        Ok(rows.iter().map(Self::shared_match_from_row).collect())
    }

    async fn save_matches(&self, puuid: &str, matches: &[StoredMatch]) -> Result<(), StorageError> {
        if matches.is_empty() {
            return Ok(());
        }

        let mut client = self.client.lock().await;
        let transaction = client.transaction().await?;

        let upsert_game = transaction
            .prepare(
                "INSERT INTO algo_games (riot_game_id, game_date, is_soloq, win_points_count, lose_points_count)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (riot_game_id) DO UPDATE SET
                     win_points_count = COALESCE(algo_games.win_points_count, EXCLUDED.win_points_count),
                     lose_points_count = COALESCE(algo_games.lose_points_count, EXCLUDED.lose_points_count)"
            )
            .await?;
        let upsert_link = transaction
            .prepare(
                "INSERT INTO algo_players_games (riot_puuid, riot_game_id, is_solo, is_win)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (riot_puuid, riot_game_id) DO UPDATE SET
                     is_solo = EXCLUDED.is_solo,
                     is_win = EXCLUDED.is_win"
            )
            .await?;

        for m in matches {
            transaction
                .execute(
                    &upsert_game,
                    &[&m.match_id, &m.created_at, &m.solo_queue, &m.win_points, &m.lose_points]
                )
                .await?;
            transaction
                .execute(&upsert_link, &[&puuid, &m.match_id, &m.is_solo, &m.is_win])
                .await?;
        }

        transaction.commit().await?;
        debug!(puuid, count = matches.len(), "Saved matches");

        Ok(())
    }

    async fn mark_premade(&self, puuid: &str, match_ids: &[String]) -> Result<(), StorageError> {
        if match_ids.is_empty() {
            return Ok(());
        }

        let client = self.client.lock().await;
        let updated = client
            .execute(
                "UPDATE algo_players_games SET is_solo = FALSE
                 WHERE riot_puuid = $1 AND riot_game_id = ANY($2)",
                &[&puuid, &match_ids]
            )
            .await?;

        debug!(puuid, updated, "Marked stored matches as premade");
        Ok(())
    }

    async fn finish_player(&self, puuid: &str, score: Option<(f64, &str)>) -> Result<(), StorageError> {
        let client = self.client.lock().await;
        let now = Utc::now().naive_utc();

        match score {
            Some((points_count, recap)) => {
                client
                    .execute(
                        "UPDATE algo_players
                         SET points_count = $2, points_count_recap = $3, is_queued = FALSE, updated_at = $4
                         WHERE riot_puuid = $1",
                        &[&puuid, &points_count, &recap, &now]
                    )
                    .await?;
            }
            None => {
                client
                    .execute(
                        "UPDATE algo_players SET is_queued = FALSE, updated_at = $2 WHERE riot_puuid = $1",
                        &[&puuid, &now]
                    )
                    .await?;
            }
        }

        Ok(())
    }

    async fn update_current_player(&self, display_name: &str, duration_secs: i32) -> Result<(), StorageError> {
        let client = self.client.lock().await;
        client
            .execute(
                "UPDATE algo_current_player SET riot_ign = $1, duration = $2, updated_at = $3",
                &[&display_name, &duration_secs, &Utc::now().naive_utc()]
            )
            .await?;

        Ok(())
    }
}
