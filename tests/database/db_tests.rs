use points_processor::database::{db::DbClient, db_structs::StoredMatch, Storage};
use serial_test::serial;

use super::test_helpers::TestDatabase;
use crate::common::init_test_env;

fn stored(id: &str, created_at: i64, win: bool, value: i32) -> StoredMatch {
    StoredMatch {
        match_id: id.to_string(),
        created_at,
        solo_queue: true,
        win_points: win.then_some(value),
        lose_points: (!win).then_some(value),
        is_solo: true,
        is_win: win
    }
}

#[tokio::test]
#[serial]
#[ignore = "needs docker"]
async fn test_connect_creates_progress_row() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");

    let _first = DbClient::connect(&test_db.connection_string).await.expect("Failed to connect");
    let _second = DbClient::connect(&test_db.connection_string).await.expect("Failed to connect");

    assert_eq!(test_db.count("algo_current_player").await.unwrap(), 1);
}

#[tokio::test]
#[serial]
#[ignore = "needs docker"]
async fn test_queued_players() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    test_db.seed_players().await.expect("Failed to seed players");
    let db_client = DbClient::connect(&test_db.connection_string).await.expect("Failed to connect");

    let queued = db_client.queued_players().await.unwrap();

    let ids = queued.iter().map(|p| p.puuid.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["fresh", "veteran"]);
    assert_eq!(queued[1].points_count, 7.5);
}

#[tokio::test]
#[serial]
#[ignore = "needs docker"]
async fn test_save_and_load_matches() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    test_db.seed_players().await.expect("Failed to seed players");
    let db_client = DbClient::connect(&test_db.connection_string).await.expect("Failed to connect");

    let matches = vec![stored("EUW1_1", 1_000, true, 8), stored("EUW1_2", 3_000, false, 7), stored("EUW1_3", 2_000, true, 9)];
    db_client.save_matches("fresh", &matches).await.unwrap();

    let loaded = db_client.player_matches("fresh").await.unwrap();
    let ids = loaded.iter().map(|m| m.match_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["EUW1_2", "EUW1_3", "EUW1_1"]);
    assert_eq!(loaded[0], matches[1]);
    assert!(db_client.player_matches("veteran").await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
#[ignore = "needs docker"]
async fn test_shared_values_are_never_overwritten() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    test_db.seed_players().await.expect("Failed to seed players");
    let db_client = DbClient::connect(&test_db.connection_string).await.expect("Failed to connect");

    // Same match seen from both sides, then re-saved with another value
    db_client.save_matches("fresh", &[stored("EUW1_1", 1_000, true, 8)]).await.unwrap();
    db_client.save_matches("veteran", &[stored("EUW1_1", 1_000, false, 6)]).await.unwrap();
    db_client.save_matches("veteran", &[stored("EUW1_1", 1_000, false, 9)]).await.unwrap();

    let shared = db_client
        .shared_matches(&["EUW1_1".to_string(), "EUW1_unknown".to_string()])
        .await
        .unwrap();

    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].win_points, Some(8));
    assert_eq!(shared[0].lose_points, Some(6));
    assert_eq!(test_db.count("algo_players_games").await.unwrap(), 2);
}

#[tokio::test]
#[serial]
#[ignore = "needs docker"]
async fn test_mark_premade_only_touches_player() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    test_db.seed_players().await.expect("Failed to seed players");
    let db_client = DbClient::connect(&test_db.connection_string).await.expect("Failed to connect");

    let matches = vec![stored("EUW1_1", 1_000, true, 8), stored("EUW1_2", 2_000, true, 8)];
    db_client.save_matches("fresh", &matches).await.unwrap();
    db_client.save_matches("veteran", &matches).await.unwrap();

    db_client.mark_premade("fresh", &["EUW1_1".to_string()]).await.unwrap();

    let fresh = db_client.player_matches("fresh").await.unwrap();
    assert!(fresh.iter().find(|m| m.match_id == "EUW1_1").is_some_and(|m| !m.is_solo));
    assert!(fresh.iter().find(|m| m.match_id == "EUW1_2").is_some_and(|m| m.is_solo));
    assert!(db_client.player_matches("veteran").await.unwrap().iter().all(|m| m.is_solo));
}

#[tokio::test]
#[serial]
#[ignore = "needs docker"]
async fn test_finish_player() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    test_db.seed_players().await.expect("Failed to seed players");
    let db_client = DbClient::connect(&test_db.connection_string).await.expect("Failed to connect");

    db_client.finish_player("fresh", Some((8.3, "0819FF0819"))).await.unwrap();
    db_client.finish_player("veteran", None).await.unwrap();

    assert!(db_client.queued_players().await.unwrap().is_empty());

    let client = test_db.get_client().await.unwrap();
    let rows = client
        .query(
            "SELECT riot_puuid, points_count, points_count_recap FROM algo_players
             WHERE riot_puuid IN ('fresh', 'veteran') ORDER BY riot_puuid",
            &[]
        )
        .await
        .unwrap();
    assert_eq!(rows[0].get::<_, f64>(1), 8.3);
    assert_eq!(rows[0].get::<_, Option<String>>(2), Some("0819FF0819".to_string()));
    assert_eq!(rows[1].get::<_, f64>(1), 7.5);
    assert_eq!(rows[1].get::<_, Option<String>>(2), None);
}

#[tokio::test]
#[serial]
#[ignore = "needs docker"]
async fn test_update_current_player() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    let db_client = DbClient::connect(&test_db.connection_string).await.expect("Failed to connect");

    db_client.update_current_player("Me#EUW", 55).await.unwrap();

    let client = test_db.get_client().await.unwrap();
    let row = client
        .query_one("SELECT riot_ign, duration FROM algo_current_player", &[])
        .await
        .unwrap();
    assert_eq!(row.get::<_, String>(0), "Me#EUW");
    assert_eq!(row.get::<_, i32>(1), 55);
}
