use points_processor::database::{db::DbClient, db_structs::StoredMatch, Storage};
use serial_test::serial;

use super::test_helpers::TestDatabase;
use crate::common::init_test_env;

#[tokio::test]
#[serial]
#[ignore = "needs docker"]
async fn test_failed_save_leaves_no_games_behind() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    let db_client = DbClient::connect(&test_db.connection_string).await.expect("Failed to connect");

    // The link row violates its foreign key: nobody is called "missing"
    let matches = vec![StoredMatch {
        match_id: "EUW1_1".to_string(),
        created_at: 1_000,
        solo_queue: true,
        win_points: Some(8),
        lose_points: None,
        is_solo: true,
        is_win: true
    }];
    let result = db_client.save_matches("missing", &matches).await;

    assert!(result.is_err());
    assert_eq!(test_db.count("algo_games").await.unwrap(), 0);
    assert_eq!(test_db.count("algo_players_games").await.unwrap(), 0);
}

#[tokio::test]
#[serial]
#[ignore = "needs docker"]
async fn test_client_usable_after_failed_save() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    test_db.seed_players().await.expect("Failed to seed players");
    let db_client = DbClient::connect(&test_db.connection_string).await.expect("Failed to connect");

    let m = StoredMatch {
        match_id: "EUW1_1".to_string(),
        created_at: 1_000,
        solo_queue: false,
        win_points: None,
        lose_points: Some(5),
        is_solo: true,
        is_win: false
    };
    assert!(db_client.save_matches("missing", std::slice::from_ref(&m)).await.is_err());

    db_client.save_matches("fresh", std::slice::from_ref(&m)).await.unwrap();

    assert_eq!(db_client.player_matches("fresh").await.unwrap(), vec![m]);
}
