mod common;

use common::{init_test_env, settle, Reply, ScriptedServer};
use points_processor::{
    api::{api_structs::SummonerDTO, ApiError, Fetched, MatchDataSource, MatchIdQuery, RiotClient, Transport},
    config::RetryPolicy
};

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        initial_delay_ms: 1..2,
        max_attempts: 5
    }
}

#[tokio::test]
async fn test_exhausted_retries_report_url_and_status() {
    init_test_env();
    let server = ScriptedServer::start(vec![Reply::Status(429, ""); 5]).await;
    let transport = Transport::new("key", fast_policy());
    let url = server.url("/lol/match/v5/matches/EUW1_1");

    let result = transport.fetch::<serde_json::Value>(&url).await;

    assert_eq!(
        result,
        Err(ApiError::TransportFailure {
            url,
            last_status: Some(429),
            attempts: 5
        })
    );
    settle().await;
    assert_eq!(server.hits(), 5);
}

#[tokio::test]
async fn test_success_after_retries_stops_retrying() {
    init_test_env();
    let server = ScriptedServer::start(vec![
        Reply::Status(503, ""),
        Reply::Status(429, ""),
        Reply::Status(200, r#"["EUW1_1","EUW1_2"]"#),
    ])
    .await;
    let transport = Transport::new("key", fast_policy());

    let result = transport.fetch::<Vec<String>>(&server.url("/ids")).await;

    assert_eq!(result, Ok(Fetched::Body(vec!["EUW1_1".to_string(), "EUW1_2".to_string()])));
    settle().await;
    assert_eq!(server.hits(), 3);
}

#[tokio::test]
async fn test_bad_request_is_empty_page() {
    init_test_env();
    let server = ScriptedServer::start(vec![Reply::Status(400, "")]).await;
    let transport = Transport::new("key", fast_policy());

    let result = transport.fetch::<Vec<String>>(&server.url("/ids")).await;

    assert_eq!(result, Ok(Fetched::EmptyPage));
    settle().await;
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn test_not_found_is_absent() {
    init_test_env();
    let server = ScriptedServer::start(vec![Reply::Status(404, "")]).await;
    let transport = Transport::new("key", fast_policy());

    let result = transport.fetch::<SummonerDTO>(&server.url("/summoner")).await;

    assert_eq!(result, Ok(Fetched::Absent));
}

#[tokio::test]
async fn test_dropped_connection_is_retried() {
    init_test_env();
    let server = ScriptedServer::start(vec![Reply::Drop, Reply::Status(200, r#"{"id":"s1","puuid":"p1"}"#)]).await;
    let transport = Transport::new("key", fast_policy());

    let result = transport.fetch::<SummonerDTO>(&server.url("/summoner")).await;

    assert_eq!(
        result,
        Ok(Fetched::Body(SummonerDTO {
            id: "s1".to_string(),
            puuid: "p1".to_string()
        }))
    );
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn test_undecodable_body_is_retried() {
    init_test_env();
    let server = ScriptedServer::start(vec![Reply::Status(200, "not json"); 5]).await;
    let transport = Transport::new("key", fast_policy());
    let url = server.url("/summoner");

    let result = transport.fetch::<SummonerDTO>(&url).await;

    assert!(matches!(
        result,
        Err(ApiError::TransportFailure {
            last_status: Some(200),
            ..
        })
    ));
}

#[tokio::test]
async fn test_client_sends_key_and_query() {
    init_test_env();
    let server = ScriptedServer::start(vec![Reply::Status(200, r#"["EUW1_9"]"#)]).await;
    let client = RiotClient::with_roots(Transport::new("RGAPI-secret", fast_policy()), &server.root, &server.root);
    let query = MatchIdQuery {
        start_time: Some(1_700_000_000),
        end_time: None,
        start: 100,
        count: 100
    };

    let ids = client.match_ids("abc", &query).await.unwrap();

    assert_eq!(ids, vec!["EUW1_9".to_string()]);
    let request = server.requests().remove(0);
    assert!(request.starts_with(
        "GET /lol/match/v5/matches/by-puuid/abc/ids?startTime=1700000000&start=100&count=100 HTTP/1.1"
    ));
    assert!(request.to_lowercase().contains("x-riot-token: rgapi-secret"));
}

#[tokio::test]
async fn test_client_maps_missing_account_to_none() {
    init_test_env();
    let server = ScriptedServer::start(vec![Reply::Status(404, "")]).await;
    let client = RiotClient::with_roots(Transport::new("key", fast_policy()), &server.root, &server.root);

    assert_eq!(client.account_by_puuid("ghost").await, Ok(None));
}
