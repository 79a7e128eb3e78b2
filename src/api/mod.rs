pub mod api_structs;
pub mod transport;

use crate::{config::PacingConfig, model::constants::MATCH_ID_PAGE_SIZE};
use api_structs::{AccountDTO, LeagueEntryDTO, MatchDTO, SummonerDTO};
use itertools::Itertools;
use tracing::debug;

pub use transport::{ApiError, Fetched, Transport};

/// Routing value for account-v1 and match-v5
pub const REGIONAL_ROOT: &str = "https://europe.api.riotgames.com";
/// Platform value for summoner-v4 and league-v4
pub const PLATFORM_ROOT: &str = "https://euw1.api.riotgames.com";

/// Query of the match id listing endpoint. Unset or zero parameters are
/// left out of the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchIdQuery {
    /// Unix seconds, inclusive
    pub start_time: Option<i64>,
    /// Unix seconds, inclusive
    pub end_time: Option<i64>,
    pub start: u32,
    /// At most 100
    pub count: u32
}

impl MatchIdQuery {
    pub fn to_query_string(&self) -> String {
        let mut params = Vec::new();
        if let Some(start_time) = self.start_time {
            params.push(format!("startTime={}", start_time));
        }
        if let Some(end_time) = self.end_time {
            params.push(format!("endTime={}", end_time));
        }
        if self.start > 0 {
            params.push(format!("start={}", self.start));
        }
        if self.count > 0 {
            params.push(format!("count={}", self.count.min(MATCH_ID_PAGE_SIZE)));
        }

        params.into_iter().join("&")
    }
}

/// Typed endpoints of the remote match-data service.
///
/// "No such resource" is `Ok(None)` or an empty list. Only an exhausted
/// transport is an error.
#[allow(async_fn_in_trait)]
pub trait MatchDataSource {
    async fn account_by_puuid(&self, puuid: &str) -> Result<Option<AccountDTO>, ApiError>;

    async fn summoner_by_puuid(&self, puuid: &str) -> Result<Option<SummonerDTO>, ApiError>;

    async fn league_entries(&self, summoner_id: &str) -> Result<Vec<LeagueEntryDTO>, ApiError>;

    async fn match_ids(&self, puuid: &str, query: &MatchIdQuery) -> Result<Vec<String>, ApiError>;

    async fn match_detail(&self, match_id: &str) -> Result<Option<MatchDTO>, ApiError>;
}

pub struct RiotClient {
    transport: Transport,
    regional_root: String,
    platform_root: String
}

impl RiotClient {
    pub fn new(transport: Transport) -> RiotClient {
        RiotClient::with_roots(transport, REGIONAL_ROOT, PLATFORM_ROOT)
    }

    /// Points the client at other hosts, e.g. a local test server.
    pub fn with_roots(transport: Transport, regional_root: &str, platform_root: &str) -> RiotClient {
        RiotClient {
            transport,
            regional_root: regional_root.trim_end_matches('/').to_string(),
            platform_root: platform_root.trim_end_matches('/').to_string()
        }
    }
}

impl MatchDataSource for RiotClient {
    async fn account_by_puuid(&self, puuid: &str) -> Result<Option<AccountDTO>, ApiError> {
        let url = format!("{}/riot/account/v1/accounts/by-puuid/{}", self.regional_root, puuid);
        Ok(self.transport.fetch(&url).await?.into_option())
    }

    async fn summoner_by_puuid(&self, puuid: &str) -> Result<Option<SummonerDTO>, ApiError> {
        let url = format!("{}/lol/summoner/v4/summoners/by-puuid/{}", self.platform_root, puuid);
        Ok(self.transport.fetch(&url).await?.into_option())
    }

    async fn league_entries(&self, summoner_id: &str) -> Result<Vec<LeagueEntryDTO>, ApiError> {
        let url = format!("{}/lol/league/v4/entries/by-summoner/{}", self.platform_root, summoner_id);
        Ok(self.transport.fetch(&url).await?.into_list())
    }

    async fn match_ids(&self, puuid: &str, query: &MatchIdQuery) -> Result<Vec<String>, ApiError> {
        let mut url = format!("{}/lol/match/v5/matches/by-puuid/{}/ids", self.regional_root, puuid);
        let params = query.to_query_string();
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params);
        }

        Ok(self.transport.fetch(&url).await?.into_list())
    }

    async fn match_detail(&self, match_id: &str) -> Result<Option<MatchDTO>, ApiError> {
        let url = format!("{}/lol/match/v5/matches/{}", self.regional_root, match_id);
        Ok(self.transport.fetch(&url).await?.into_option())
    }
}

/// Lists every match id of `puuid` in the time window, most recent first.
///
/// Pages of 100 are requested from index 0 until a page comes back short,
/// which includes the empty page the service answers with past the end.
pub async fn list_match_ids<A: MatchDataSource>(
    api: &A,
    puuid: &str,
    start_time: Option<i64>,
    end_time: Option<i64>,
    pacing: &PacingConfig
) -> Result<Vec<String>, ApiError> {
    let mut ids = Vec::new();
    let mut start = 0;

    loop {
        let query = MatchIdQuery {
            start_time,
            end_time,
            start,
            count: MATCH_ID_PAGE_SIZE
        };
        let page = api.match_ids(puuid, &query).await?;
        let exhausted = page.len() < MATCH_ID_PAGE_SIZE as usize;
        ids.extend(page);

        tokio::time::sleep(pacing.page_delay()).await;
        if exhausted {
            break;
        }

        start += MATCH_ID_PAGE_SIZE;
    }

    debug!(puuid, count = ids.len(), "Listed match ids");
    Ok(ids)
}
