use serde::{Deserialize, Serialize};

/// account-v1 `AccountDto`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountDTO {
    pub puuid: String,
    pub game_name: Option<String>,
    pub tag_line: Option<String>
}

impl AccountDTO {
    /// `gameName#tagLine`, when both halves are known
    pub fn display_name(&self) -> Option<String> {
        match (&self.game_name, &self.tag_line) {
            (Some(name), Some(tag)) => Some(format!("{}#{}", name, tag)),
            _ => None
        }
    }
}

/// summoner-v4 `SummonerDTO`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummonerDTO {
    pub id: String,
    pub puuid: String
}

/// league-v4 `LeagueEntryDTO`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntryDTO {
    pub queue_type: String,
    pub tier: String,
    /// Division, "I" through "IV"
    pub rank: Option<String>,
    #[serde(default)]
    pub league_points: u32
}

/// match-v5 `MatchDto`, reduced to the fields used here
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchDTO {
    pub metadata: MetadataDTO,
    pub info: InfoDTO
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDTO {
    pub match_id: String,
    /// Participant puuids, in the same order as `InfoDTO::participants`
    pub participants: Vec<String>
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InfoDTO {
    /// Unix milliseconds
    pub game_creation: i64,
    pub queue_id: i32,
    pub participants: Vec<ParticipantDTO>
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDTO {
    pub win: bool
}
