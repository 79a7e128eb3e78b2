use crate::{
    api::api_structs::MatchDTO,
    config::Config,
    model::structures::{outcome::Outcome, player::Player, queue::Queue}
};

/// One match seen from the tracked player's side.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchView {
    pub outcome: Outcome,
    /// Every participant but the player
    pub others: Vec<String>,
    /// Participants on the losing side when the player won, and vice versa
    pub enemies: Vec<String>
}

impl MatchView {
    /// `None` when the player is not part of the match or the detail is
    /// inconsistent.
    pub fn of(dto: &MatchDTO, puuid: &str) -> Option<MatchView> {
        let ids = &dto.metadata.participants;
        let results = &dto.info.participants;
        if ids.len() != results.len() {
            return None;
        }

        let index = ids.iter().position(|p| p == puuid)?;
        let win = results[index].win;

        let mut others = Vec::with_capacity(ids.len().saturating_sub(1));
        let mut enemies = Vec::new();
        for (participant, result) in ids.iter().zip(results) {
            if participant == puuid {
                continue;
            }

            others.push(participant.clone());
            if result.win != win {
                enemies.push(participant.clone());
            }
        }

        Some(MatchView {
            outcome: Outcome::from_win(win),
            others,
            enemies
        })
    }
}

/// Recognized queue of a detail, `None` for anything else.
pub fn queue_of(dto: &MatchDTO) -> Option<Queue> {
    Queue::try_from(dto.info.queue_id).ok()
}

/// Whether the sample is large enough to be scored at all.
pub fn min_met(player: &Player, config: &Config) -> bool {
    player.solo.len() >= config.games_min_solo && player.total() >= config.games_min_total
}

/// Whether a player built from scratch may stop discovering matches.
pub fn cold_target_met(player: &Player, config: &Config) -> bool {
    player.solo.len() >= config.games_min_total && player.total() >= config.games_max_total
}

/// Lower bound (unix seconds, inclusive) of the discovery window.
///
/// Only matches newer than the oldest one that counted in the last score
/// are candidates. Players without a score, or with too few known matches
/// to locate that boundary, start from `min_date`.
pub fn window_start(player: &Player, config: &Config) -> i64 {
    if player.is_cold_start() {
        return config.min_date;
    }

    let mut dates = player.matches().map(|m| m.created_at).collect::<Vec<_>>();
    dates.sort_unstable_by(|a, b| b.cmp(a));

    match dates.get(config.games_min_total - 1) {
        Some(boundary) => boundary + 1,
        None => config.min_date
    }
}

/// Trims the sample back to `games_min_total`, newest first.
///
/// Only matches dated after `max_date` may go, and a solo match is kept
/// when the solo collection is already at its floor. The pass ends at the
/// first match dated at or before `max_date`. Returns the number removed.
pub fn evict(player: &mut Player, config: &Config) -> usize {
    let target = config.games_min_total;
    let mut candidates = player
        .matches()
        .map(|m| (m.created_at, m.id.clone(), m.is_solo()))
        .collect::<Vec<_>>();
    candidates.sort_by(|a, b| b.0.cmp(&a.0));

    let mut removed = 0;
    for (created_at, id, is_solo) in candidates {
        if player.total() <= target || created_at <= config.max_date {
            break;
        }

        if is_solo {
            if player.solo.len() > config.games_min_solo {
                player.solo.retain(|m| m.id != id);
                removed += 1;
            }
        } else {
            player.premade.retain(|m| m.id != id);
            removed += 1;
        }
    }

    removed
}
