pub mod outcome;
pub mod player;
pub mod player_match;
pub mod queue;
pub mod rank_record;
pub mod tier;
