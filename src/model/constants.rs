// Players under this score have never been rated
pub const COLD_START_THRESHOLD: f64 = 0.5;
pub const MIN_OPPONENT_SAMPLES: usize = 3;
pub const RANKED_SOLO_QUEUE_TYPE: &str = "RANKED_SOLO_5x5";
pub const MATCH_ID_PAGE_SIZE: u32 = 100;
// Marks the boundary between the two scoring passes in a recap
pub const RECAP_PASS_SEPARATOR: &str = "FF";
// Estimated seconds of processing per discovered match, for the progress row
pub const SECONDS_PER_MATCH: f64 = 1.1;
