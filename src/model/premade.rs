use std::collections::HashSet;

/// Result of observing a participant alongside the tracked player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First sighting
    Candidate,
    /// Second sighting, now a confirmed premade
    Promoted,
    /// Already confirmed, nothing changed
    Confirmed
}

/// Co-occurrence detector for one player.
///
/// A participant seen once is a candidate. Seen a second time it becomes a
/// confirmed premade and never goes back. The two sets are disjoint.
#[derive(Debug, Default, Clone)]
pub struct PremadeTracker {
    candidates: HashSet<String>,
    confirmed: HashSet<String>,
    observed_matches: HashSet<String>
}

impl PremadeTracker {
    /// Observes every participant of `match_id`, at most once per match.
    /// Returns false when the match was already observed.
    pub fn observe_match(&mut self, match_id: &str, participants: &[String]) -> bool {
        if !self.observed_matches.insert(match_id.to_owned()) {
            return false;
        }

        for participant in participants {
            self.observe(participant);
        }
        true
    }

    pub fn observe(&mut self, participant: &str) -> Observation {
        if self.confirmed.contains(participant) {
            return Observation::Confirmed;
        }

        if self.candidates.remove(participant) {
            self.confirmed.insert(participant.to_owned());
            return Observation::Promoted;
        }

        self.candidates.insert(participant.to_owned());
        Observation::Candidate
    }

    pub fn is_confirmed(&self, participant: &str) -> bool {
        self.confirmed.contains(participant)
    }

    pub fn is_candidate(&self, participant: &str) -> bool {
        self.candidates.contains(participant)
    }

    pub fn confirmed_count(&self) -> usize {
        self.confirmed.len()
    }
}
