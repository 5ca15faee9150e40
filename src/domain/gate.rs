//! Admission control for new signals.
//!
//! Every tick re-scans the whole window, so an unchanged suffix keeps
//! matching until it ages out. Only pairs without an open tracker may start
//! a new signal.

use super::matcher::Match;
use super::registry::TrackerRegistry;
use std::collections::HashSet;

pub fn admit(matches: Vec<Match>, open: &TrackerRegistry) -> Vec<Match> {
    let mut seen = HashSet::new();
    matches
        .into_iter()
        .filter(|m| {
            if open.is_open(&m.owner_id, &m.strategy_id) {
                tracing::debug!(
                    owner = %m.owner_id,
                    strategy = %m.strategy_id,
                    "signal already open, match suppressed"
                );
                return false;
            }
            seen.insert(m.key())
        })
        .collect()
}
