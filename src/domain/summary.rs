//! Per-strategy tallies computed from the result log.

use super::signal::{ResultKind, ResultRecord};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategySummary {
    pub owner_id: String,
    pub strategy_id: String,
    pub launched: usize,
    pub wins: usize,
    pub whites: usize,
    pub losses: usize,
}

impl StrategySummary {
    fn new(owner_id: &str, strategy_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            strategy_id: strategy_id.to_string(),
            launched: 0,
            wins: 0,
            whites: 0,
            losses: 0,
        }
    }

    pub fn resolved(&self) -> usize {
        self.wins + self.whites + self.losses
    }

    /// wins / (wins + losses); whites are pushes and count for neither side.
    pub fn win_rate(&self) -> f64 {
        let decided = self.wins + self.losses;
        if decided == 0 {
            0.0
        } else {
            self.wins as f64 / decided as f64
        }
    }

    /// Tally records, one summary per `(owner, strategy)`, ordered by key.
    pub fn compute(records: &[ResultRecord]) -> Vec<StrategySummary> {
        let mut by_key: BTreeMap<(String, String), StrategySummary> = BTreeMap::new();
        for record in records {
            let entry = by_key
                .entry((record.owner_id.clone(), record.strategy_id.clone()))
                .or_insert_with(|| StrategySummary::new(&record.owner_id, &record.strategy_id));
            match record.result {
                ResultKind::Launched => entry.launched += 1,
                ResultKind::Win => entry.wins += 1,
                ResultKind::White => entry.whites += 1,
                ResultKind::Loss => entry.losses += 1,
            }
        }
        by_key.into_values().collect()
    }
}
