//! Rolling window of the most recent outcomes.

use super::error::EngineError;
use super::outcome::Outcome;
use std::collections::VecDeque;

pub const WINDOW_CAPACITY: usize = 20;

/// Fixed-capacity, insertion-ordered buffer. Oldest outcome is evicted on overflow.
#[derive(Debug, Clone)]
pub struct OutcomeWindow {
    outcomes: VecDeque<Outcome>,
}

impl OutcomeWindow {
    pub fn new() -> Self {
        Self {
            outcomes: VecDeque::with_capacity(WINDOW_CAPACITY),
        }
    }

    pub fn append(&mut self, outcome: Outcome) {
        if self.outcomes.len() == WINDOW_CAPACITY {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(outcome);
    }

    /// The last `n` outcomes, oldest first.
    pub fn tail(&self, n: usize) -> Result<Vec<Outcome>, EngineError> {
        let have = self.outcomes.len();
        if n > have {
            return Err(EngineError::InsufficientHistory { have, need: n });
        }
        Ok(self.outcomes.iter().skip(have - n).copied().collect())
    }

    pub fn latest(&self) -> Option<&Outcome> {
        self.outcomes.back()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter()
    }
}

impl Default for OutcomeWindow {
    fn default() -> Self {
        Self::new()
    }
}
