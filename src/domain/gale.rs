//! Gale tracker: the per-(owner, strategy) resolution state machine.
//!
//! ```text
//!   Idle --open--> Open --(white | hit | gale overflow)--> Idle
//!                   |  ^
//!                   +--+ miss within the gale budget
//! ```

use super::matcher::Match;
use super::outcome::{Color, Outcome};
use super::strategy::Target;
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStatus {
    Idle,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    Win,
    White,
    Loss,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resolution::Win => "WIN",
            Resolution::White => "WHITE",
            Resolution::Loss => "LOSS",
        };
        f.write_str(name)
    }
}

/// Result of advancing an open tracker by one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Missed, still within budget: the next entry is gale `n`.
    Gale(u32),
    /// Resolved; `gales_used` is the gale the signal closed on.
    Resolved {
        resolution: Resolution,
        gales_used: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaleTracker {
    pub strategy_id: String,
    pub owner_id: String,
    pub strategy_name: String,
    pub status: TrackerStatus,
    pub target: Target,
    pub gale_count: u32,
    pub max_gales: u32,
    pub opened_at: DateTime<Utc>,
}

impl GaleTracker {
    pub fn open(m: &Match, opened_at: DateTime<Utc>) -> Self {
        Self {
            strategy_id: m.strategy_id.clone(),
            owner_id: m.owner_id.clone(),
            strategy_name: m.strategy_name.clone(),
            status: TrackerStatus::Open,
            target: m.target,
            gale_count: 0,
            max_gales: m.max_gales,
            opened_at,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TrackerStatus::Open
    }

    /// Advance by one outcome. An idle tracker ignores outcomes and yields nothing.
    pub fn advance(&mut self, outcome: &Outcome) -> Option<Step> {
        if !self.is_open() {
            return None;
        }

        // white is a push for color targets, whatever the color configured
        if outcome.color == Color::White && matches!(self.target, Target::Color(_)) {
            return Some(self.resolve(Resolution::White));
        }
        if self.target.is_hit(outcome) {
            return Some(self.resolve(Resolution::Win));
        }

        if self.gale_count >= self.max_gales {
            return Some(self.resolve(Resolution::Loss));
        }
        self.gale_count += 1;
        Some(Step::Gale(self.gale_count))
    }

    fn resolve(&mut self, resolution: Resolution) -> Step {
        let gales_used = self.gale_count;
        self.status = TrackerStatus::Idle;
        self.gale_count = 0;
        Step::Resolved {
            resolution,
            gales_used,
        }
    }
}
