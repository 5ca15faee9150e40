//! Tick orchestration: ingest, match, admit, advance.
//!
//! One [`Engine`] is the single owner of the outcome window and the tracker
//! registry. Ticks take `&mut self`, so outcomes are applied strictly one at a
//! time and in arrival order.

use super::gale::{GaleTracker, Resolution, Step};
use super::gate;
use super::matcher::{Match, match_strategies};
use super::outcome::Outcome;
use super::registry::TrackerRegistry;
use super::strategy::{StrategyDefinition, Target};
use super::window::OutcomeWindow;
use chrono::{DateTime, Utc};

/// An open signal that missed and moved to its next gale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaleAdvance {
    pub strategy_id: String,
    pub owner_id: String,
    pub strategy_name: String,
    pub target: Target,
    pub gale: u32,
    pub max_gales: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSignal {
    pub strategy_id: String,
    pub owner_id: String,
    pub strategy_name: String,
    pub target: Target,
    pub resolution: Resolution,
    pub gales_used: u32,
    pub max_gales: u32,
    pub opened_at: DateTime<Utc>,
    pub resolved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickResult {
    /// The outcome this tick processed; `None` for a skipped duplicate.
    pub outcome: Option<Outcome>,
    pub opened: Vec<Match>,
    pub advanced: Vec<GaleAdvance>,
    pub resolved: Vec<ResolvedSignal>,
}

impl TickResult {
    pub fn is_empty(&self) -> bool {
        self.opened.is_empty() && self.advanced.is_empty() && self.resolved.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    window: OutcomeWindow,
    registry: TrackerRegistry,
    last_observed: Option<DateTime<Utc>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp of the newest outcome processed so far.
    pub fn last_observed(&self) -> Option<DateTime<Utc>> {
        self.last_observed
    }

    pub fn window(&self) -> &OutcomeWindow {
        &self.window
    }

    pub fn open_trackers(&self) -> impl Iterator<Item = &GaleTracker> {
        self.registry.iter()
    }

    pub fn tracker(&self, owner_id: &str, strategy_id: &str) -> Option<&GaleTracker> {
        self.registry.get(owner_id, strategy_id)
    }

    /// Process one outcome against a strategy snapshot.
    ///
    /// An outcome whose `observed_at` is not newer than the last processed one
    /// is a no-op and returns an empty result.
    pub fn tick(&mut self, outcome: Outcome, strategies: &[StrategyDefinition]) -> TickResult {
        if let Some(last) = self.last_observed {
            if outcome.observed_at == last {
                tracing::trace!(observed_at = %outcome.observed_at, "duplicate outcome, skipping");
                return TickResult::default();
            }
            if outcome.observed_at < last {
                tracing::warn!(
                    observed_at = %outcome.observed_at,
                    last = %last,
                    "outcome older than last processed, skipping"
                );
                return TickResult::default();
            }
        }
        self.last_observed = Some(outcome.observed_at);
        self.window.append(outcome);

        let mut result = TickResult {
            outcome: Some(outcome),
            ..TickResult::default()
        };

        // trackers opened on this outcome only see later outcomes
        let already_open = self.registry.keys();

        let candidates = match_strategies(&self.window, strategies);
        for m in gate::admit(candidates, &self.registry) {
            if self.registry.insert(GaleTracker::open(&m, outcome.observed_at)) {
                tracing::info!(
                    owner = %m.owner_id,
                    strategy = %m.strategy_id,
                    target = %m.target,
                    "signal opened"
                );
                result.opened.push(m);
            }
        }

        for key in already_open {
            let Some(tracker) = self.registry.get_mut(&key) else {
                continue;
            };
            let step = tracker.advance(&outcome);
            let snapshot = tracker.clone();

            match step {
                Some(Step::Gale(gale)) => {
                    tracing::debug!(
                        owner = %snapshot.owner_id,
                        strategy = %snapshot.strategy_id,
                        gale,
                        max_gales = snapshot.max_gales,
                        "signal advanced to next gale"
                    );
                    result.advanced.push(GaleAdvance {
                        strategy_id: snapshot.strategy_id,
                        owner_id: snapshot.owner_id,
                        strategy_name: snapshot.strategy_name,
                        target: snapshot.target,
                        gale,
                        max_gales: snapshot.max_gales,
                    });
                }
                Some(Step::Resolved {
                    resolution,
                    gales_used,
                }) => {
                    self.registry.remove(&key);
                    tracing::info!(
                        owner = %snapshot.owner_id,
                        strategy = %snapshot.strategy_id,
                        %resolution,
                        gales_used,
                        "signal resolved"
                    );
                    result.resolved.push(ResolvedSignal {
                        strategy_id: snapshot.strategy_id,
                        owner_id: snapshot.owner_id,
                        strategy_name: snapshot.strategy_name,
                        target: snapshot.target,
                        resolution,
                        gales_used,
                        max_gales: snapshot.max_gales,
                        opened_at: snapshot.opened_at,
                        resolved_at: outcome.observed_at,
                    });
                }
                None => {
                    self.registry.remove(&key);
                }
            }
        }

        result
    }
}
