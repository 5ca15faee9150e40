//! Polling worker: the single actor that drives the engine.
//!
//! Each poll fetches the feed head, decodes it, takes a strategy snapshot,
//! ticks the engine and dispatches the tick's notices and result records.
//! Dispatch failures are logged and never touch engine state. A failed
//! strategy load does not drop the outcome: the tick runs against the last
//! snapshot that loaded.

use crate::domain::engine::{Engine, TickResult};
use crate::domain::error::GhostError;
use crate::domain::outcome::{ColorScheme, FeedRecord, Outcome};
use crate::domain::signal::{notices_for, records_for};
use crate::domain::strategy::StrategyDefinition;
use crate::ports::feed_port::FeedPort;
use crate::ports::notify_port::NotifyPort;
use crate::ports::result_log_port::ResultLogPort;
use crate::ports::strategy_port::StrategyPort;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub feed_url: String,
    pub color_scheme: ColorScheme,
    pub poll_interval: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            feed_url: String::new(),
            color_scheme: ColorScheme::default(),
            poll_interval: Duration::from_millis(1000),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }
}

/// Counters accumulated over a run or replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub polls: u64,
    pub outcomes: u64,
    pub opened: u64,
    pub gales: u64,
    pub resolved: u64,
    pub skipped: u64,
    pub stale_snapshots: u64,
    pub dispatch_failures: u64,
}

impl RunStats {
    fn record(&mut self, tick: &TickResult) {
        if tick.outcome.is_some() {
            self.outcomes += 1;
        }
        self.opened += tick.opened.len() as u64;
        self.gales += tick.advanced.len() as u64;
        self.resolved += tick.resolved.len() as u64;
    }
}

pub struct Worker<'a> {
    engine: Engine,
    color_scheme: ColorScheme,
    strategies: &'a dyn StrategyPort,
    notifier: &'a dyn NotifyPort,
    result_logs: Vec<&'a dyn ResultLogPort>,
    snapshot: Vec<StrategyDefinition>,
    stats: RunStats,
}

impl<'a> Worker<'a> {
    pub fn new(
        color_scheme: ColorScheme,
        strategies: &'a dyn StrategyPort,
        notifier: &'a dyn NotifyPort,
    ) -> Self {
        Self {
            engine: Engine::new(),
            color_scheme,
            strategies,
            notifier,
            result_logs: Vec::new(),
            snapshot: Vec::new(),
            stats: RunStats::default(),
        }
    }

    pub fn with_result_log(mut self, log: &'a dyn ResultLogPort) -> Self {
        self.result_logs.push(log);
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Fetch the feed head once and process it.
    pub fn poll_once(&mut self, feed: &dyn FeedPort) -> Result<TickResult, GhostError> {
        self.stats.polls += 1;
        let record = feed.latest()?;
        self.process_record(&record)
    }

    /// Poll until `max_polls` is reached, or forever when it is `None`.
    /// Failed polls are logged and the loop continues.
    pub fn run(
        &mut self,
        feed: &dyn FeedPort,
        poll_interval: Duration,
        max_polls: Option<u64>,
    ) -> RunStats {
        tracing::info!(?poll_interval, ?max_polls, "worker started");
        let mut polls = 0u64;

        loop {
            if let Err(e) = self.poll_once(feed) {
                self.stats.skipped += 1;
                tracing::warn!("poll failed: {e}");
            }
            polls += 1;

            if max_polls.is_some_and(|max| polls >= max) {
                break;
            }
            std::thread::sleep(poll_interval);
        }

        tracing::info!(
            polls = self.stats.polls,
            outcomes = self.stats.outcomes,
            opened = self.stats.opened,
            resolved = self.stats.resolved,
            "worker stopped"
        );
        self.stats
    }

    /// Drive a recorded sequence through the same path as live polling.
    /// The strategies must load once up front; undecodable records are skipped.
    pub fn replay_records(&mut self, records: &[FeedRecord]) -> Result<RunStats, GhostError> {
        self.snapshot = self.strategies.load_strategies()?;

        for record in records {
            self.stats.polls += 1;
            if let Err(e) = self.process_record(record) {
                self.stats.skipped += 1;
                tracing::warn!(observed_at = %record.observed_at, "skipping record: {e}");
            }
        }
        Ok(self.stats)
    }

    fn process_record(&mut self, record: &FeedRecord) -> Result<TickResult, GhostError> {
        let outcome = self
            .color_scheme
            .decode(record)
            .map_err(|reason| GhostError::Feed { reason })?;
        Ok(self.process_outcome(outcome))
    }

    fn process_outcome(&mut self, outcome: Outcome) -> TickResult {
        // the feed repeats its head between rounds
        if self
            .engine
            .last_observed()
            .is_some_and(|last| outcome.observed_at <= last)
        {
            return TickResult::default();
        }

        match self.strategies.load_strategies() {
            Ok(strategies) => self.snapshot = strategies,
            Err(e) => {
                self.stats.stale_snapshots += 1;
                tracing::warn!(
                    cached = self.snapshot.len(),
                    "strategy load failed, using last snapshot: {e}"
                );
            }
        }
        tracing::info!(
            number = outcome.number,
            color = %outcome.color,
            observed_at = %outcome.observed_at,
            "new outcome"
        );

        let tick = self.engine.tick(outcome, &self.snapshot);
        self.stats.record(&tick);
        self.dispatch(&tick);
        tick
    }

    fn dispatch(&mut self, tick: &TickResult) {
        if tick.is_empty() {
            return;
        }

        for record in records_for(tick) {
            for log in &self.result_logs {
                if let Err(e) = log.append(&record) {
                    self.stats.dispatch_failures += 1;
                    tracing::warn!(
                        strategy = %record.strategy_id,
                        result = %record.result,
                        "failed to log result: {e}"
                    );
                }
            }
        }

        for notice in notices_for(tick) {
            if let Err(e) = self.notifier.notify(&notice.owner_id, &notice.text) {
                self.stats.dispatch_failures += 1;
                tracing::warn!(owner = %notice.owner_id, "failed to deliver notice: {e}");
            }
        }
    }
}
