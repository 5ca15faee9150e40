#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use ghostsignal::domain::error::GhostError;
use ghostsignal::domain::outcome::{Color, FeedRecord, Outcome};
use ghostsignal::domain::signal::ResultRecord;
use ghostsignal::domain::strategy::{PatternElement, StrategyDefinition, StrategyKind, Target};
use ghostsignal::ports::feed_port::FeedPort;
use ghostsignal::ports::notify_port::NotifyPort;
use ghostsignal::ports::result_log_port::ResultLogPort;
use ghostsignal::ports::strategy_port::StrategyPort;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
}

pub fn outcome(number: u8, color: Color, secs: i64) -> Outcome {
    Outcome {
        number,
        color,
        observed_at: at(secs),
    }
}

/// Colors in order, one outcome every 30 seconds starting at `start`.
pub fn color_run(colors: &[Color], start: i64) -> Vec<Outcome> {
    colors
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let number = match c {
                Color::White => 0,
                Color::Red => 3,
                Color::Black => 10,
            };
            outcome(number, *c, start + 30 * i as i64)
        })
        .collect()
}

/// Feed record under the default color-id scheme (0 white, 1 black, 2 red).
pub fn feed_record(number: i64, color_id: i64, secs: i64) -> FeedRecord {
    FeedRecord {
        number,
        color_id,
        observed_at: at(secs),
    }
}

pub fn color_strategy(
    id: &str,
    owner: &str,
    pattern: &[PatternElement],
    target: Color,
    max_gales: u32,
) -> StrategyDefinition {
    StrategyDefinition {
        id: id.to_string(),
        owner_id: owner.to_string(),
        name: format!("{id} strategy"),
        kind: StrategyKind::ColorSequence,
        pattern: pattern.to_vec(),
        target: Some(Target::Color(target)),
        max_gales,
        enabled: true,
    }
}

pub fn number_strategy(
    id: &str,
    owner: &str,
    numbers: &[u8],
    target: u8,
    max_gales: u32,
) -> StrategyDefinition {
    StrategyDefinition {
        id: id.to_string(),
        owner_id: owner.to_string(),
        name: format!("{id} strategy"),
        kind: StrategyKind::NumberSequence,
        pattern: numbers.iter().map(|n| PatternElement::Number(*n)).collect(),
        target: Some(Target::Number(target)),
        max_gales,
        enabled: true,
    }
}

pub fn black() -> PatternElement {
    PatternElement::Color(Color::Black)
}

pub fn red() -> PatternElement {
    PatternElement::Color(Color::Red)
}

/// Serves queued records in order, then repeats the last one like a feed
/// whose head has not moved.
#[derive(Default)]
pub struct MockFeed {
    queue: RefCell<VecDeque<Result<FeedRecord, String>>>,
    last: RefCell<Option<FeedRecord>>,
}

impl MockFeed {
    pub fn new(records: Vec<FeedRecord>) -> Self {
        Self {
            queue: RefCell::new(records.into_iter().map(Ok).collect()),
            last: RefCell::new(None),
        }
    }

    pub fn push_error(&self, reason: &str) {
        self.queue.borrow_mut().push_back(Err(reason.to_string()));
    }

    pub fn push(&self, record: FeedRecord) {
        self.queue.borrow_mut().push_back(Ok(record));
    }
}

impl FeedPort for MockFeed {
    fn latest(&self) -> Result<FeedRecord, GhostError> {
        match self.queue.borrow_mut().pop_front() {
            Some(Ok(record)) => {
                *self.last.borrow_mut() = Some(record.clone());
                Ok(record)
            }
            Some(Err(reason)) => Err(GhostError::Feed { reason }),
            None => self.last.borrow().clone().ok_or_else(|| GhostError::Feed {
                reason: "feed is empty".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct MockStrategies {
    pub strategies: RefCell<Vec<StrategyDefinition>>,
    pub loads: Cell<usize>,
    pub fail: Cell<bool>,
}

impl MockStrategies {
    pub fn new(strategies: Vec<StrategyDefinition>) -> Self {
        Self {
            strategies: RefCell::new(strategies),
            ..Self::default()
        }
    }
}

impl StrategyPort for MockStrategies {
    fn load_strategies(&self) -> Result<Vec<StrategyDefinition>, GhostError> {
        self.loads.set(self.loads.get() + 1);
        if self.fail.get() {
            return Err(GhostError::StrategyLoad {
                source_name: "mock".to_string(),
                reason: "unavailable".to_string(),
            });
        }
        Ok(self.strategies.borrow().clone())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: RefCell<Vec<(String, String)>>,
    pub fail: Cell<bool>,
}

impl RecordingNotifier {
    pub fn texts_for(&self, owner: &str) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .filter(|(o, _)| o == owner)
            .map(|(_, t)| t.clone())
            .collect()
    }
}

impl NotifyPort for RecordingNotifier {
    fn notify(&self, owner_id: &str, text: &str) -> Result<(), GhostError> {
        if self.fail.get() {
            return Err(GhostError::Notify {
                reason: "channel unreachable".to_string(),
            });
        }
        self.sent
            .borrow_mut()
            .push((owner_id.to_string(), text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryResultLog {
    pub records: RefCell<Vec<ResultRecord>>,
    pub fail: Cell<bool>,
}

impl ResultLogPort for MemoryResultLog {
    fn append(&self, record: &ResultRecord) -> Result<(), GhostError> {
        if self.fail.get() {
            return Err(GhostError::DatabaseQuery {
                reason: "disk full".to_string(),
            });
        }
        self.records.borrow_mut().push(record.clone());
        Ok(())
    }
}
