//! Live open-tracker registry, keyed by `(owner_id, strategy_id)`.

use super::gale::GaleTracker;
use std::collections::BTreeMap;

pub type TrackerKey = (String, String);

#[derive(Debug, Clone, Default)]
pub struct TrackerRegistry {
    trackers: BTreeMap<TrackerKey, GaleTracker>,
}

impl TrackerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, owner_id: &str, strategy_id: &str) -> bool {
        self.trackers
            .get(&(owner_id.to_string(), strategy_id.to_string()))
            .is_some_and(|t| t.is_open())
    }

    /// Register an open tracker. Returns false, leaving the registry untouched,
    /// when the pair already has one.
    pub fn insert(&mut self, tracker: GaleTracker) -> bool {
        let key = (tracker.owner_id.clone(), tracker.strategy_id.clone());
        if self.trackers.contains_key(&key) {
            return false;
        }
        self.trackers.insert(key, tracker);
        true
    }

    pub fn get(&self, owner_id: &str, strategy_id: &str) -> Option<&GaleTracker> {
        self.trackers
            .get(&(owner_id.to_string(), strategy_id.to_string()))
    }

    pub fn get_mut(&mut self, key: &TrackerKey) -> Option<&mut GaleTracker> {
        self.trackers.get_mut(key)
    }

    pub fn remove(&mut self, key: &TrackerKey) -> Option<GaleTracker> {
        self.trackers.remove(key)
    }

    pub fn keys(&self) -> Vec<TrackerKey> {
        self.trackers.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GaleTracker> {
        self.trackers.values()
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}
