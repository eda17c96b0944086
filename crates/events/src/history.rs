//! Bounded event history.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use closet_core::Attributes;

/// Summary of one publication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventHistoryEntry {
    pub event_id: Uuid,
    pub event: String,
    pub payload: Attributes,
    pub timestamp: DateTime<Utc>,
    /// Subscribers whose handler completed without error, in delivery order.
    pub notified: Vec<String>,
}

/// FIFO ring buffer of [`EventHistoryEntry`] that evicts the oldest entry once
/// `capacity` is reached.
#[derive(Debug, Clone)]
pub struct EventHistory {
    entries: VecDeque<EventHistoryEntry>,
    capacity: usize,
}

impl EventHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the capacity, evicting the oldest entries if it shrinks.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.evict();
    }

    pub fn push(&mut self, entry: EventHistoryEntry) {
        self.entries.push_back(entry);
        self.evict();
    }

    fn evict(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The most recent `limit` entries, oldest first. `None` or `Some(0)`
    /// returns everything.
    pub fn recent(&self, limit: Option<usize>) -> Vec<EventHistoryEntry> {
        let skip = match limit {
            Some(n) if n > 0 => self.entries.len().saturating_sub(n),
            _ => 0,
        };
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Entry counts per event name.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.event.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Name with the highest count. Ties go to the name recorded first.
    pub fn most_fired(&self) -> Option<String> {
        let counts = self.counts();
        let mut best: Option<(&str, usize)> = None;
        for entry in &self.entries {
            let count = counts.get(&entry.event).copied().unwrap_or(0);
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((entry.event.as_str(), count));
            }
        }
        best.map(|(name, _)| name.to_string())
    }
}
