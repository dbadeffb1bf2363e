//! Bounded trend history.

#[cfg(test)]
#[path = "trend_test.rs"]
mod trend_test;

use std::collections::VecDeque;

use serde::{Serialize, Serializer};

/// One timestamped observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample<T> {
    /// Milliseconds since the Unix epoch.
    pub at: i64,
    pub value: T,
}

/// Ring buffer holding at most `capacity` samples, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Trend<T> {
    capacity: usize,
    items: VecDeque<Sample<T>>,
}

impl<T> Trend<T> {
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, items: VecDeque::with_capacity(capacity) }
    }

    /// Append, evicting the oldest sample once full.
    pub fn push(&mut self, at: i64, value: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(Sample { at, value });
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Sample<T>> {
        self.items.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample<T>> {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for Trend<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.items)
    }
}
