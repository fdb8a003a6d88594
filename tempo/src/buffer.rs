// Tempo - A coalescing Statsd client for Rust!
//
// Copyright 2026 Tempo Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::types::MetricSample;
use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Aggregate of counter increments for a single metric name.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedCounter {
    name: String,
    count: i64,
    sample_rate: f32,
}

impl BufferedCounter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Counter metric to send for this entry.
    pub fn to_sample(&self) -> MetricSample {
        MetricSample::count(self.name.clone(), self.count, self.sample_rate)
    }
}

/// Coalesces counter increments for the same metric name between flushes.
///
/// There is at most one entry per metric name until the buffer is drained.
/// The buffer is expected to hold a handful of distinct names per flush
/// interval so entries are found with a linear scan.
///
/// A repeated increment of a name that is already buffered adds exactly one
/// to the existing entry, whatever count was passed, saturating at
/// `i64::MAX`. The count (and sample rate) given to the first increment of a
/// name seeds the entry.
///
/// Once closed, the buffer rejects new increments.
#[derive(Debug, Default)]
pub struct CounterBuffer {
    entries: Mutex<Entries>,
}

#[derive(Debug, Default)]
struct Entries {
    counters: Vec<BufferedCounter>,
    closed: bool,
}

impl CounterBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer an increment, returning `false` if the buffer is closed.
    pub fn add(&self, name: &str, count: i64, sample_rate: f32) -> bool {
        let mut entries = self.lock();
        if entries.closed {
            return false;
        }

        if let Some(existing) = entries.counters.iter_mut().find(|e| e.name == name) {
            existing.count = existing.count.saturating_add(1);
            return true;
        }

        entries.counters.push(BufferedCounter {
            name: name.to_owned(),
            count,
            sample_rate,
        });
        true
    }

    /// Remove and return everything buffered so far.
    pub fn drain(&self) -> Vec<BufferedCounter> {
        mem::take(&mut self.lock().counters)
    }

    /// Reject any further increments and return everything buffered so far.
    pub fn close(&self) -> Vec<BufferedCounter> {
        let mut entries = self.lock();
        entries.closed = true;
        mem::take(&mut entries.counters)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().counters.is_empty()
    }

    // Nothing done while holding the lock can leave the entries half updated
    // so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
