//! Block-filter polling cursors.
//!
//! A filter remembers the next block number it has not yet reported. Each
//! poll compares that cursor to the current best block, reports the ids of
//! every block in between, and advances the cursor past the reported range.
//! The cursor only ever increases; no block number is reported twice.
//!
//! `advance` is pure so the monotonicity invariant is testable without any
//! I/O. The table serializes concurrent polls of the same filter id with a
//! per-filter async mutex; the read-cursor → fetch-range → advance-cursor
//! sequence must be one critical section.

use std::ops::RangeInclusive;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Per-filter cursor: the next block number not yet reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockFilter {
    pub next: u64,
}

/// Compute one poll step: the new cursor and the range of block numbers to
/// report, oldest first. Returns no range when the chain has not advanced.
pub fn advance(next: u64, best: u64) -> (u64, Option<RangeInclusive<u64>>) {
    if best >= next {
        (best + 1, Some(next..=best))
    } else {
        (next, None)
    }
}

/// Registry of active block filters, keyed by opaque id.
#[derive(Debug, Default)]
pub struct FilterTable {
    filters: DashMap<String, Arc<Mutex<BlockFilter>>>,
}

impl FilterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter whose first poll reports blocks after `best`.
    pub fn insert(&self, best: u64) -> String {
        let id = format!("0x{}", Uuid::new_v4().simple());
        self.filters
            .insert(id.clone(), Arc::new(Mutex::new(BlockFilter { next: best + 1 })));
        id
    }

    /// Look up a filter's shared cursor.
    pub fn get(&self, id: &str) -> Option<Arc<Mutex<BlockFilter>>> {
        self.filters.get(id).map(|entry| entry.value().clone())
    }

    /// Remove a filter. Idempotent; returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.filters.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
