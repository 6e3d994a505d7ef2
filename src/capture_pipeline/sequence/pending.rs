//! Ownership table for captures that have been requested but not finished.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::capture_pipeline::illumination::IlluminationPattern;

/// Identifier assigned to each capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct PendingCapture {
    pub pattern: IlluminationPattern,
    pub requested_at: Instant,
    pub exposures_taken: usize,
}

/// Records are inserted when a capture is requested and removed by the
/// capture's finish callback. Clones share the same table.
#[derive(Clone, Default)]
pub struct PendingCaptures {
    records: Arc<Mutex<HashMap<RequestId, PendingCapture>>>,
    next_id: Arc<AtomicU64>,
}

impl PendingCaptures {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<RequestId, PendingCapture>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, pattern: IlluminationPattern) -> RequestId {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.records().insert(
            id,
            PendingCapture {
                pattern,
                requested_at: Instant::now(),
                exposures_taken: 0,
            },
        );
        id
    }

    /// Counts one exposure against a pending capture and returns the new total.
    pub fn record_exposure(&self, id: RequestId) -> Option<usize> {
        self.records().get_mut(&id).map(|record| {
            record.exposures_taken += 1;
            record.exposures_taken
        })
    }

    pub fn get(&self, id: RequestId) -> Option<PendingCapture> {
        self.records().get(&id).cloned()
    }

    pub fn remove(&self, id: RequestId) -> Option<PendingCapture> {
        self.records().remove(&id)
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.records().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Drops every record, returning how many were still pending.
    pub fn clear(&self) -> usize {
        let mut records = self.records();
        let dropped = records.len();
        records.clear();
        dropped
    }
}
