use crate::models::{ListingRecord, RecordKey};
use std::collections::HashSet;

/// Tracks which listings were already emitted on the current page.
///
/// Only covers one page: a fresh ledger is used for every page, and
/// cross-page repeats are left to the crawler's repetition check.
#[derive(Debug, Default)]
pub struct DedupLedger {
    seen: HashSet<RecordKey>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time a record's key is seen
    pub fn admit(&mut self, record: &ListingRecord) -> bool {
        self.seen.insert(record.key())
    }

    pub fn reset(&mut self) {
        self.seen.clear();
    }
}
