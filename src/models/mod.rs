use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ScoutError;

/// Value substituted for any field that is absent or rendered as a placeholder
pub const SENTINEL: &str = "N/A";

/// Placeholder token the results feed renders for unknown values
pub const PLACEHOLDER: &str = "--";

/// One property listing as displayed in the results feed.
///
/// Every field is kept as the site formatted it; prices and areas are not
/// parsed into numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingRecord {
    pub address: String,
    pub price: String,
    pub beds: String,
    pub baths: String,
    pub sqft: String,
    pub property_type: String,
}

impl ListingRecord {
    /// Identity used for de-duplication and repetition detection
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.address, &self.price)
    }
}

/// Deterministic identity of a listing, built from its address and price
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn new(address: &str, price: &str) -> Self {
        Self(format!("{}|{}", address, price))
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Records produced by a single results page
#[derive(Debug, Clone)]
pub struct PageResult {
    pub page_number: usize,
    pub records: Vec<ListingRecord>,
    pub record_count: usize,
}

impl PageResult {
    pub fn new(page_number: usize, records: Vec<ListingRecord>) -> Self {
        let record_count = records.len();
        Self {
            page_number,
            records,
            record_count,
        }
    }

    pub fn last_key(&self) -> Option<RecordKey> {
        self.records.last().map(ListingRecord::key)
    }
}

/// How many result pages a session may visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingMode {
    /// Stop after `n` pages
    Bounded(usize),
    /// Keep going until the site runs out of results
    Unbounded,
}

impl PagingMode {
    /// Whether `page` may still be loaded
    pub fn allows(&self, page: usize) -> bool {
        match self {
            PagingMode::Bounded(n) => page <= *n,
            PagingMode::Unbounded => true,
        }
    }

    /// Whether another page may follow `page`
    pub fn allows_after(&self, page: usize) -> bool {
        self.allows(page + 1)
    }
}

impl fmt::Display for PagingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagingMode::Bounded(n) => write!(f, "{}", n),
            PagingMode::Unbounded => f.write_str("all"),
        }
    }
}

impl FromStr for PagingMode {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(PagingMode::Unbounded);
        }
        match s.parse::<usize>() {
            Ok(0) => Err(ScoutError::InvalidPaging(
                "page count must be at least 1".to_string(),
            )),
            Ok(n) => Ok(PagingMode::Bounded(n)),
            Err(_) => Err(ScoutError::InvalidPaging(format!(
                "'{}' is not a number or 'all'",
                s
            ))),
        }
    }
}

/// Mutable state of one crawl, owned by the crawler
#[derive(Debug, Clone)]
pub struct CrawlSession {
    pub current_page: usize,
    pub total_records: usize,
    pub all_records: Vec<ListingRecord>,
    pub last_key_of_previous_page: Option<RecordKey>,
    pub should_continue: bool,
    /// Pages whose listings were fully collected
    pub pages_completed: usize,
}

impl CrawlSession {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            total_records: 0,
            all_records: Vec::new(),
            last_key_of_previous_page: None,
            should_continue: true,
            pages_completed: 0,
        }
    }
}

impl Default for CrawlSession {
    fn default() -> Self {
        Self::new()
    }
}
