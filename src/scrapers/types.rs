use rand::Rng;
use std::time::Duration;

/// CSS selectors and timeouts for the listing results feed
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// One listing card in the results feed
    pub card: String,
    /// Marker that must become visible before a page counts as loaded
    pub listing_marker: String,
    /// Price element inside a card
    pub price: String,
    /// Address element inside a card
    pub address: String,
    /// Ordered beds / baths / area list inside a card
    pub details_list: String,
    /// Descriptive text block whose trailing segment names the property type
    pub description: String,
    /// Pagination region; seeing it means the page is fully loaded
    pub pagination: String,
    /// Next-page controls, most specific first
    pub next_controls: Vec<String>,
    /// How long to wait for `listing_marker`
    pub load_timeout: Duration,
    /// How long to wait for the address to change after clicking next
    pub navigation_timeout: Duration,
    /// How often to re-check the address while waiting
    pub url_poll_interval: Duration,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            card: r#"[data-test="property-card"]"#.to_string(),
            listing_marker: r#"[data-testid="search-page-list-container"], [data-test="property-card"]"#
                .to_string(),
            price: r#"[data-test="property-card-price"]"#.to_string(),
            address: r#"address[data-test="property-card-addr"]"#.to_string(),
            details_list: r#"ul[class*="StyledPropertyCardHomeDetailsList"]"#.to_string(),
            description: "div.StyledPropertyCardDataArea-c11n-8-109-3__sc-10i1r6-0".to_string(),
            pagination: ".search-pagination".to_string(),
            next_controls: vec![
                r#"a[rel="next"]"#.to_string(),
                r#"a[title="Next page"]"#.to_string(),
                ".search-pagination a:last-child".to_string(),
            ],
            load_timeout: Duration::from_secs(15),
            navigation_timeout: Duration::from_secs(15),
            url_poll_interval: Duration::from_millis(250),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
        }
    }
}

/// Inclusive range a randomized delay is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    pub fn millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }

    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }

    /// Sleep for a random duration within the range
    pub async fn wait(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Anti-detection pacing between page loads and scrolls
#[derive(Debug, Clone)]
pub struct Pacing {
    pub before_first_load: DelayRange,
    pub after_first_load: DelayRange,
    pub before_next_page: DelayRange,
    pub after_doc_load: DelayRange,
    pub after_doc_load_later: DelayRange,
    pub scroll_settle: DelayRange,
    pub reload_settle: DelayRange,
}

impl Pacing {
    /// No delays at all; the control flow is unchanged
    pub fn none() -> Self {
        Self {
            before_first_load: DelayRange::ZERO,
            after_first_load: DelayRange::ZERO,
            before_next_page: DelayRange::ZERO,
            after_doc_load: DelayRange::ZERO,
            after_doc_load_later: DelayRange::ZERO,
            scroll_settle: DelayRange::ZERO,
            reload_settle: DelayRange::ZERO,
        }
    }

    /// Settle delay once a page's document is loaded
    pub fn after_doc_load_for(&self, page: usize) -> DelayRange {
        if page > 1 {
            self.after_doc_load_later
        } else {
            self.after_doc_load
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            before_first_load: DelayRange::millis(2_000, 4_000),
            after_first_load: DelayRange::millis(3_000, 6_000),
            before_next_page: DelayRange::millis(1_000, 2_000),
            after_doc_load: DelayRange::millis(1_000, 2_000),
            after_doc_load_later: DelayRange::millis(1_000, 3_000),
            scroll_settle: DelayRange::millis(700, 1_500),
            reload_settle: DelayRange::millis(3_000, 5_000),
        }
    }
}

/// Scroll distances used while lazy-loading a page
#[derive(Debug, Clone, Copy)]
pub struct ScrollPolicy {
    pub base: i64,
    pub jitter: i64,
    /// Larger scroll issued once before declaring a page stable
    pub nudge: i64,
}

impl ScrollPolicy {
    pub fn next_amount(&self) -> i64 {
        if self.jitter <= 0 {
            return self.base;
        }
        self.base + rand::thread_rng().gen_range(0..=self.jitter)
    }
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            base: 1_000,
            jitter: 100,
            nudge: 1_500,
        }
    }
}
