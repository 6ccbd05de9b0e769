//! Scripted in-memory browser used by the crawl tests.

use crate::scrapers::traits::{BrowserPage, ElementSnapshot};
use crate::scrapers::types::ScrapeConfig;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// State of a results page's next-page control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextControl {
    /// Clicking moves to the following page
    Enabled,
    Disabled,
    Missing,
    /// Clicking does nothing, the address never changes
    Stuck,
}

/// One scripted results page
#[derive(Debug, Clone)]
pub struct FakeResults {
    url: String,
    cards: Vec<String>,
    batch: usize,
    slow: bool,
    pagination: bool,
    container: bool,
    failed_loads: usize,
    hangs: bool,
    stalls_scrolling: bool,
    wait_errors: bool,
    query_limit: Option<usize>,
    click_fails: bool,
    next_slot: usize,
    next: NextControl,
}

impl FakeResults {
    pub fn new(url: &str, cards: Vec<String>) -> Self {
        Self {
            url: url.to_string(),
            cards,
            batch: usize::MAX,
            slow: false,
            pagination: false,
            container: true,
            failed_loads: 0,
            hangs: false,
            stalls_scrolling: false,
            wait_errors: false,
            query_limit: None,
            click_fails: false,
            next_slot: 0,
            next: NextControl::Enabled,
        }
    }

    /// Reveal `n` cards initially and per scroll
    pub fn batch(mut self, n: usize) -> Self {
        self.batch = n;
        self
    }

    /// Only every second scroll reveals more cards
    pub fn slow_reveal(mut self) -> Self {
        self.slow = true;
        self
    }

    /// Show the pagination control once every card is revealed
    pub fn with_pagination(mut self) -> Self {
        self.pagination = true;
        self
    }

    /// The listing marker never shows up
    pub fn unloadable(mut self) -> Self {
        self.container = false;
        self
    }

    /// The listing marker is missing for the first `n` waits
    pub fn failing_loads(mut self, n: usize) -> Self {
        self.failed_loads = n;
        self
    }

    /// Waiting for the listing marker never returns
    pub fn hanging(mut self) -> Self {
        self.hangs = true;
        self
    }

    /// Scrolling never returns
    pub fn stalled_scrolling(mut self) -> Self {
        self.stalls_scrolling = true;
        self
    }

    /// Waiting for the listing marker fails with an error
    pub fn erroring_waits(mut self) -> Self {
        self.wait_errors = true;
        self
    }

    /// Card queries fail once `n` of them have succeeded
    pub fn failing_queries_after(mut self, n: usize) -> Self {
        self.query_limit = Some(n);
        self
    }

    /// Clicking the next control fails with an error
    pub fn failing_click(mut self) -> Self {
        self.click_fails = true;
        self
    }

    /// Serve the next control under `next_controls[slot]` only
    pub fn next_in_slot(mut self, slot: usize) -> Self {
        self.next_slot = slot;
        self
    }

    pub fn next(mut self, next: NextControl) -> Self {
        self.next = next;
        self
    }
}

#[derive(Debug)]
struct FakeState {
    pages: Vec<FakeResults>,
    current: usize,
    revealed: usize,
    pending_scrolls: usize,
    card_queries: usize,
    loads: usize,
    reloads: usize,
    clicks: usize,
    clicked: Vec<String>,
    scrolls: Vec<i64>,
    closed: usize,
}

impl FakeState {
    fn page(&self) -> &FakeResults {
        &self.pages[self.current]
    }

    fn show(&mut self, index: usize) {
        self.current = index;
        self.revealed = self.page().batch.min(self.page().cards.len());
        self.pending_scrolls = 0;
        self.card_queries = 0;
    }
}

/// In-memory [`BrowserPage`]; clones share state so tests can inspect
/// a page after handing it to the crawler
#[derive(Debug, Clone)]
pub struct FakePage {
    config: ScrapeConfig,
    state: Arc<Mutex<FakeState>>,
}

impl FakePage {
    pub fn new(pages: Vec<FakeResults>) -> Self {
        Self {
            config: ScrapeConfig::default(),
            state: Arc::new(Mutex::new(FakeState {
                pages,
                current: 0,
                revealed: 0,
                pending_scrolls: 0,
                card_queries: 0,
                loads: 0,
                reloads: 0,
                clicks: 0,
                clicked: Vec::new(),
                scrolls: Vec::new(),
                closed: 0,
            })),
        }
    }

    pub fn loads(&self) -> usize {
        self.state.lock().unwrap().loads
    }

    pub fn reloads(&self) -> usize {
        self.state.lock().unwrap().reloads
    }

    pub fn clicks(&self) -> usize {
        self.state.lock().unwrap().clicks
    }

    /// Selectors of every clicked snapshot, in order
    pub fn clicked(&self) -> Vec<String> {
        self.state.lock().unwrap().clicked.clone()
    }

    pub fn scrolls(&self) -> Vec<i64> {
        self.state.lock().unwrap().scrolls.clone()
    }

    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let index = state
            .pages
            .iter()
            .position(|p| p.url == url)
            .ok_or_else(|| anyhow!("unknown url {}", url))?;
        state.loads += 1;
        state.show(index);
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.reloads += 1;
        let current = state.current;
        state.show(current);
        Ok(())
    }

    async fn wait_visible(&self, selector: &str, _timeout: Duration) -> Result<bool> {
        if selector != self.config.listing_marker {
            return self.is_visible(selector).await;
        }

        let hangs = {
            let mut state = self.state.lock().unwrap();
            let current = state.current;
            let page = &mut state.pages[current];
            if page.wait_errors {
                return Err(anyhow!("lost connection while waiting"));
            }
            if page.failed_loads > 0 {
                page.failed_loads -= 1;
                return Ok(false);
            }
            if !page.hangs {
                return Ok(page.container);
            }
            true
        };

        if hangs {
            std::future::pending::<()>().await;
        }
        Ok(false)
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        let page = state.page();
        if selector == self.config.pagination {
            return Ok(page.pagination && state.revealed == page.cards.len());
        }
        Ok(false)
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>> {
        let mut state = self.state.lock().unwrap();

        if selector == self.config.card {
            if let Some(limit) = state.page().query_limit {
                if state.card_queries >= limit {
                    return Err(anyhow!("page detached while querying cards"));
                }
            }
            state.card_queries += 1;
        }

        let page = state.page();
        if selector == self.config.card {
            return Ok(page.cards[..state.revealed]
                .iter()
                .enumerate()
                .map(|(index, html)| ElementSnapshot {
                    selector: selector.to_string(),
                    index,
                    html: html.clone(),
                })
                .collect());
        }

        if selector == self.config.next_controls[page.next_slot] {
            let html = match page.next {
                NextControl::Missing => return Ok(Vec::new()),
                NextControl::Disabled => r#"<a aria-disabled="true">Next</a>"#,
                NextControl::Enabled | NextControl::Stuck => r#"<a aria-disabled="false">Next</a>"#,
            };
            return Ok(vec![ElementSnapshot {
                selector: selector.to_string(),
                index: 0,
                html: html.to_string(),
            }]);
        }

        Ok(Vec::new())
    }

    async fn scroll_by(&self, amount: i64) -> Result<()> {
        let stalls = self.state.lock().unwrap().page().stalls_scrolling;
        if stalls {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock().unwrap();
        state.scrolls.push(amount);
        state.pending_scrolls += 1;

        if state.page().slow && state.pending_scrolls < 2 {
            return Ok(());
        }
        state.pending_scrolls = 0;
        let page = state.page();
        let revealed = state.revealed.saturating_add(page.batch).min(page.cards.len());
        state.revealed = revealed;
        Ok(())
    }

    async fn click(&self, element: &ElementSnapshot) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.clicks += 1;
        state.clicked.push(element.selector.clone());
        if state.page().click_fails {
            return Err(anyhow!("element is not clickable"));
        }
        if state.page().next == NextControl::Enabled && state.current + 1 < state.pages.len() {
            let next = state.current + 1;
            state.show(next);
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().page().url.clone())
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().unwrap().closed += 1;
        Ok(())
    }
}

/// A listing card in the feed's markup
pub fn card_html(address: &str, price: &str) -> String {
    format!(
        concat!(
            r#"<article data-test="property-card">"#,
            r#"<address data-test="property-card-addr">{}</address>"#,
            r#"<span data-test="property-card-price">{}</span>"#,
            r#"<ul class="StyledPropertyCardHomeDetailsList-c11n-8-109-3__sc-1j0som5-0">"#,
            "<li>3 bds</li><li>2 ba</li><li>1,200 sqft</li></ul>",
            "</article>"
        ),
        address, price
    )
}

/// `count` distinct cards numbered from `start`
pub fn numbered_cards(start: usize, count: usize) -> Vec<String> {
    (start..start + count)
        .map(|i| card_html(&format!("{} Main St", i + 1), &format!("${},000", 100 + i)))
        .collect()
}
