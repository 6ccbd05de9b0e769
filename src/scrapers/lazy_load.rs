use crate::scrapers::traits::{BrowserPage, ElementSnapshot};
use crate::scrapers::types::{Pacing, ScrapeConfig, ScrollPolicy};
use anyhow::Result;
use tracing::debug;

/// How a lazy-loaded page finished rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Scrolling stopped producing new listings
    Stable,
    /// The pagination control came into view
    Halted,
}

/// Scrolls one results page until every listing card has rendered
pub struct LazyLoader<'a> {
    config: &'a ScrapeConfig,
    pacing: &'a Pacing,
    scroll: ScrollPolicy,
}

impl<'a> LazyLoader<'a> {
    pub fn new(config: &'a ScrapeConfig, pacing: &'a Pacing, scroll: ScrollPolicy) -> Self {
        Self {
            config,
            pacing,
            scroll,
        }
    }

    async fn card_count<P>(&self, page: &P) -> Result<usize>
    where
        P: BrowserPage + ?Sized,
    {
        Ok(page.query_all(&self.config.card).await?.len())
    }

    /// Drive the page to a fully rendered state.
    ///
    /// `on_new` sees every card exactly once, in document order, as soon as
    /// it becomes visible. Cards before the last observed count are never
    /// handed out again.
    pub async fn drive<P, F>(&self, page: &P, mut on_new: F) -> Result<LoadOutcome>
    where
        P: BrowserPage + ?Sized,
        F: FnMut(&ElementSnapshot),
    {
        let mut last_observed = 0;

        loop {
            let cards = page.query_all(&self.config.card).await?;
            let current = cards.len();

            for card in cards.iter().skip(last_observed) {
                on_new(card);
            }
            last_observed = current;

            match page.is_visible(&self.config.pagination).await {
                Ok(true) => {
                    debug!("Pagination visible after {} cards", current);
                    return Ok(LoadOutcome::Halted);
                }
                Ok(false) => {}
                Err(e) => debug!("Pagination check failed: {}", e),
            }

            page.scroll_by(self.scroll.next_amount()).await?;
            self.pacing.scroll_settle.wait().await;

            if self.card_count(page).await? == current {
                // One larger scroll before giving up on this page
                page.scroll_by(self.scroll.nudge).await?;
                self.pacing.scroll_settle.wait().await;

                if self.card_count(page).await? == current {
                    debug!("No new cards after scrolling, {} total", current);
                    return Ok(LoadOutcome::Stable);
                }
            }
        }
    }
}
