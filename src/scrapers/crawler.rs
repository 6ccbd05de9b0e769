use crate::error::ScoutError;
use crate::models::{CrawlSession, ListingRecord, PageResult, PagingMode};
use crate::scrapers::events::{CrawlEvent, EventSink};
use crate::scrapers::extract::FieldExtractor;
use crate::scrapers::ledger::DedupLedger;
use crate::scrapers::lazy_load::LazyLoader;
use crate::scrapers::pagination::{account_page, Advance, PageVerdict, Paginator};
use crate::scrapers::traits::BrowserPage;
use crate::scrapers::types::{Pacing, ScrapeConfig, ScrollPolicy};
use anyhow::{Context, Result};
use std::fmt;
use std::future::Future;
use tracing::{debug, info, warn};

/// How a crawl ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlStatus {
    /// Ran out of pages, hit the page bound, or detected a repeat
    Completed,
    /// A results page could not be loaded
    Aborted(String),
    /// Shutdown was requested while crawling
    Cancelled,
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlStatus::Completed => f.write_str("completed"),
            CrawlStatus::Aborted(reason) => write!(f, "aborted ({})", reason),
            CrawlStatus::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Everything a crawl produced, including partial results
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub status: CrawlStatus,
    pub pages_scraped: usize,
    pub total_records: usize,
    pub records: Vec<ListingRecord>,
}

/// Drives a browser page through the paginated, lazy-loaded results feed
pub struct Crawler<P: BrowserPage> {
    page: P,
    config: ScrapeConfig,
    pacing: Pacing,
    scroll: ScrollPolicy,
    extractor: FieldExtractor,
    events: EventSink,
}

impl<P: BrowserPage> Crawler<P> {
    pub fn new(page: P, config: ScrapeConfig) -> Result<Self> {
        let extractor = FieldExtractor::new(&config).context("Failed to compile card selectors")?;

        Ok(Self {
            page,
            config,
            pacing: Pacing::default(),
            scroll: ScrollPolicy::default(),
            extractor,
            events: EventSink::disabled(),
        })
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Crawl from `start_url` until the results run out, the paging bound
    /// is reached, or `shutdown` resolves.
    ///
    /// The browser page is closed on every exit path and records gathered
    /// before an abort or cancellation are returned.
    pub async fn run<F>(self, start_url: &str, mode: PagingMode, shutdown: F) -> CrawlReport
    where
        F: Future<Output = ()>,
    {
        let mut session = CrawlSession::new();
        self.events.emit(CrawlEvent::SessionStarted {
            url: start_url.to_string(),
            mode,
        });

        let status = tokio::select! {
            result = self.crawl(&mut session, start_url, mode) => match result {
                Ok(()) => CrawlStatus::Completed,
                Err(e) => {
                    warn!("Crawl aborted: {:#}", e);
                    CrawlStatus::Aborted(e.to_string())
                }
            },
            _ = shutdown => {
                info!("Shutdown requested, keeping records gathered so far");
                CrawlStatus::Cancelled
            }
        };

        if let Err(e) = self.page.close().await {
            warn!("Failed to close browser: {:#}", e);
        }

        self.events.emit(CrawlEvent::SessionFinished {
            pages: session.pages_completed,
            total: session.all_records.len(),
            status: status.to_string(),
        });

        CrawlReport {
            status,
            pages_scraped: session.pages_completed,
            total_records: session.total_records,
            records: session.all_records,
        }
    }

    async fn crawl(&self, session: &mut CrawlSession, start_url: &str, mode: PagingMode) -> Result<()> {
        let paginator = Paginator::new(&self.config);
        let mut ledger = DedupLedger::new();

        while session.should_continue && mode.allows(session.current_page) {
            let page_number = session.current_page;
            self.events.emit(CrawlEvent::PageStarted { page: page_number });

            self.load(page_number, start_url).await?;

            let start = session.all_records.len();
            self.scrape_page(page_number, &mut ledger, &mut session.all_records)
                .await;
            let result = PageResult::new(page_number, session.all_records[start..].to_vec());
            debug!("Page {} yielded {} records", result.page_number, result.record_count);
            session.pages_completed += 1;

            let verdict = account_page(session, &result);
            if verdict == PageVerdict::Repeated {
                self.events.emit(CrawlEvent::RepetitionDetected { page: page_number });
            }
            self.events.emit(CrawlEvent::PageCompleted {
                page: page_number,
                count: result.record_count,
                total: session.total_records,
            });

            if !session.should_continue || !mode.allows_after(page_number) {
                break;
            }

            match paginator.advance(&self.page).await {
                Advance::Advanced => session.current_page += 1,
                Advance::Ended(reason) => {
                    debug!("Pagination ended on page {}: {:?}", page_number, reason);
                    self.events.emit(CrawlEvent::NavigationEnded {
                        page: page_number,
                        reason,
                    });
                    session.should_continue = false;
                }
            }
        }

        Ok(())
    }

    /// Bring a page to the point where listings are visible.
    ///
    /// Later pages get one reload before the session gives up.
    async fn load(&self, page_number: usize, start_url: &str) -> Result<()> {
        if page_number == 1 {
            self.pacing.before_first_load.wait().await;
            self.page
                .goto(start_url)
                .await
                .with_context(|| format!("Failed to open {}", start_url))?;
            self.pacing.after_first_load.wait().await;
        } else {
            self.pacing.before_next_page.wait().await;
        }

        self.pacing.after_doc_load_for(page_number).wait().await;

        if self.listings_visible().await {
            return Ok(());
        }

        if page_number > 1 {
            warn!("Listings missing on page {}, reloading", page_number);
            self.events.emit(CrawlEvent::PageReloading { page: page_number });
            if let Err(e) = self.page.reload().await {
                warn!("Reload failed: {:#}", e);
            }
            self.pacing.reload_settle.wait().await;

            if self.listings_visible().await {
                return Ok(());
            }
        }

        Err(ScoutError::PageLoad { page: page_number }.into())
    }

    async fn listings_visible(&self) -> bool {
        match self
            .page
            .wait_visible(&self.config.listing_marker, self.config.load_timeout)
            .await
        {
            Ok(visible) => visible,
            Err(e) => {
                debug!("Waiting for listings failed: {:#}", e);
                false
            }
        }
    }

    /// Lazy-load one page, appending its de-duplicated records to `records`
    /// as soon as each card is extracted
    async fn scrape_page(
        &self,
        page_number: usize,
        ledger: &mut DedupLedger,
        records: &mut Vec<ListingRecord>,
    ) {
        let loader = LazyLoader::new(&self.config, &self.pacing, self.scroll);
        ledger.reset();

        let outcome = loader
            .drive(&self.page, |card| match self.extractor.extract(&card.html) {
                Some(record) => {
                    if ledger.admit(&record) {
                        records.push(record);
                    } else {
                        debug!("Duplicate listing on page {}: {}", page_number, record.key());
                    }
                }
                None => debug!("Skipping card {} without price or address", card.index),
            })
            .await;

        match outcome {
            Ok(outcome) => debug!("Page {} finished loading: {:?}", page_number, outcome),
            Err(e) => warn!("Stopped scrolling page {} early: {:#}", page_number, e),
        }
    }
}
