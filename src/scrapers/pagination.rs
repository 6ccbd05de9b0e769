use crate::models::{CrawlSession, PageResult};
use crate::scrapers::events::NavigationEnd;
use crate::scrapers::traits::{BrowserPage, ElementSnapshot};
use crate::scrapers::types::ScrapeConfig;
use anyhow::Result;
use scraper::{ElementRef, Html};
use tracing::debug;

/// Result of comparing a finished page against the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageVerdict {
    /// New content; keep paginating
    Fresh,
    /// The site served the previous page again
    Repeated,
}

/// Account a finished page in the session and detect a looping site.
///
/// Only the key of the last record is compared with the previous page's
/// last key. The page's count is added to the running total exactly once
/// either way; a repeat also clears `should_continue`.
pub fn account_page(session: &mut CrawlSession, result: &PageResult) -> PageVerdict {
    if let Some(key) = result.last_key() {
        if session.last_key_of_previous_page.as_ref() == Some(&key) {
            session.total_records += result.record_count;
            session.should_continue = false;
            return PageVerdict::Repeated;
        }
        session.last_key_of_previous_page = Some(key);
    }

    session.total_records += result.record_count;
    PageVerdict::Fresh
}

/// Outcome of trying to move to the next results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Advanced,
    Ended(NavigationEnd),
}

/// Finds and follows the next-page control
pub struct Paginator<'a> {
    config: &'a ScrapeConfig,
}

impl<'a> Paginator<'a> {
    pub fn new(config: &'a ScrapeConfig) -> Self {
        Self { config }
    }

    /// First control found by the configured fallback selectors
    async fn find_next<P>(&self, page: &P) -> Result<Option<ElementSnapshot>>
    where
        P: BrowserPage + ?Sized,
    {
        for selector in &self.config.next_controls {
            if let Some(control) = page.query_all(selector).await?.into_iter().next() {
                debug!("Next control matched '{}'", selector);
                return Ok(Some(control));
            }
        }
        Ok(None)
    }

    async fn wait_for_url_change<P>(&self, page: &P, before: &str) -> Result<bool>
    where
        P: BrowserPage + ?Sized,
    {
        let poll = async {
            loop {
                if page.current_url().await? != before {
                    return Ok::<_, anyhow::Error>(());
                }
                tokio::time::sleep(self.config.url_poll_interval).await;
            }
        };

        match tokio::time::timeout(self.config.navigation_timeout, poll).await {
            Ok(result) => result.map(|_| true),
            Err(_) => Ok(false),
        }
    }

    async fn try_advance<P>(&self, page: &P) -> Result<Advance>
    where
        P: BrowserPage + ?Sized,
    {
        let next = match self.find_next(page).await? {
            Some(next) => next,
            None => return Ok(Advance::Ended(NavigationEnd::NoNextControl)),
        };

        if is_disabled(&next) {
            return Ok(Advance::Ended(NavigationEnd::NextDisabled));
        }

        let before = page.current_url().await?;
        page.click(&next).await?;

        if self.wait_for_url_change(page, &before).await? {
            Ok(Advance::Advanced)
        } else {
            Ok(Advance::Ended(NavigationEnd::NavigationFailed(
                "address did not change after clicking next".to_string(),
            )))
        }
    }

    /// Click through to the next page.
    ///
    /// Every failure here means the results ran out, so errors are folded
    /// into [`NavigationEnd::NavigationFailed`] rather than returned.
    pub async fn advance<P>(&self, page: &P) -> Advance
    where
        P: BrowserPage + ?Sized,
    {
        match self.try_advance(page).await {
            Ok(advance) => advance,
            Err(e) => Advance::Ended(NavigationEnd::NavigationFailed(e.to_string())),
        }
    }
}

/// Whether a control snapshot is marked disabled
fn is_disabled(control: &ElementSnapshot) -> bool {
    let fragment = Html::parse_fragment(&control.html);
    let element = fragment
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .next();

    match element {
        Some(el) => {
            el.value().attr("aria-disabled") == Some("true") || el.value().attr("disabled").is_some()
        }
        None => false,
    }
}
