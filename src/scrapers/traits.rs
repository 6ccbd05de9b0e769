use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Snapshot of one rendered element.
///
/// `selector` and `index` locate the live element again (for clicks);
/// `html` is its outer HTML at the moment it was queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSnapshot {
    pub selector: String,
    pub index: usize,
    pub html: String,
}

/// Browser operations the crawler needs from a rendering engine.
///
/// Everything the crawl logic knows about the page goes through this trait,
/// so a scripted fake can stand in for Chrome in tests.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate to `url` and wait for the navigation to finish
    async fn goto(&self, url: &str) -> Result<()>;

    /// Reload the current page
    async fn reload(&self) -> Result<()>;

    /// Wait until an element matching `selector` is visible.
    /// Returns `false` when `timeout` elapses first.
    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Whether an element matching `selector` is currently visible
    async fn is_visible(&self, selector: &str) -> Result<bool>;

    /// Snapshot every element currently matching `selector`, in document order
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>>;

    /// Scroll the viewport down by `amount` pixels
    async fn scroll_by(&self, amount: i64) -> Result<()>;

    /// Click the live element a snapshot was taken from
    async fn click(&self, element: &ElementSnapshot) -> Result<()>;

    /// Address the tab currently shows
    async fn current_url(&self) -> Result<String>;

    /// Release the browser. Called exactly once when a crawl ends.
    async fn close(&self) -> Result<()>;
}
