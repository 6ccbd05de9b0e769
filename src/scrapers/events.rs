use crate::models::PagingMode;
use tokio::sync::mpsc::UnboundedSender;

/// Why pagination stopped without an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEnd {
    /// No next-page control on the page
    NoNextControl,
    /// The next-page control is marked disabled
    NextDisabled,
    /// Clicking next failed or the address never changed
    NavigationFailed(String),
}

/// Progress notifications emitted while crawling
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    SessionStarted { url: String, mode: PagingMode },
    PageStarted { page: usize },
    PageReloading { page: usize },
    PageCompleted { page: usize, count: usize, total: usize },
    RepetitionDetected { page: usize },
    NavigationEnded { page: usize, reason: NavigationEnd },
    SessionFinished { pages: usize, total: usize, status: String },
}

/// Optional channel the crawler reports progress into
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<CrawlEvent>>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<CrawlEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that drops every event
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: CrawlEvent) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is listening any more
            let _ = tx.send(event);
        }
    }
}
