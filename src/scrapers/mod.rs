pub mod browser;
pub mod crawler;
pub mod events;
pub mod extract;
pub mod lazy_load;
pub mod ledger;
pub mod pagination;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use browser::ChromePage;
pub use crawler::{CrawlReport, Crawler};
pub use events::{CrawlEvent, EventSink};
pub use types::ScrapeConfig;
