mod error;
mod location;
mod models;
mod scrapers;
mod storage;

use anyhow::Result;
use clap::Parser;
use dialoguer::{Confirm, Input, Select};
use location::{validate_location, SearchLocation};
use models::{ListingRecord, PagingMode};
use scrapers::{ChromePage, CrawlEvent, CrawlReport, Crawler, EventSink, ScrapeConfig};
use storage::{ExportFormat, Storage};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Collect property listings from a paginated search feed")]
struct Args {
    /// Location to search, as "City, State"
    #[arg(short, long)]
    location: Option<String>,

    /// Number of result pages to crawl, or "all"
    #[arg(short, long)]
    pages: Option<PagingMode>,

    /// Export format for the collected listings (asked for when omitted)
    #[arg(short, long, value_enum)]
    format: Option<ExportFormat>,

    /// Directory export files are written to
    #[arg(short, long, default_value = "data_exports")]
    output_dir: String,

    /// Show the browser window instead of running headless
    #[arg(long)]
    headful: bool,
}

/// Ask until the input validates or the user gives up
fn prompt_location() -> Result<SearchLocation> {
    loop {
        let query: String = Input::new()
            .with_prompt("Enter location to search (e.g. 'New Tampa, Florida' or 'Brooklyn, NY')")
            .interact_text()?;

        match validate_location(&query) {
            Ok(location) => return Ok(location),
            Err(e) => {
                warn!("{}", e);
                let retry = Confirm::new()
                    .with_prompt("Would you like to try another search?")
                    .default(true)
                    .interact()?;
                if !retry {
                    anyhow::bail!("Search cancelled by user");
                }
            }
        }
    }
}

fn prompt_pages() -> Result<PagingMode> {
    let input: String = Input::new()
        .with_prompt("How many pages to scrape? (Enter 'all' for all pages)")
        .default("2".to_string())
        .interact_text()?;
    Ok(input.parse()?)
}

fn prompt_export_format() -> Result<ExportFormat> {
    const CHOICES: [(&str, ExportFormat); 4] = [
        ("CSV", ExportFormat::Csv),
        ("JSON", ExportFormat::Json),
        ("Both CSV and JSON", ExportFormat::Both),
        ("Skip export", ExportFormat::Skip),
    ];

    let labels: Vec<&str> = CHOICES.iter().map(|(label, _)| *label).collect();
    let selection = Select::new()
        .with_prompt("Export format")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(CHOICES[selection].1)
}

fn log_event(event: &CrawlEvent) {
    match event {
        CrawlEvent::SessionStarted { url, mode } => {
            info!("Starting crawl of {} ({} pages)", url, mode);
            info!("Press Ctrl+C to stop at any time");
        }
        CrawlEvent::PageStarted { page } => info!("━━ Scraping page {} ━━", page),
        CrawlEvent::PageReloading { page } => {
            warn!("Page {} elements not found, reloading...", page)
        }
        CrawlEvent::PageCompleted { page, count, total } => {
            info!("✓ Page {}: scraped {} properties ({} total)", page, count, total)
        }
        CrawlEvent::RepetitionDetected { page } => {
            warn!("Page {} repeats the previous page, stopping", page)
        }
        CrawlEvent::NavigationEnded { page, reason } => {
            info!("No page after {}: {:?}", page, reason)
        }
        CrawlEvent::SessionFinished { pages, total, status } => {
            info!("━━━ Scraping {}: {} pages, {} properties ━━━", status, pages, total)
        }
    }
}

fn display_table(records: &[ListingRecord]) {
    if records.is_empty() {
        println!("No properties to display.");
        return;
    }

    println!(
        "{:>4}  {:<45} {:<14} {:<7} {:<6} {:<10}",
        "#", "Address", "Price", "Beds", "Baths", "Sq.Ft."
    );
    for (i, record) in records.iter().enumerate() {
        println!(
            "{:>4}  {:<45} {:<14} {:<7} {:<6} {:<10}",
            i + 1,
            record.address,
            record.price,
            record.beds,
            record.baths,
            record.sqft
        );
    }
    println!();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; only finish when the crawl does
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🏠 Listing Scout");

    let args = Args::parse();

    let location = match &args.location {
        Some(query) => validate_location(query)?,
        None => prompt_location()?,
    };
    info!("Using location: {} ({})", location.display, location.url);

    let mode = match args.pages {
        Some(mode) => mode,
        None => prompt_pages()?,
    };

    let config = ScrapeConfig::default();
    let page = ChromePage::launch(&config, !args.headful)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            log_event(&event);
        }
    });

    let crawler = Crawler::new(page, config)?.with_events(EventSink::new(tx));
    let report: CrawlReport = crawler.run(&location.url, mode, shutdown_signal()).await;
    let _ = reporter.await;

    display_table(&report.records);
    info!(
        "Total pages scraped: {}, total properties found: {} ({})",
        report.pages_scraped, report.total_records, report.status
    );

    if report.records.is_empty() {
        info!("No properties to export.");
        return Ok(());
    }

    let format = match args.format {
        Some(format) => format,
        None => prompt_export_format()?,
    };
    if format == ExportFormat::Skip {
        info!("Export skipped.");
        return Ok(());
    }

    let storage = Storage::new(&args.output_dir).await?;
    storage.export(format, &report.records, &location.display).await?;

    Ok(())
}
