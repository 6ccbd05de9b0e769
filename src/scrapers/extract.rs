use crate::models::{ListingRecord, PLACEHOLDER, SENTINEL};
use crate::scrapers::types::ScrapeConfig;
use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Turns one rendered listing card into a [`ListingRecord`]
pub struct FieldExtractor {
    price: Selector,
    address: Selector,
    details_list: Selector,
    detail_item: Selector,
    description: Selector,
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("invalid selector '{}': {:?}", selector, e))
}

/// Collapse an element's text nodes into a single trimmed line
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Map missing, blank and placeholder values to the sentinel
fn or_sentinel(value: Option<String>) -> String {
    match value {
        Some(v) if !v.is_empty() && v != PLACEHOLDER => v,
        _ => SENTINEL.to_string(),
    }
}

fn strip_beds(text: &str) -> String {
    let beds = text.replace("bds", "").trim().to_string();
    if beds != "Studio" && beds.contains("bd") {
        beds.replace("bd", "").trim().to_string()
    } else {
        beds
    }
}

fn strip_baths(text: &str) -> String {
    text.replace("ba", "").trim().to_string()
}

fn strip_sqft(text: &str) -> String {
    text.replace("sqft", "").trim().to_string()
}

impl FieldExtractor {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        Ok(Self {
            price: compile(&config.price)?,
            address: compile(&config.address)?,
            details_list: compile(&config.details_list)?,
            detail_item: compile("li")?,
            description: compile(&config.description)?,
        })
    }

    /// Extract a record from a card's outer HTML.
    ///
    /// Returns `None` when the card has no price or no address. Optional
    /// fields never cause a skip; each one falls back to the sentinel.
    pub fn extract(&self, card_html: &str) -> Option<ListingRecord> {
        let fragment = Html::parse_fragment(card_html);
        let root = fragment.root_element();

        let price = self.required_text(root, &self.price)?;
        let address = self.required_text(root, &self.address)?;

        let details = self.detail_items(root);
        let beds = details.first().map(|t| strip_beds(t));
        let baths = details.get(1).map(|t| strip_baths(t));
        let sqft = details.get(2).map(|t| strip_sqft(t));

        Some(ListingRecord {
            address,
            price,
            beds: or_sentinel(beds),
            baths: or_sentinel(baths),
            sqft: or_sentinel(sqft),
            property_type: or_sentinel(self.property_type(root)),
        })
    }

    fn required_text(&self, root: ElementRef<'_>, selector: &Selector) -> Option<String> {
        let text = root.select(selector).next().map(element_text)?;
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn detail_items(&self, root: ElementRef<'_>) -> Vec<String> {
        match root.select(&self.details_list).next() {
            Some(list) => list.select(&self.detail_item).map(element_text).collect(),
            None => {
                debug!("Card has no details list");
                Vec::new()
            }
        }
    }

    /// Trailing segment of the description block after its last hyphen
    fn property_type(&self, root: ElementRef<'_>) -> Option<String> {
        let block = root.select(&self.description).next()?;
        let text = block
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        text.rsplit('-').next().map(|s| s.trim().to_string())
    }
}
