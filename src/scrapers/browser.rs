use crate::scrapers::traits::{BrowserPage, ElementSnapshot};
use crate::scrapers::types::ScrapeConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const VISIBLE_POLL: Duration = Duration::from_millis(250);

/// [`BrowserPage`] backed by a single headless Chrome tab
pub struct ChromePage {
    // Dropping the browser kills the Chrome process
    #[allow(dead_code)]
    browser: Browser,
    tab: Arc<Tab>,
}

/// Quote a CSS selector as a JavaScript string literal
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Every DevTools call blocks until Chrome answers; keep them off the
/// async worker so timers and the shutdown signal still fire
fn blocking<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    tokio::task::block_in_place(f)
}

impl ChromePage {
    /// Launch Chrome and open the tab the crawl will drive
    pub fn launch(config: &ScrapeConfig, headless: bool) -> Result<Self> {
        info!("Launching {} Chrome...", if headless { "headless" } else { "visible" });

        let options = LaunchOptions::default_builder()
            .headless(headless)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;
        tab.set_user_agent(&config.user_agent, None, None)
            .context("Failed to set user agent")?;

        Ok(Self { browser, tab })
    }

    fn eval_json(&self, script: &str) -> Result<serde_json::Value> {
        blocking(|| {
            let result = self.tab.evaluate(script, false)?;
            Ok(result.value.unwrap_or(serde_json::Value::Null))
        })
    }
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn goto(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        blocking(|| {
            self.tab.navigate_to(url)?;
            self.tab.wait_until_navigated()?;
            Ok(())
        })
    }

    async fn reload(&self) -> Result<()> {
        blocking(|| {
            self.tab.reload(false, None)?;
            self.tab.wait_until_navigated()?;
            Ok(())
        })
    }

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let started = Instant::now();
        loop {
            if self.is_visible(selector).await? {
                return Ok(true);
            }
            if started.elapsed() >= timeout {
                debug!("'{}' not visible after {:?}", selector, timeout);
                return Ok(false);
            }
            tokio::time::sleep(VISIBLE_POLL).await;
        }
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        let script = format!(
            r#"
            Array.from(document.querySelectorAll({})).some(el => {{
                const rect = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                return rect.width > 0 && rect.height > 0
                    && style.display !== 'none' && style.visibility !== 'hidden'
                    && rect.bottom > 0 && rect.top < window.innerHeight;
            }})
            "#,
            js_string(selector)
        );
        Ok(self.eval_json(&script)?.as_bool().unwrap_or(false))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>> {
        let script = format!(
            "JSON.stringify(Array.from(document.querySelectorAll({})).map(el => el.outerHTML))",
            js_string(selector)
        );
        let raw = self.eval_json(&script)?;
        let json = raw
            .as_str()
            .ok_or_else(|| anyhow!("Unexpected result querying '{}'", selector))?;
        let html: Vec<String> = serde_json::from_str(json)?;

        Ok(html
            .into_iter()
            .enumerate()
            .map(|(index, html)| ElementSnapshot {
                selector: selector.to_string(),
                index,
                html,
            })
            .collect())
    }

    async fn scroll_by(&self, amount: i64) -> Result<()> {
        self.eval_json(&format!("window.scrollBy(0, {})", amount))
            .context("Failed to scroll")?;
        Ok(())
    }

    async fn click(&self, element: &ElementSnapshot) -> Result<()> {
        blocking(|| {
            let elements = self.tab.find_elements(&element.selector)?;
            let target = elements
                .into_iter()
                .nth(element.index)
                .ok_or_else(|| anyhow!("'{}' #{} is gone", element.selector, element.index))?;
            target.click()?;
            Ok(())
        })
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.tab.get_url())
    }

    async fn close(&self) -> Result<()> {
        info!("Closing browser tab");
        blocking(|| {
            self.tab.close(true).context("Failed to close tab")?;
            Ok(())
        })
    }
}
