use std::sync::Arc;

use anyhow::Result;
use scraper::{Html, Selector};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::dedupe::dedupe;
use crate::extractor::Extractor;
use crate::fetcher::{HttpFetcher, SnapshotFetcher};
use crate::models::Show;
use crate::persist::Persister;
use crate::traits::{ExtractionRules, Fetcher};

const SUMMARY_LIMIT: usize = 5;

/// One scrape pipeline: fetch, extract, dedupe, persist
#[derive(Clone)]
pub struct ShowFinder {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<Extractor>,
    persister: Persister,
    target_url: String,
}

impl ShowFinder {
    pub fn new(config: &Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = match &config.snapshot {
            Some(path) => Arc::new(SnapshotFetcher::new(path)),
            None => Arc::new(HttpFetcher::new(config.attempts, config.retry_delay())?),
        };
        let extractor = Extractor::new(
            ExtractionRules::default(),
            &config.marker,
            &config.base_origin,
        )?;

        Ok(Self::with_fetcher(
            fetcher,
            extractor,
            Persister::new(&config.output_dir),
            &config.target_url,
        ))
    }

    pub fn with_fetcher(
        fetcher: Arc<dyn Fetcher>,
        extractor: Extractor,
        persister: Persister,
        target_url: &str,
    ) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(extractor),
            persister,
            target_url: target_url.to_string(),
        }
    }

    /// Run the pipeline once. A failed fetch still leaves empty output files.
    pub async fn run(&self) -> Result<Vec<Show>> {
        info!(
            "Scraping shows from {} via {}",
            self.target_url,
            self.fetcher.name()
        );

        let html = match self.fetcher.fetch(&self.target_url).await {
            Ok(html) => html,
            Err(e) => {
                error!("Failed to fetch {}: {}", self.target_url, e);
                if let Err(save_err) = self.persister.save(&[]).await {
                    error!("Failed to write empty outputs: {:#}", save_err);
                }
                return Err(e.into());
            }
        };

        // Html is not Send, so it must be dropped before the next await
        let shows = {
            let document = Html::parse_document(&html);
            let shows = dedupe(self.extractor.extract(&document));

            if shows.is_empty() {
                log_page_info(&document);
            }
            shows
        };

        info!("Found {} unique shows", shows.len());
        self.persister.save(&shows).await?;
        log_summary(&shows);

        Ok(shows)
    }
}

fn log_page_info(document: &Html) {
    warn!("No shows found, the page structure might have changed");

    if let Ok(selector) = Selector::parse("title") {
        let title = document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default();
        info!("Page title: {}", title.trim());
    }
    if let Ok(selector) = Selector::parse("a") {
        info!("Total links: {}", document.select(&selector).count());
    }
}

fn log_summary(shows: &[Show]) {
    for (index, show) in shows.iter().take(SUMMARY_LIMIT).enumerate() {
        info!("{}. {} ({})", index + 1, show.title, show.url);
    }
    if shows.len() > SUMMARY_LIMIT {
        info!("... and {} more", shows.len() - SUMMARY_LIMIT);
    }
}
