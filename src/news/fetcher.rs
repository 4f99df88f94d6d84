use std::time::Duration;

use chrono::Local;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use super::NewsRecord;
use crate::core::config::NewsConfig;
use crate::core::errors::ApiError;

const SEARCH_BASE: &str = "https://search.naver.com/search.naver";
const ENTRY_SELECTOR: &str = "ul.list_news > li";
const TITLE_SELECTOR: &str = "a.news_tit";
const SNIPPET_SELECTOR: &str = "div.news_dsc";

/// Fetches recent news entries for one company.
///
/// One outbound request per call, no retries: a transient failure surfaces
/// immediately as `ApiError::Upstream` and the caller decides whether the
/// session build stops.
#[derive(Clone)]
pub struct NewsFetcher {
    client: Client,
    config: NewsConfig,
}

impl NewsFetcher {
    pub fn new(config: NewsConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self { client, config })
    }

    /// Fetches up to `max_articles` records from the trailing
    /// `lookback_days`-day window ending today.
    ///
    /// An empty result is the soft "no news found" condition, not an error.
    pub async fn fetch(&self, company: &str) -> Result<Vec<NewsRecord>, ApiError> {
        let url = self.search_url(company);
        tracing::debug!("fetching news: {}", url);

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, "Mozilla/5.0")
            .send()
            .await
            .map_err(ApiError::upstream)?
            .error_for_status()
            .map_err(ApiError::upstream)?;

        let html = response.text().await.map_err(ApiError::upstream)?;
        let records = parse_search_page(&html, self.config.max_articles)?;
        tracing::info!("fetched {} news records for '{}'", records.len(), company);
        Ok(records)
    }

    fn search_url(&self, company: &str) -> String {
        let today = Local::now().date_naive();
        let start = today - chrono::Duration::days(self.config.lookback_days);
        format!(
            "{}?where=news&query={}&nso=so:r,p:from{}to{}",
            SEARCH_BASE,
            urlencoding::encode(company),
            start.format("%Y%m%d"),
            today.format("%Y%m%d"),
        )
    }
}

/// Parses a search-results page into records, capped at `max_entries`.
///
/// Entries without a parseable title or link are skipped; a page whose
/// structure does not match the selectors yields an empty vec.
pub fn parse_search_page(html: &str, max_entries: usize) -> Result<Vec<NewsRecord>, ApiError> {
    let entry_sel = selector(ENTRY_SELECTOR)?;
    let title_sel = selector(TITLE_SELECTOR)?;
    let snippet_sel = selector(SNIPPET_SELECTOR)?;

    let document = Html::parse_document(html);
    let mut records = Vec::new();

    for entry in document.select(&entry_sel) {
        if records.len() >= max_entries {
            break;
        }

        let Some(anchor) = entry.select(&title_sel).next() else {
            tracing::debug!("skipping entry without title anchor");
            continue;
        };

        let title = anchor.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            tracing::debug!("skipping entry with empty title");
            continue;
        }

        let link = anchor
            .value()
            .attr("href")
            .and_then(|href| Url::parse(href).ok());
        let Some(link) = link else {
            tracing::debug!("skipping entry with missing or invalid link: '{}'", title);
            continue;
        };

        let content = entry
            .select(&snippet_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        records.push(NewsRecord {
            title,
            link,
            content,
        });
    }

    Ok(records)
}

fn selector(spec: &str) -> Result<Selector, ApiError> {
    Selector::parse(spec).map_err(|e| ApiError::Internal(format!("invalid selector {spec}: {e}")))
}
