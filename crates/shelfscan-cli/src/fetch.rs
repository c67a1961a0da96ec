//! HTTP payload supplier for the `fetch` command.
//!
//! One plain GET per URL. The engine is fed whatever comes back; a page that
//! needs a browser to render simply yields "no strategy applicable".

use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use shelfscan_core::{AppConfig, Retailer};
use shelfscan_extract::{ContentKind, Extraction, Extractor, RawPayload};

use crate::extract::{build_extractor, resolve_retailer};
use crate::output::{print_json, PayloadOutput};

/// A fetched payload with its provenance.
#[derive(Debug)]
pub(crate) struct FetchedPage {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub payload: RawPayload,
}

pub(crate) struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// # Errors
    ///
    /// Returns an error if the underlying `reqwest::Client` cannot be built.
    pub(crate) fn new(timeout_secs: u64, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }

    /// GETs `url` and wraps the body for `retailer`.
    ///
    /// The content kind comes from the `Content-Type` header, falling back to
    /// a look at the body when the header is missing or unhelpful.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-2xx status.
    pub(crate) async fn fetch(&self, url: &str, retailer: &Retailer) -> anyhow::Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/json;q=0.9,*/*;q=0.8")
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("{url} returned HTTP {}", status.as_u16());
        }

        let declared = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(ContentKind::from_content_type);
        let fetched_at = Utc::now();
        let body = response
            .bytes()
            .await
            .with_context(|| format!("reading body of {url}"))?;
        let kind = declared.unwrap_or_else(|| ContentKind::sniff(&body));

        tracing::debug!(url, %kind, bytes = body.len(), "fetched payload");

        Ok(FetchedPage {
            url: url.to_string(),
            fetched_at,
            payload: RawPayload::new(body.to_vec(), kind, retailer.clone()),
        })
    }
}

/// Fetches every URL with at most `max_concurrent` requests in flight and
/// extracts each page as it arrives. Results come back in completion order.
pub(crate) async fn fetch_and_extract(
    fetcher: &PageFetcher,
    extractor: &Extractor,
    retailer: &Retailer,
    urls: &[String],
    max_concurrent: usize,
) -> Vec<(String, anyhow::Result<(FetchedPage, Extraction)>)> {
    stream::iter(urls)
        .map(|url| async move {
            let result = fetcher.fetch(url, retailer).await.map(|page| {
                let extraction = extractor.extract(&page.payload);
                (page, extraction)
            });
            (url.clone(), result)
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await
}

/// Fetch and extract every URL, printing one JSON array of results.
///
/// Per-URL failures are logged and skipped.
///
/// # Errors
///
/// Returns an error if the client or profiles cannot be built, or if every
/// URL failed to fetch.
pub(crate) async fn run_fetch(
    config: &AppConfig,
    retailer: &str,
    urls: &[String],
) -> anyhow::Result<()> {
    let extractor = build_extractor(config)?;
    let retailer = resolve_retailer(&extractor, retailer);
    let fetcher = PageFetcher::new(config.request_timeout_secs, &config.user_agent)?;

    let results = fetch_and_extract(
        &fetcher,
        &extractor,
        &retailer,
        urls,
        config.max_concurrent_fetches,
    )
    .await;

    let mut pages = Vec::with_capacity(results.len());
    let mut failed = 0usize;
    for (url, result) in results {
        match result {
            Ok(page) => pages.push(page),
            Err(error) => {
                let message = format!("{error:#}");
                tracing::error!(url = %url, error = %message, "fetch failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        tracing::warn!(failed, total = urls.len(), "some URLs could not be fetched");
    }
    if pages.is_empty() {
        anyhow::bail!("all {failed} URLs failed to fetch");
    }

    let outputs: Vec<PayloadOutput<'_>> = pages
        .iter()
        .map(|(page, extraction)| PayloadOutput {
            source: page.url.clone(),
            fetched_at: Some(page.fetched_at),
            extraction,
        })
        .collect();
    print_json(&outputs)
}

#[cfg(test)]
#[path = "fetch_test.rs"]
mod tests;
