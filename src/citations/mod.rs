//! Citation lookup against the Semantic Scholar graph API.
//!
//! [`SemanticScholarClient`] resolves a best-effort citation count for a
//! paper title. Resolution failure degrades to a zero-citation default and
//! never propagates an error to the caller: a missing citation signal must
//! not abort a search pass.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

/// Default Semantic Scholar graph API base URL.
const DEFAULT_BASE_URL: &str = "https://api.semanticscholar.org/graph/v1";

/// Human-facing paper page, keyed by the provider's paper id.
const PAPER_PAGE_BASE: &str = "https://www.semanticscholar.org/paper";

/// Lookup attempts before returning the zero-citation default.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Connect/read timeout for citation lookups.
const LOOKUP_TIMEOUT_SECS: u64 = 30;

/// Auxiliary citation data resolved once per candidate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CitationInfo {
    /// Citation count; 0 when resolution failed or found no match.
    pub citation_count: u64,
    /// Canonical provider page for the matched record.
    pub source_url: Option<String>,
}

impl CitationInfo {
    /// The degraded value returned when resolution fails.
    #[must_use]
    pub fn unresolved() -> Self {
        Self::default()
    }
}

/// Source of per-candidate citation data.
///
/// Implementations must be infallible from the caller's point of view:
/// degrade to [`CitationInfo::unresolved`] instead of erroring.
#[async_trait]
pub trait CitationProvider: Send + Sync {
    /// Resolves citation data for a paper title.
    async fn citations_for(&self, title: &str) -> CitationInfo;
}

// ==================== Semantic Scholar API Response Types ====================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<PaperRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaperRecord {
    paper_id: String,
    title: String,
    #[serde(default)]
    citation_count: Option<u64>,
    #[serde(default)]
    open_access_pdf: Option<OpenAccessPdf>,
}

#[derive(Debug, Deserialize)]
struct OpenAccessPdf {
    url: String,
}

// ==================== SemanticScholarClient ====================

/// HTTP client for the Semantic Scholar graph API.
///
/// A lookup queries `/paper/search` with `limit=1` and accepts the hit only
/// if the query title appears as a case-insensitive substring of the
/// returned title; the top hit for a niche title is otherwise often an
/// unrelated popular paper.
#[derive(Debug, Clone)]
pub struct SemanticScholarClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl Default for SemanticScholarClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticScholarClient {
    /// Creates a client against the public API.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom endpoint (for testing with wiremock).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            base_url: base_url.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Overrides the lookup attempt bound.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Looks up an open-access PDF URL for a title, used by the
    /// reconciliation fallback chain.
    ///
    /// Returns `None` on no match or provider failure; like citation
    /// resolution this degrades rather than erroring.
    #[instrument(skip(self))]
    pub async fn open_access_pdf(&self, title: &str) -> Option<String> {
        let record = self
            .search_top_hit(title, "title,openAccessPdf")
            .await
            .ok()??;
        record.open_access_pdf.map(|pdf| pdf.url)
    }

    /// One `/paper/search` round trip; `Ok(None)` means an empty result set.
    async fn search_top_hit(
        &self,
        title: &str,
        fields: &str,
    ) -> Result<Option<PaperRecord>, reqwest::Error> {
        let url = format!(
            "{}/paper/search?query={}&fields={}&limit=1",
            self.base_url,
            urlencoding::encode(title),
            fields
        );
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let mut parsed: SearchResponse = response.json().await?;
        if parsed.data.is_empty() {
            Ok(None)
        } else {
            Ok(Some(parsed.data.remove(0)))
        }
    }
}

#[async_trait]
impl CitationProvider for SemanticScholarClient {
    #[instrument(skip(self))]
    async fn citations_for(&self, title: &str) -> CitationInfo {
        for attempt in 1..=self.max_retries {
            let url = format!(
                "{}/paper/search?query={}&fields=title,authors,citationCount,year&limit=1",
                self.base_url,
                urlencoding::encode(title)
            );

            let response = match self.client.get(&url).send().await {
                Ok(resp) => resp,
                Err(error) => {
                    debug!(attempt, %error, "citation lookup transport error");
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 {
                // The provider told us when to come back; honoring it is the
                // one case where the retry loop sleeps.
                let delay = retry_after_delay(response.headers());
                warn!(attempt, delay_secs = delay.as_secs(), "citation provider rate limited");
                tokio::time::sleep(delay).await;
                continue;
            }
            if !status.is_success() {
                debug!(attempt, status = status.as_u16(), "citation lookup HTTP error");
                continue;
            }

            let parsed: SearchResponse = match response.json().await {
                Ok(parsed) => parsed,
                Err(error) => {
                    debug!(attempt, %error, "citation lookup payload error");
                    continue;
                }
            };

            let Some(record) = parsed.data.first() else {
                debug!("no citation record for title");
                return CitationInfo::unresolved();
            };

            if !record
                .title
                .to_lowercase()
                .contains(&title.to_lowercase())
            {
                debug!(hit = %record.title, "top hit does not match query title");
                return CitationInfo::unresolved();
            }

            return CitationInfo {
                citation_count: record.citation_count.unwrap_or(0),
                source_url: Some(format!("{PAPER_PAGE_BASE}/{}", record.paper_id)),
            };
        }

        warn!(retries = self.max_retries, "citation lookup exhausted retries");
        CitationInfo::unresolved()
    }
}

/// Reads a `Retry-After` header as either delta-seconds or an HTTP-date,
/// defaulting to one second when absent or unparseable.
fn retry_after_delay(headers: &reqwest::header::HeaderMap) -> Duration {
    let Some(value) = headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
    else {
        return Duration::from_secs(1);
    };

    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    if let Ok(when) = httpdate::parse_http_date(value) {
        if let Ok(delay) = when.duration_since(std::time::SystemTime::now()) {
            return delay;
        }
        return Duration::ZERO;
    }

    Duration::from_secs(1)
}
