//! arXiv metadata provider: paged Atom API client and candidate records.
//!
//! The export API returns an Atom feed; entries are deserialized with
//! `quick-xml` and normalized into [`Candidate`] values. The pipeline
//! consumes the client through the [`CandidateSource`] trait so that
//! scanning logic is testable against fixtures.

mod feed;

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub(crate) use feed::parse_feed;

/// Default arXiv query endpoint.
const DEFAULT_BASE_URL: &str = "https://export.arxiv.org/api/query";

/// Connect/read timeout for metadata queries.
const QUERY_TIMEOUT_SECS: u64 = 30;

static ARXIV_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?i)^(?:\d{4}\.\d{4,5}|[a-z\-]+(?:\.[a-z]{2})?/\d{7})(?:v\d+)?$")
});

fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Errors from the metadata provider.
#[derive(Debug, Error)]
pub enum ArxivError {
    /// Transport-level failure reaching the API.
    #[error("network error querying arXiv: {source}")]
    Network {
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP response from the API.
    #[error("arXiv API returned HTTP {status}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
    },

    /// The feed body could not be parsed as Atom XML.
    #[error("malformed arXiv feed: {source}")]
    Feed {
        /// The underlying deserialization error.
        #[source]
        source: quick_xml::DeError,
    },
}

/// One unranked, unfiltered search result from the metadata provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Provider-issued stable identifier in short form, e.g. `2301.01234v2`.
    pub id: String,
    /// Paper title, whitespace-normalized.
    pub title: String,
    /// Author names in listed order.
    pub authors: Vec<String>,
    /// Abstract text.
    pub summary: String,
    /// First submission timestamp.
    pub published: DateTime<Utc>,
    /// Last revision timestamp.
    pub updated: DateTime<Utc>,
    /// Category tags, primary first.
    pub categories: Vec<String>,
    /// Retrieval URL for the PDF artifact.
    pub pdf_url: String,
}

impl Candidate {
    /// Returns the candidate URL variants worth trying when fetching the
    /// PDF, most specific first. Some mirrors only answer with or without
    /// the `.pdf` suffix, so both spellings are included.
    #[must_use]
    pub fn pdf_url_variants(&self) -> Vec<String> {
        let mut variants = vec![self.pdf_url.clone()];
        for url in [
            format!("https://arxiv.org/pdf/{}", self.id),
            format!("https://arxiv.org/pdf/{}.pdf", self.id),
        ] {
            if !variants.contains(&url) {
                variants.push(url);
            }
        }
        variants
    }
}

/// Incremental source of search candidates.
///
/// Implemented by [`ArxivClient`] against the live API and by fixtures in
/// tests. A page shorter than `page_size` (or empty) means the result set
/// is exhausted.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Fetches one page of candidates for `query`, starting at offset
    /// `start`, in provider-native relevance order.
    async fn page(
        &self,
        query: &str,
        start: usize,
        page_size: usize,
    ) -> Result<Vec<Candidate>, ArxivError>;
}

/// HTTP client for the arXiv export API.
#[derive(Debug, Clone)]
pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for ArxivClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ArxivClient {
    /// Creates a client against the public export API.
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
            .timeout(Duration::from_secs(QUERY_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Looks up a paper by exact title, returning the top hit if any.
    ///
    /// The title is stripped to alphanumerics and spaces before querying;
    /// punctuation in the stored title otherwise breaks the `ti:` clause.
    ///
    /// # Errors
    ///
    /// Returns [`ArxivError`] when the API cannot be reached or the feed
    /// cannot be parsed.
    #[instrument(skip(self))]
    pub async fn search_by_title(&self, title: &str) -> Result<Option<Candidate>, ArxivError> {
        let clean: String = title
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();
        let query = format!("ti:\"{}\"", clean.trim());
        let page = self.page(&query, 0, 1).await?;
        Ok(page.into_iter().next())
    }
}

#[async_trait]
impl CandidateSource for ArxivClient {
    #[instrument(skip(self, query))]
    async fn page(
        &self,
        query: &str,
        start: usize,
        page_size: usize,
    ) -> Result<Vec<Candidate>, ArxivError> {
        let url = format!(
            "{}?search_query={}&start={}&max_results={}&sortBy=relevance",
            self.base_url,
            urlencoding::encode(query),
            start,
            page_size
        );
        debug!(url = %url, "querying metadata provider");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ArxivError::Network { source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArxivError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ArxivError::Network { source })?;

        let (candidates, dropped) = parse_feed(&body)?;
        if dropped > 0 {
            warn!(dropped, "skipped feed entries with missing fields");
        }
        Ok(candidates)
    }
}

/// Extracts the short arXiv identifier from an `abs` URL, keeping any
/// version suffix. Returns `None` when the tail does not look like an
/// arXiv id.
pub(crate) fn short_id_from_entry_id(entry_id: &str) -> Option<String> {
    let tail = entry_id.rsplit("/abs/").next()?;
    let trimmed = tail.trim().trim_matches('/');
    if ARXIV_ID_RE.is_match(trimmed) {
        Some(trimmed.to_string())
    } else {
        None
    }
}
