//! PDF retrieval with bounded retries and payload validation.
//!
//! [`ArtifactFetcher`] downloads one artifact at a time. A response is only
//! accepted when the declared content type indicates a PDF or the URL path
//! carries a `.pdf` extension (some servers mislabel content types), and
//! the written file must start with the PDF magic signature. Files failing
//! the signature check are deleted before the failure is reported, so a
//! successful return always leaves a plausible PDF on disk.

mod error;
mod retry;

pub use error::FetchError;
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER, USER_AGENT};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, instrument, warn};
use url::Url;

/// First bytes of every PDF file.
const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Default read timeout for artifact downloads (seconds).
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Browser-style User-Agent sent with artifact requests. Several PDF hosts
/// refuse requests with library-default agents.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Sequential PDF downloader with retry and double validation.
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl Default for ArtifactFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactFetcher {
    /// Creates a fetcher with the default retry policy and timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(RetryPolicy::default())
    }

    /// Creates a fetcher with a custom retry policy.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self::with_policy_and_timeout(policy, DEFAULT_READ_TIMEOUT_SECS)
    }

    /// Creates a fetcher with a custom retry policy and read timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the supplied
    /// configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_policy_and_timeout(policy: RetryPolicy, read_timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(read_timeout_secs))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client, policy }
    }

    /// Downloads `url` to `dest`, retrying transient failures per the
    /// configured policy.
    ///
    /// # Errors
    ///
    /// Returns the last [`FetchError`] once the policy gives up. No file
    /// remains at `dest` on failure.
    #[instrument(skip(self, dest), fields(dest = %dest.display()))]
    pub async fn fetch_pdf(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let mut attempt = 1u32;
        loop {
            match self.try_fetch(url, dest).await {
                Ok(()) => {
                    debug!(attempt, "artifact fetched");
                    return Ok(());
                }
                Err(error) => {
                    let failure = classify_error(&error);
                    match self.policy.should_retry(failure, attempt) {
                        RetryDecision::Retry {
                            delay,
                            attempt: next,
                        } => {
                            warn!(
                                attempt,
                                delay_ms = delay.as_millis(),
                                error = %error,
                                "fetch failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                            attempt = next;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            debug!(attempt, %reason, "fetch abandoned");
                            return Err(error);
                        }
                    }
                }
            }
        }
    }

    /// One download attempt: request, header validation, streamed write,
    /// magic-byte verification.
    async fn try_fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        let url_names_pdf = parsed.path().to_ascii_lowercase().ends_with(".pdf");

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    FetchError::timeout(url)
                } else {
                    FetchError::network(url, error)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
            return Err(FetchError::http_status_with_retry_after(
                url,
                status.as_u16(),
                retry_after,
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let declared_pdf = content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/pdf"));

        if !declared_pdf && !url_names_pdf {
            return Err(FetchError::not_pdf(url, content_type.as_deref()));
        }

        write_body(url, dest, response).await?;
        verify_pdf_magic(dest).await
    }
}

/// Streams the response body to `dest`, removing any partial file on
/// transport failure so a retry starts clean.
async fn write_body(url: &str, dest: &Path, response: reqwest::Response) -> Result<(), FetchError> {
    let mut file = File::create(dest)
        .await
        .map_err(|source| FetchError::io(dest, source))?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                if let Err(source) = file.write_all(&bytes).await {
                    drop(file);
                    let _ = tokio::fs::remove_file(dest).await;
                    return Err(FetchError::io(dest, source));
                }
            }
            Err(error) => {
                drop(file);
                let _ = tokio::fs::remove_file(dest).await;
                return Err(FetchError::network(url, error));
            }
        }
    }

    file.flush()
        .await
        .map_err(|source| FetchError::io(dest, source))?;
    Ok(())
}

/// Re-opens the written file and checks the `%PDF` signature; deletes the
/// file and fails when the signature is absent.
async fn verify_pdf_magic(dest: &Path) -> Result<(), FetchError> {
    let mut header = [0u8; 4];
    let read_ok = match File::open(dest).await {
        Ok(mut file) => file.read_exact(&mut header).await.is_ok(),
        Err(source) => return Err(FetchError::io(dest, source)),
    };

    if read_ok && &header == PDF_MAGIC {
        return Ok(());
    }

    let _ = tokio::fs::remove_file(dest).await;
    Err(FetchError::invalid_payload(dest))
}
