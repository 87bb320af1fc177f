//! Per-run download directory, manifest, and batch download driver.
//!
//! A session owns one timestamp-named directory under the base download
//! directory. [`DownloadSession`] walks a ranked candidate list in order,
//! fetching each PDF and committing successes to the ledger; one failing
//! candidate never aborts the rest of the batch.

mod filename;

pub use filename::{paper_stem, resolve_paper_path};

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::arxiv::Candidate;
use crate::citations::CitationInfo;
use crate::fetch::ArtifactFetcher;
use crate::ledger::{Ledger, LedgerEntry};
use crate::search::{RankedPaper, SearchCriteria};

/// Manifest filename inside each session directory.
const MANIFEST_NAME: &str = "download_log.md";

/// Errors from session-directory setup.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session directory or manifest could not be created.
    #[error("cannot set up session at {path}: {source}")]
    Setup {
        /// The path that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Result of processing one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The PDF was fetched, validated, and recorded in the ledger.
    Downloaded {
        /// Filename within the session directory.
        filename: String,
    },
    /// The identifier was already in the ledger; nothing was fetched.
    AlreadyListed,
    /// The fetch (or ledger write) failed; the ledger was not touched.
    Failed {
        /// Human-readable failure description.
        reason: String,
    },
}

impl DownloadOutcome {
    fn manifest_cell(&self) -> String {
        match self {
            Self::Downloaded { filename } => format!("downloaded `{filename}`"),
            Self::AlreadyListed => "skipped (already in ledger)".to_string(),
            Self::Failed { reason } => format!("failed: {reason}"),
        }
    }
}

/// Summary of one session run.
#[derive(Debug, Default)]
pub struct SessionReport {
    /// Outcome per candidate, in rank order, keyed by identifier.
    pub outcomes: Vec<(String, DownloadOutcome)>,
}

impl SessionReport {
    /// Number of successful downloads.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Downloaded { .. }))
    }

    /// Number of candidates skipped as already ledgered.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::AlreadyListed))
    }

    /// Number of failed candidates.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&DownloadOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// One run's filesystem scope: a timestamp-named directory plus its
/// append-only manifest.
#[derive(Debug)]
pub struct SessionDir {
    root: PathBuf,
    manifest: PathBuf,
}

impl SessionDir {
    /// Creates `<base>/session_<timestamp>/` and writes the manifest header
    /// summarizing the criteria. Session directories are never reused.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Setup`] when the directory or manifest
    /// cannot be created.
    #[instrument(skip(criteria))]
    pub fn create(base: &Path, criteria: &SearchCriteria) -> Result<Self, SessionError> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let root = base.join(format!("session_{stamp}"));
        fs::create_dir_all(&root).map_err(|source| SessionError::Setup {
            path: root.clone(),
            source,
        })?;

        let manifest = root.join(MANIFEST_NAME);
        let header = manifest_header(criteria);
        fs::write(&manifest, header).map_err(|source| SessionError::Setup {
            path: manifest.clone(),
            source,
        })?;

        info!(dir = %root.display(), "session directory created");
        Ok(Self { root, manifest })
    }

    /// Creates a bare session directory without a criteria header, used by
    /// the reconciliation pass for recovered files.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Setup`] when the directory cannot be created.
    pub fn create_bare(base: &Path) -> Result<Self, SessionError> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let root = base.join(format!("session_{stamp}"));
        fs::create_dir_all(&root).map_err(|source| SessionError::Setup {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            manifest: root.join(MANIFEST_NAME),
            root,
        })
    }

    /// The session directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Appends one manifest table row. Manifest trouble is logged and
    /// swallowed: a reporting failure must not fail the download.
    pub fn append_row(
        &self,
        rank: usize,
        candidate: &Candidate,
        citations: &CitationInfo,
        outcome: &DownloadOutcome,
    ) {
        let row = format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            rank,
            candidate.title,
            candidate.authors.join(", "),
            candidate.published.format("%Y-%m-%d"),
            citations.citation_count,
            outcome.manifest_cell()
        );
        if let Err(error) = append_to_file(&self.manifest, &row) {
            warn!(path = %self.manifest.display(), %error, "could not append manifest row");
        }
    }
}

fn append_to_file(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    file.write_all(text.as_bytes())
}

fn manifest_header(criteria: &SearchCriteria) -> String {
    fn or_unset(value: Option<&str>) -> &str {
        value.unwrap_or("unset")
    }
    fn list_or_unset(values: &[String]) -> String {
        if values.is_empty() {
            "unset".to_string()
        } else {
            values.join(", ")
        }
    }
    fn bound(value: Option<u64>) -> String {
        value.map_or_else(|| "unset".to_string(), |v| v.to_string())
    }
    fn year(value: Option<i32>) -> String {
        value.map_or_else(|| "unset".to_string(), |v| v.to_string())
    }

    let mut header = String::new();
    header.push_str("# Paper download session\n\n");
    header.push_str(&format!(
        "Started: {}\n\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    header.push_str("## Search criteria\n\n");
    header.push_str(&format!(
        "- Keywords: {}\n",
        or_unset(criteria.keywords.as_deref())
    ));
    header.push_str(&format!(
        "- Title: {}\n",
        or_unset(criteria.title.as_deref())
    ));
    header.push_str(&format!("- Authors: {}\n", list_or_unset(&criteria.authors)));
    header.push_str(&format!(
        "- Abstract keywords: {}\n",
        or_unset(criteria.abstract_keywords.as_deref())
    ));
    header.push_str(&format!(
        "- Must include: {}\n",
        list_or_unset(&criteria.include_keywords)
    ));
    header.push_str(&format!(
        "- Must exclude: {}\n",
        list_or_unset(&criteria.exclude_keywords)
    ));
    header.push_str(&format!(
        "- Citations: {} - {}\n",
        bound(criteria.min_citations),
        bound(criteria.max_citations)
    ));
    header.push_str(&format!(
        "- Years: {} - {}\n",
        year(criteria.year_from),
        year(criteria.year_to)
    ));
    header.push_str(&format!(
        "- Categories: {}\n",
        list_or_unset(&criteria.categories)
    ));
    header.push_str(&format!("- Sort: {}\n", criteria.sort_by));
    header.push_str(&format!("- Result cap: {}\n\n", criteria.max_results));
    header.push_str("## Papers\n\n");
    header.push_str("| Rank | Title | Authors | Published | Citations | Outcome |\n");
    header.push_str("|------|-------|---------|-----------|-----------|---------|\n");
    header
}

/// Drives downloads for a ranked candidate list.
pub struct DownloadSession<'a> {
    ledger: &'a mut Ledger,
    fetcher: &'a ArtifactFetcher,
    dir: SessionDir,
}

impl<'a> DownloadSession<'a> {
    /// Creates a session over an existing session directory.
    pub fn new(ledger: &'a mut Ledger, fetcher: &'a ArtifactFetcher, dir: SessionDir) -> Self {
        Self {
            ledger,
            fetcher,
            dir,
        }
    }

    /// The session's output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.root()
    }

    /// Processes every ranked candidate in order. Candidates already in the
    /// ledger are skipped without re-fetching; failures are recorded and do
    /// not abort the batch.
    #[instrument(skip_all, fields(papers = papers.len()))]
    pub async fn run(&mut self, papers: &[RankedPaper]) -> SessionReport {
        let mut report = SessionReport::default();
        let bar = ProgressBar::new(papers.len() as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
        {
            bar.set_style(style);
        }

        for (index, (candidate, citations)) in papers.iter().enumerate() {
            let rank = index + 1;
            bar.set_message(candidate.title.clone());

            let outcome = self.process_one(candidate, citations).await;
            self.dir.append_row(rank, candidate, citations, &outcome);
            report.outcomes.push((candidate.id.clone(), outcome));
            bar.inc(1);
        }

        bar.finish_and_clear();
        info!(
            downloaded = report.downloaded(),
            skipped = report.skipped(),
            failed = report.failed(),
            "session finished"
        );
        report
    }

    async fn process_one(
        &mut self,
        candidate: &Candidate,
        citations: &CitationInfo,
    ) -> DownloadOutcome {
        if self.ledger.contains(&candidate.id) {
            info!(id = %candidate.id, "already in ledger, skipping");
            return DownloadOutcome::AlreadyListed;
        }

        let stem = paper_stem(&candidate.authors, &candidate.title);
        let dest = resolve_paper_path(self.dir.root(), &stem, &candidate.id);
        let filename = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{stem}.pdf"));

        if let Err(error) = self.fetcher.fetch_pdf(&candidate.pdf_url, &dest).await {
            warn!(id = %candidate.id, %error, "download failed");
            return DownloadOutcome::Failed {
                reason: error.to_string(),
            };
        }

        let entry = ledger_entry(candidate, citations, &filename);
        self.ledger.put(candidate.id.clone(), entry);
        if let Err(error) = self.ledger.flush() {
            // The PDF is on disk but the ledger does not know it; surface
            // loudly since a later session would re-download it.
            warn!(id = %candidate.id, %error, "ledger flush failed after download");
            return DownloadOutcome::Failed {
                reason: format!("ledger flush failed: {error}"),
            };
        }

        info!(id = %candidate.id, file = %filename, "downloaded");
        DownloadOutcome::Downloaded { filename }
    }
}

fn ledger_entry(candidate: &Candidate, citations: &CitationInfo, filename: &str) -> LedgerEntry {
    LedgerEntry {
        title: candidate.title.clone(),
        authors: candidate.authors.clone(),
        abstract_text: candidate.summary.clone(),
        citation_count: citations.citation_count,
        semantic_scholar_url: citations.source_url.clone(),
        published_date: candidate.published.format("%Y-%m-%d").to_string(),
        downloaded_date: Utc::now().format("%Y-%m-%d").to_string(),
        filename: filename.to_string(),
        pdf_url: candidate.pdf_url.clone(),
        categories: candidate.categories.clone(),
        venue: None,
        source: None,
    }
}
