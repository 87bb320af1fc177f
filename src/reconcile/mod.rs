//! Ledger-vs-filesystem repair pass.
//!
//! Scans the known download directories for the PDFs the ledger claims to
//! have, re-acquires missing ones through a fallback chain of providers,
//! and (only on explicit request) prunes entries that no provider can
//! still serve.
//!
//! Recovered files land in a fresh session directory; the ledger's
//! recorded filename is left untouched. `filename` therefore means "name
//! of the file within *some* session directory", located by scanning, not
//! a full path.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::arxiv::ArxivClient;
use crate::citations::SemanticScholarClient;
use crate::fetch::ArtifactFetcher;
use crate::ledger::{Ledger, LedgerEntry, LedgerError};
use crate::session::{SessionDir, SessionError};

/// Minimum normalized title similarity before a provider hit found by
/// title search is trusted as the same paper.
const TITLE_MATCH_THRESHOLD: f64 = 0.8;

/// Errors that abort a whole reconciliation run. Per-entry recovery
/// failures are collected in the report instead.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The recovery session directory could not be created.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The pruned ledger could not be persisted.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Outcome of one reconciliation run.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Papers recorded in the ledger.
    pub ledgered: usize,
    /// Distinct PDF basenames found on disk.
    pub on_disk: usize,
    /// Ledger entries whose file was absent.
    pub missing: usize,
    /// Identifiers successfully re-acquired.
    pub recovered: Vec<String>,
    /// `(id, title)` pairs no provider could serve.
    pub unrecoverable: Vec<(String, String)>,
    /// Whether unrecoverable entries were removed from the ledger.
    pub pruned: bool,
    /// Directory that received recovered files, when any were attempted.
    pub recovery_dir: Option<PathBuf>,
}

/// Repair pass over one ledger and its download directories.
pub struct ReconciliationPass<'a> {
    ledger: &'a mut Ledger,
    fetcher: &'a ArtifactFetcher,
    scholar: &'a SemanticScholarClient,
    arxiv: &'a ArxivClient,
}

impl<'a> ReconciliationPass<'a> {
    /// Creates a pass over the given collaborators.
    pub fn new(
        ledger: &'a mut Ledger,
        fetcher: &'a ArtifactFetcher,
        scholar: &'a SemanticScholarClient,
        arxiv: &'a ArxivClient,
    ) -> Self {
        Self {
            ledger,
            fetcher,
            scholar,
            arxiv,
        }
    }

    /// Runs the pass. `roots` are the directories scanned for existing
    /// PDFs; recovered files are written to a fresh session directory
    /// under `base_dir`. Unrecoverable entries are removed from the ledger
    /// only when `prune` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the recovery directory cannot be
    /// created or the pruned ledger cannot be flushed.
    #[instrument(skip(self, base_dir, roots), fields(roots = roots.len()))]
    pub async fn run(
        &mut self,
        base_dir: &Path,
        roots: &[PathBuf],
        prune: bool,
    ) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport {
            ledgered: self.ledger.len(),
            ..ReconcileReport::default()
        };

        let on_disk = collect_pdf_names(roots);
        report.on_disk = on_disk.len();
        info!(
            ledgered = report.ledgered,
            on_disk = report.on_disk,
            "comparing ledger against filesystem"
        );

        let missing: Vec<(String, LedgerEntry)> = self
            .ledger
            .iter()
            .filter(|(_, entry)| !on_disk.contains(entry.filename.as_str()))
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect();
        report.missing = missing.len();

        if missing.is_empty() {
            info!("every ledgered paper is present on disk");
            return Ok(report);
        }

        for (_, entry) in &missing {
            info!(title = %entry.title, "missing artifact");
        }

        let session = SessionDir::create_bare(base_dir)?;
        report.recovery_dir = Some(session.root().to_path_buf());

        for (id, entry) in &missing {
            let dest = session.root().join(&entry.filename);
            if self.recover_one(entry, &dest).await {
                report.recovered.push(id.clone());
            } else {
                warn!(id = %id, title = %entry.title, "all recovery sources failed");
                report.unrecoverable.push((id.clone(), entry.title.clone()));
            }
        }

        info!(
            recovered = report.recovered.len(),
            unrecoverable = report.unrecoverable.len(),
            "recovery finished"
        );

        if prune && !report.unrecoverable.is_empty() {
            self.ledger
                .remove(report.unrecoverable.iter().map(|(id, _)| id.as_str()));
            self.ledger.flush()?;
            report.pruned = true;
            info!(
                removed = report.unrecoverable.len(),
                "pruned unrecoverable entries from ledger"
            );
        }

        Ok(report)
    }

    /// Tries the recovery chain for one entry: recorded URL, then an
    /// open-access lookup at the citation provider, then a fresh
    /// title search at the metadata provider with URL variants.
    async fn recover_one(&self, entry: &LedgerEntry, dest: &Path) -> bool {
        if !entry.pdf_url.is_empty() {
            match self.fetcher.fetch_pdf(&entry.pdf_url, dest).await {
                Ok(()) => {
                    info!(title = %entry.title, "recovered via recorded URL");
                    return true;
                }
                Err(error) => debug!(%error, "recorded URL failed"),
            }
        }

        if let Some(url) = self.scholar.open_access_pdf(&entry.title).await {
            match self.fetcher.fetch_pdf(&url, dest).await {
                Ok(()) => {
                    info!(title = %entry.title, "recovered via open-access lookup");
                    return true;
                }
                Err(error) => debug!(%error, "open-access URL failed"),
            }
        }

        match self.arxiv.search_by_title(&entry.title).await {
            Ok(Some(candidate)) if titles_match(&entry.title, &candidate.title) => {
                for url in candidate.pdf_url_variants() {
                    match self.fetcher.fetch_pdf(&url, dest).await {
                        Ok(()) => {
                            info!(title = %entry.title, "recovered via title search");
                            return true;
                        }
                        Err(error) => debug!(%error, url = %url, "variant failed"),
                    }
                }
            }
            Ok(Some(candidate)) => {
                debug!(hit = %candidate.title, "title search hit too dissimilar");
            }
            Ok(None) => debug!("title search found nothing"),
            Err(error) => debug!(%error, "title search failed"),
        }

        false
    }
}

fn titles_match(wanted: &str, found: &str) -> bool {
    strsim::normalized_levenshtein(&wanted.to_lowercase(), &found.to_lowercase())
        >= TITLE_MATCH_THRESHOLD
}

/// Recursively collects PDF basenames under the given roots. Unreadable
/// directories are skipped with a warning; a missing root is not an error.
fn collect_pdf_names(roots: &[PathBuf]) -> HashSet<String> {
    let mut names = HashSet::new();
    for root in roots {
        if root.exists() {
            walk(root, &mut names);
        }
    }
    names
}

fn walk(dir: &Path, names: &mut HashSet<String>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(dir = %dir.display(), %error, "cannot scan directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, names);
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
            && let Some(name) = path.file_name()
        {
            names.insert(name.to_string_lossy().into_owned());
        }
    }
}
