//! One search session: paged scan, incremental filtering, early stop,
//! ranking, truncation.
//!
//! The pipeline pulls candidates from a [`CandidateSource`] page by page in
//! provider relevance order. Each candidate not already in the ledger gets
//! its citations resolved and the filter predicates applied; scanning stops
//! as soon as enough candidates are accepted or the absolute scan ceiling
//! is reached, whichever comes first.

use chrono::{Datelike, Utc};
use tracing::{debug, info, instrument};

use crate::arxiv::{ArxivError, CandidateSource};
use crate::citations::CitationProvider;
use crate::ledger::Ledger;

use super::criteria::SearchCriteria;
use super::filter::{citation_bounds_ok, keyword_filters_ok};
use super::query::build_query;
use super::rank::{RankedPaper, rank};

/// Absolute cap on candidates examined per search, independent of the
/// requested result count. Bounds worst-case cost against a query with
/// poor precision.
pub const SCAN_CEILING: usize = 1000;

/// Candidates requested per provider page.
const PAGE_SIZE: usize = 100;

/// Floor on the raw candidate pool requested from the provider. Most
/// candidates are filtered out or already ledgered, so the search breadth
/// is far larger than the result cap.
const MIN_SEARCH_BREADTH: usize = 2000;

/// Multiplier from the result cap to the requested search breadth.
const BREADTH_FACTOR: usize = 50;

/// Diagnostic counters for one scan. These do not affect correctness; they
/// feed the end-of-run statistics report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Total candidates examined.
    pub examined: usize,
    /// Candidates skipped because their id was already in the ledger.
    pub already_downloaded: usize,
    /// Candidates dropped by the citation bounds.
    pub citation_filtered: usize,
    /// Candidates dropped by the keyword predicates.
    pub keyword_filtered: usize,
    /// Candidates accepted before ranking and truncation.
    pub accepted: usize,
}

/// Result of one pipeline run.
#[derive(Debug)]
pub struct SearchOutcome {
    /// Accepted papers, ranked and truncated to the result cap.
    pub papers: Vec<RankedPaper>,
    /// Scan diagnostics.
    pub stats: ScanStats,
    /// Titles skipped as already ledgered, for the end-of-run report.
    pub skipped_titles: Vec<String>,
    /// The provider query that was issued.
    pub query: String,
}

/// Orchestrates provider querying, filtering, and ranking for one session.
pub struct SearchPipeline<'a> {
    source: &'a dyn CandidateSource,
    citations: &'a dyn CitationProvider,
    ledger: &'a Ledger,
}

impl<'a> SearchPipeline<'a> {
    /// Creates a pipeline over the given collaborators.
    pub fn new(
        source: &'a dyn CandidateSource,
        citations: &'a dyn CitationProvider,
        ledger: &'a Ledger,
    ) -> Self {
        Self {
            source,
            citations,
            ledger,
        }
    }

    /// Runs the search.
    ///
    /// # Errors
    ///
    /// Returns [`ArxivError`] only for provider-level failures (the query
    /// itself failing); per-candidate trouble degrades and is counted in
    /// the stats instead.
    #[instrument(skip(self, criteria), fields(max_results = criteria.max_results))]
    pub async fn run(&self, criteria: &SearchCriteria) -> Result<SearchOutcome, ArxivError> {
        let query = build_query(criteria);
        info!(query = %query, "searching");

        let breadth = (criteria.max_results * BREADTH_FACTOR).max(MIN_SEARCH_BREADTH);
        let mut stats = ScanStats::default();
        let mut accepted: Vec<RankedPaper> = Vec::new();
        let mut skipped_titles: Vec<String> = Vec::new();

        'scan: for start in (0..breadth).step_by(PAGE_SIZE) {
            let page = self.source.page(&query, start, PAGE_SIZE).await?;
            if page.is_empty() {
                debug!(start, "provider exhausted");
                break;
            }
            let short_page = page.len() < PAGE_SIZE;

            for candidate in page {
                if stats.examined >= SCAN_CEILING {
                    info!(ceiling = SCAN_CEILING, "scan ceiling reached");
                    break 'scan;
                }
                stats.examined += 1;

                if self.ledger.contains(&candidate.id) {
                    stats.already_downloaded += 1;
                    skipped_titles.push(candidate.title);
                    continue;
                }

                let citations = self.citations.citations_for(&candidate.title).await;

                if !citation_bounds_ok(criteria, &citations) {
                    stats.citation_filtered += 1;
                    continue;
                }
                if !keyword_filters_ok(criteria, &candidate) {
                    stats.keyword_filtered += 1;
                    continue;
                }

                debug!(id = %candidate.id, title = %candidate.title, "accepted");
                accepted.push((candidate, citations));

                if accepted.len() >= criteria.max_results {
                    info!(accepted = accepted.len(), "enough results, stopping scan");
                    break 'scan;
                }
            }

            if short_page {
                debug!("short page, provider exhausted");
                break;
            }
        }

        stats.accepted = accepted.len();

        if stats.accepted < criteria.max_results && stats.examined < breadth.min(SCAN_CEILING) {
            info!(
                examined = stats.examined,
                "provider ran out of candidates; the criteria may be too strict"
            );
        }

        let mut papers = rank(&accepted, criteria.sort_by, Utc::now().year());
        papers.truncate(criteria.max_results);

        info!(
            examined = stats.examined,
            already_downloaded = stats.already_downloaded,
            citation_filtered = stats.citation_filtered,
            keyword_filtered = stats.keyword_filtered,
            accepted = stats.accepted,
            "scan complete"
        );

        Ok(SearchOutcome {
            papers,
            stats,
            skipped_titles,
            query,
        })
    }
}
