//! Ordering policies for accepted papers.
//!
//! Every policy is a stable sort over a projected key, so ties preserve the
//! provider's relevance order. The input slice is never mutated; callers
//! get a freshly ordered vector.

use chrono::Datelike;

use crate::arxiv::Candidate;
use crate::citations::CitationInfo;

use super::criteria::SortOrder;

/// One accepted paper with its resolved citation data.
pub type RankedPaper = (Candidate, CitationInfo);

/// Returns the papers reordered under `order`.
///
/// `current_year` parameterizes the citations-per-year denominator so the
/// derived key is deterministic under test.
#[must_use]
pub fn rank(papers: &[RankedPaper], order: SortOrder, current_year: i32) -> Vec<RankedPaper> {
    let mut ordered: Vec<RankedPaper> = papers.to_vec();

    match order {
        SortOrder::Relevance => {}
        SortOrder::Citations | SortOrder::RecentCitations => {
            // RecentCitations has no separate recency signal from the
            // citation provider and intentionally orders by total count.
            ordered.sort_by(|a, b| b.1.citation_count.cmp(&a.1.citation_count));
        }
        SortOrder::CitationsPerYear => {
            ordered.sort_by(|a, b| {
                let ka = citations_per_year(a.1.citation_count, a.0.published.year(), current_year);
                let kb = citations_per_year(b.1.citation_count, b.0.published.year(), current_year);
                kb.total_cmp(&ka)
            });
        }
        SortOrder::Title => {
            ordered.sort_by_key(|(candidate, _)| candidate.title.to_lowercase());
        }
        SortOrder::Author => {
            ordered.sort_by_key(|(candidate, _)| {
                candidate
                    .authors
                    .first()
                    .map(|author| author.to_lowercase())
                    .unwrap_or_default()
            });
        }
        SortOrder::CrossListed => {
            ordered.sort_by(|a, b| b.0.categories.len().cmp(&a.0.categories.len()));
        }
        SortOrder::AscendingDate => {
            ordered.sort_by_key(|(candidate, _)| candidate.published);
        }
        SortOrder::SubmittedDate => {
            ordered.sort_by(|a, b| b.0.published.cmp(&a.0.published));
        }
        SortOrder::LastUpdated => {
            ordered.sort_by(|a, b| b.0.updated.cmp(&a.0.updated));
        }
    }

    ordered
}

/// Derived impact key: citations divided by full years since publication.
/// The denominator is clamped to at least one year, so a paper published
/// "this year" divides by 1.
#[must_use]
pub fn citations_per_year(citations: u64, published_year: i32, current_year: i32) -> f64 {
    let years = (current_year - published_year + 1).max(1);
    #[allow(clippy::cast_precision_loss)]
    {
        citations as f64 / f64::from(years)
    }
}
