//! Local keep/drop predicates applied to each candidate after citation
//! resolution. All text matching is case-insensitive containment.

use crate::arxiv::Candidate;
use crate::citations::CitationInfo;

use super::criteria::SearchCriteria;

/// Returns true when the candidate's citation count lies inside the
/// criteria bounds (both inclusive).
#[must_use]
pub fn citation_bounds_ok(criteria: &SearchCriteria, citations: &CitationInfo) -> bool {
    if let Some(min) = criteria.min_citations
        && citations.citation_count < min
    {
        return false;
    }
    if let Some(max) = criteria.max_citations
        && citations.citation_count > max
    {
        return false;
    }
    true
}

/// Returns true when the candidate survives the keyword predicates:
/// abstract-any-match, exclude-none-match, include-all-match.
#[must_use]
pub fn keyword_filters_ok(criteria: &SearchCriteria, candidate: &Candidate) -> bool {
    let title = candidate.title.to_lowercase();
    let summary = candidate.summary.to_lowercase();

    if let Some(terms) = &criteria.abstract_keywords {
        let tokens: Vec<&str> = terms.split_whitespace().collect();
        if !tokens.is_empty()
            && !tokens
                .iter()
                .any(|term| summary.contains(&term.to_lowercase()))
        {
            return false;
        }
    }

    for term in &criteria.exclude_keywords {
        let needle = term.to_lowercase();
        if title.contains(&needle) || summary.contains(&needle) {
            return false;
        }
    }

    for term in &criteria.include_keywords {
        let needle = term.to_lowercase();
        if !title.contains(&needle) && !summary.contains(&needle) {
            return false;
        }
    }

    true
}

/// Full keep/drop decision for one candidate. A candidate with no
/// populated predicates always passes.
#[must_use]
pub fn passes(criteria: &SearchCriteria, candidate: &Candidate, citations: &CitationInfo) -> bool {
    citation_bounds_ok(criteria, citations) && keyword_filters_ok(criteria, candidate)
}
