//! Search criteria and sort-order types.
//!
//! [`SearchCriteria`] is the immutable value object describing one search
//! session: constructed once through [`CriteriaBuilder`], read-only
//! thereafter. Every field is optional except the sort policy and the
//! result cap.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Default number of papers a search session tries to download.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Errors produced while assembling a [`SearchCriteria`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CriteriaError {
    /// `year_from` is later than `year_to`; such a range matches nothing
    /// and is almost certainly a typo, so it is rejected outright.
    #[error("inverted year range: {from} > {to}")]
    InvertedYearRange {
        /// The requested lower bound.
        from: i32,
        /// The requested upper bound.
        to: i32,
    },

    /// The result cap must be at least 1.
    #[error("max_results must be at least 1")]
    ZeroMaxResults,
}

/// Ordering policy applied to accepted papers before downloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Provider relevance order (no local reordering).
    #[default]
    Relevance,
    /// Publication date, newest first.
    SubmittedDate,
    /// Last-updated date, newest first.
    LastUpdated,
    /// Total citation count, highest first.
    Citations,
    /// Citations divided by years since publication, highest first.
    CitationsPerYear,
    /// Recent citation activity. The citation provider exposes no recency
    /// signal, so this currently orders by total citation count.
    RecentCitations,
    /// Title, case-insensitive ascending.
    Title,
    /// First listed author, case-insensitive ascending.
    Author,
    /// Number of category tags, highest first.
    CrossListed,
    /// Publication date, oldest first.
    AscendingDate,
}

impl SortOrder {
    /// Returns the stable textual name used on the CLI and in reports.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::SubmittedDate => "submitted-date",
            Self::LastUpdated => "last-updated",
            Self::Citations => "citations",
            Self::CitationsPerYear => "citations-per-year",
            Self::RecentCitations => "recent-citations",
            Self::Title => "title",
            Self::Author => "author",
            Self::CrossListed => "cross-listed",
            Self::AscendingDate => "ascending-date",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "relevance" => Ok(Self::Relevance),
            "submitted-date" => Ok(Self::SubmittedDate),
            "last-updated" => Ok(Self::LastUpdated),
            "citations" => Ok(Self::Citations),
            "citations-per-year" => Ok(Self::CitationsPerYear),
            "recent-citations" => Ok(Self::RecentCitations),
            "title" => Ok(Self::Title),
            "author" => Ok(Self::Author),
            "cross-listed" => Ok(Self::CrossListed),
            "ascending-date" => Ok(Self::AscendingDate),
            _ => Err(format!("invalid sort order: {value}")),
        }
    }
}

/// One search session's worth of filtering and ordering criteria.
///
/// List-valued fields use an empty `Vec` to mean "not constrained";
/// scalar fields use `None`.
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    /// Comma-separated keyword OR-groups matched against title or abstract.
    pub keywords: Option<String>,
    /// Title substring clause.
    pub title: Option<String>,
    /// Author names, all required to match.
    pub authors: Vec<String>,
    /// Space-separated abstract terms; each becomes an AND-ed clause in the
    /// query, and locally at least one must appear in the abstract.
    pub abstract_keywords: Option<String>,
    /// Inclusive lower publication-year bound.
    pub year_from: Option<i32>,
    /// Inclusive upper publication-year bound.
    pub year_to: Option<i32>,
    /// Category tags, any of which may match.
    pub categories: Vec<String>,
    /// Minimum citation count (inclusive).
    pub min_citations: Option<u64>,
    /// Maximum citation count (inclusive).
    pub max_citations: Option<u64>,
    /// Terms that must all appear in the title or abstract.
    pub include_keywords: Vec<String>,
    /// Terms none of which may appear in the title or abstract.
    pub exclude_keywords: Vec<String>,
    /// Ordering policy for accepted papers.
    pub sort_by: SortOrder,
    /// Cap on papers accepted and downloaded.
    pub max_results: usize,
}

impl SearchCriteria {
    /// Starts building a criteria value.
    #[must_use]
    pub fn builder() -> CriteriaBuilder {
        CriteriaBuilder::default()
    }

    /// Returns true when no query-affecting field is populated.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.keywords.is_none()
            && self.title.is_none()
            && self.authors.is_empty()
            && self.abstract_keywords.is_none()
            && self.year_from.is_none()
            && self.year_to.is_none()
            && self.categories.is_empty()
            && self.include_keywords.is_empty()
            && self.exclude_keywords.is_empty()
    }
}

/// Builder for [`SearchCriteria`]; `build` validates cross-field invariants.
#[derive(Debug, Default)]
pub struct CriteriaBuilder {
    criteria: SearchCriteria,
    max_results: Option<usize>,
}

impl CriteriaBuilder {
    /// Sets the comma-separated keyword groups.
    #[must_use]
    pub fn keywords(mut self, keywords: impl Into<String>) -> Self {
        self.criteria.keywords = Some(keywords.into());
        self
    }

    /// Sets the title clause.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.criteria.title = Some(title.into());
        self
    }

    /// Sets the required author names.
    #[must_use]
    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.criteria.authors = authors;
        self
    }

    /// Sets the space-separated abstract terms.
    #[must_use]
    pub fn abstract_keywords(mut self, terms: impl Into<String>) -> Self {
        self.criteria.abstract_keywords = Some(terms.into());
        self
    }

    /// Sets the inclusive publication-year range. Either bound may be `None`.
    #[must_use]
    pub fn years(mut self, from: Option<i32>, to: Option<i32>) -> Self {
        self.criteria.year_from = from;
        self.criteria.year_to = to;
        self
    }

    /// Sets the category tags.
    #[must_use]
    pub fn categories(mut self, categories: Vec<String>) -> Self {
        self.criteria.categories = categories;
        self
    }

    /// Sets the inclusive citation-count bounds.
    #[must_use]
    pub fn citations(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.criteria.min_citations = min;
        self.criteria.max_citations = max;
        self
    }

    /// Sets the must-include terms.
    #[must_use]
    pub fn include_keywords(mut self, terms: Vec<String>) -> Self {
        self.criteria.include_keywords = terms;
        self
    }

    /// Sets the must-exclude terms.
    #[must_use]
    pub fn exclude_keywords(mut self, terms: Vec<String>) -> Self {
        self.criteria.exclude_keywords = terms;
        self
    }

    /// Sets the sort policy.
    #[must_use]
    pub fn sort_by(mut self, order: SortOrder) -> Self {
        self.criteria.sort_by = order;
        self
    }

    /// Sets the result cap.
    #[must_use]
    pub fn max_results(mut self, cap: usize) -> Self {
        self.max_results = Some(cap);
        self
    }

    /// Validates and produces the criteria.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::InvertedYearRange`] when both year bounds are
    /// set and `year_from > year_to`, and [`CriteriaError::ZeroMaxResults`]
    /// when the cap is zero.
    pub fn build(mut self) -> Result<SearchCriteria, CriteriaError> {
        match self.max_results {
            Some(0) => return Err(CriteriaError::ZeroMaxResults),
            Some(cap) => self.criteria.max_results = cap,
            None => self.criteria.max_results = DEFAULT_MAX_RESULTS,
        }
        if let (Some(from), Some(to)) = (self.criteria.year_from, self.criteria.year_to)
            && from > to
        {
            return Err(CriteriaError::InvertedYearRange { from, to });
        }
        Ok(self.criteria)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let criteria = SearchCriteria::builder().build().unwrap();
        assert!(criteria.is_unconstrained());
        assert_eq!(criteria.sort_by, SortOrder::Relevance);
        assert_eq!(criteria.max_results, DEFAULT_MAX_RESULTS);
    }

    #[test]
    fn test_builder_rejects_inverted_year_range() {
        let result = SearchCriteria::builder()
            .years(Some(2024), Some(2020))
            .build();
        assert_eq!(
            result.unwrap_err(),
            CriteriaError::InvertedYearRange {
                from: 2024,
                to: 2020
            }
        );
    }

    #[test]
    fn test_builder_accepts_equal_year_bounds() {
        let criteria = SearchCriteria::builder()
            .years(Some(2021), Some(2021))
            .build()
            .unwrap();
        assert_eq!(criteria.year_from, Some(2021));
        assert_eq!(criteria.year_to, Some(2021));
    }

    #[test]
    fn test_builder_rejects_zero_result_cap() {
        let result = SearchCriteria::builder().max_results(0).build();
        assert_eq!(result.unwrap_err(), CriteriaError::ZeroMaxResults);
    }

    #[test]
    fn test_builder_accepts_single_year_bound() {
        let criteria = SearchCriteria::builder().years(Some(2020), None).build();
        assert!(criteria.is_ok());
        let criteria = SearchCriteria::builder().years(None, Some(2020)).build();
        assert!(criteria.is_ok());
    }

    #[test]
    fn test_populated_fields_clear_unconstrained() {
        let criteria = SearchCriteria::builder()
            .include_keywords(vec!["transformer".to_string()])
            .build()
            .unwrap();
        assert!(!criteria.is_unconstrained());
    }

    #[test]
    fn test_citation_bounds_do_not_affect_query_constraint_check() {
        // Citation bounds are resolved locally, not in the provider query.
        let criteria = SearchCriteria::builder()
            .citations(Some(10), None)
            .build()
            .unwrap();
        assert!(criteria.is_unconstrained());
    }

    #[test]
    fn test_sort_order_round_trips_through_str() {
        for order in [
            SortOrder::Relevance,
            SortOrder::SubmittedDate,
            SortOrder::LastUpdated,
            SortOrder::Citations,
            SortOrder::CitationsPerYear,
            SortOrder::RecentCitations,
            SortOrder::Title,
            SortOrder::Author,
            SortOrder::CrossListed,
            SortOrder::AscendingDate,
        ] {
            assert_eq!(order.as_str().parse::<SortOrder>().unwrap(), order);
        }
    }

    #[test]
    fn test_sort_order_rejects_unknown_name() {
        assert!("pagerank".parse::<SortOrder>().is_err());
    }
}
