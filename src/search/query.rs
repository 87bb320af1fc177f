//! Translation of [`SearchCriteria`] into the arXiv boolean query grammar.
//!
//! Each populated criterion becomes one parenthesized clause; clauses are
//! joined with `AND`. An empty criteria set produces the match-everything
//! wildcard `*:*`.

use super::criteria::SearchCriteria;

/// Query returned when no criterion is populated.
pub const WILDCARD_QUERY: &str = "*:*";

/// Sentinel lower bound for an open-ended year range.
const MIN_DATE: &str = "00000101";
/// Sentinel upper bound for an open-ended year range.
const MAX_DATE: &str = "99991231";

/// Builds the provider query string for the given criteria.
///
/// Citation bounds are absent from the output on purpose: the provider has
/// no citation field, so those are applied locally after resolution.
#[must_use]
pub fn build_query(criteria: &SearchCriteria) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(keywords) = &criteria.keywords {
        let groups: Vec<String> = keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|keyword| {
                let term = quote_if_spaced(keyword);
                format!("(ti:{term} OR abs:{term})")
            })
            .collect();
        if !groups.is_empty() {
            parts.push(format!("({})", groups.join(" OR ")));
        }
    }

    if let Some(title) = &criteria.title {
        parts.push(format!("ti:\"{title}\""));
    }

    if !criteria.authors.is_empty() {
        let authors: Vec<String> = criteria
            .authors
            .iter()
            .map(|author| format!("au:\"{author}\""))
            .collect();
        parts.push(format!("({})", authors.join(" AND ")));
    }

    if let Some(terms) = &criteria.abstract_keywords {
        let clauses: Vec<String> = terms
            .split_whitespace()
            .map(|term| format!("abs:\"{term}\""))
            .collect();
        if !clauses.is_empty() {
            parts.push(format!("({})", clauses.join(" AND ")));
        }
    }

    if !criteria.include_keywords.is_empty() {
        let clauses: Vec<String> = criteria
            .include_keywords
            .iter()
            .map(|kw| format!("(ti:\"{kw}\" OR abs:\"{kw}\")"))
            .collect();
        parts.push(format!("({})", clauses.join(" AND ")));
    }

    if !criteria.exclude_keywords.is_empty() {
        let clauses: Vec<String> = criteria
            .exclude_keywords
            .iter()
            .map(|kw| format!("NOT (ti:\"{kw}\" OR abs:\"{kw}\")"))
            .collect();
        parts.push(format!("({})", clauses.join(" AND ")));
    }

    match (criteria.year_from, criteria.year_to) {
        (Some(from), Some(to)) => {
            parts.push(format!("submittedDate:[{from}0101 TO {to}1231]"));
        }
        (Some(from), None) => {
            parts.push(format!("submittedDate:[{from}0101 TO {MAX_DATE}]"));
        }
        (None, Some(to)) => {
            parts.push(format!("submittedDate:[{MIN_DATE} TO {to}1231]"));
        }
        (None, None) => {}
    }

    if !criteria.categories.is_empty() {
        let cats: Vec<String> = criteria
            .categories
            .iter()
            .map(|cat| format!("cat:{}", cat.trim()))
            .collect();
        parts.push(format!("({})", cats.join(" OR ")));
    }

    if parts.is_empty() {
        return WILDCARD_QUERY.to_string();
    }

    parts
        .iter()
        .map(|part| format!("({part})"))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn quote_if_spaced(term: &str) -> String {
    if term.contains(' ') {
        format!("\"{term}\"")
    } else {
        term.to_string()
    }
}
