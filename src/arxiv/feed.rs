//! Atom feed deserialization for the arXiv export API.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{ArxivError, Candidate, short_id_from_entry_id};

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: String,
    title: String,
    #[serde(default)]
    summary: Option<String>,
    published: String,
    updated: String,
    #[serde(rename = "author", default)]
    authors: Vec<Author>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
    #[serde(rename = "category", default)]
    categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@title", default)]
    title: Option<String>,
    #[serde(rename = "@type", default)]
    content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(rename = "@term")]
    term: String,
}

/// Parses a feed body into candidates.
///
/// Entries that cannot be normalized (unrecognizable identifier, malformed
/// timestamps) are dropped rather than failing the page; the second tuple
/// element is the dropped count so callers can log it.
pub(crate) fn parse_feed(body: &str) -> Result<(Vec<Candidate>, usize), ArxivError> {
    let feed: Feed = quick_xml::de::from_str(body).map_err(|source| ArxivError::Feed { source })?;

    let total = feed.entries.len();
    let candidates: Vec<Candidate> = feed.entries.into_iter().filter_map(to_candidate).collect();
    let dropped = total - candidates.len();
    Ok((candidates, dropped))
}

fn to_candidate(entry: Entry) -> Option<Candidate> {
    let id = short_id_from_entry_id(&entry.id)?;
    let published = parse_timestamp(&entry.published)?;
    let updated = parse_timestamp(&entry.updated)?;

    let pdf_url = entry
        .links
        .iter()
        .find(|link| {
            link.title.as_deref() == Some("pdf")
                || link.content_type.as_deref() == Some("application/pdf")
        })
        .map_or_else(
            || format!("https://arxiv.org/pdf/{id}"),
            |link| link.href.clone(),
        );

    Some(Candidate {
        title: normalize_whitespace(&entry.title),
        authors: entry.authors.into_iter().map(|a| a.name).collect(),
        summary: entry
            .summary
            .as_deref()
            .map(normalize_whitespace)
            .unwrap_or_default(),
        published,
        updated,
        categories: entry.categories.into_iter().map(|c| c.term).collect(),
        pdf_url,
        id,
    })
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Feed titles and summaries carry hard line wraps; collapse all runs of
/// whitespace to single spaces.
fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
