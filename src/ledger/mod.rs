//! Persistent record of downloaded papers.
//!
//! The ledger is one JSON object, `{"papers": {<id>: <entry>, ...}}`,
//! rewritten wholesale on every flush. Flushing writes a sibling temp file
//! and renames it over the target, so the file on disk is always complete
//! valid JSON: an interruption mid-session loses at most the in-flight
//! paper, never the ledger.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from ledger persistence.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The backing file exists but could not be read or written.
    #[error("IO error on ledger {path}: {source}")]
    Io {
        /// The ledger file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not the expected JSON shape. The ledger is never
    /// silently reset: a corrupt file needs the user's attention.
    #[error("ledger {path} is not valid JSON: {source}")]
    Corrupt {
        /// The ledger file path.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// The persisted record for one successfully downloaded paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Paper title.
    pub title: String,
    /// Author names in listed order.
    pub authors: Vec<String>,
    /// Abstract text.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Citation count at download time.
    pub citation_count: u64,
    /// Citation-provider page for the paper, when resolution succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_scholar_url: Option<String>,
    /// Publication date, `YYYY-MM-DD`.
    pub published_date: String,
    /// Download date, `YYYY-MM-DD`.
    pub downloaded_date: String,
    /// Filename within the session directory that received the PDF.
    pub filename: String,
    /// URL the artifact was fetched from.
    pub pdf_url: String,
    /// Category tags.
    pub categories: Vec<String>,
    /// Publication venue, for entries that came from a non-arXiv source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    /// Provider tag for entries that came from a non-arXiv source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    papers: BTreeMap<String, LedgerEntry>,
}

/// In-memory ledger bound to its backing file.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    papers: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    /// Loads the ledger from `path`. A missing file is an empty ledger,
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] when an existing file cannot be read and
    /// [`LedgerError::Corrupt`] when it cannot be parsed.
    #[instrument]
    pub fn load(path: impl Into<PathBuf> + std::fmt::Debug) -> Result<Self, LedgerError> {
        let path = path.into();
        if !path.exists() {
            debug!(path = %path.display(), "no ledger file yet, starting empty");
            return Ok(Self {
                path,
                papers: BTreeMap::new(),
            });
        }

        let body = fs::read_to_string(&path).map_err(|source| LedgerError::Io {
            path: path.clone(),
            source,
        })?;
        let file: LedgerFile =
            serde_json::from_str(&body).map_err(|source| LedgerError::Corrupt {
                path: path.clone(),
                source,
            })?;
        debug!(entries = file.papers.len(), "ledger loaded");
        Ok(Self {
            path,
            papers: file.papers,
        })
    }

    /// Returns true when `id` has a recorded entry.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.papers.contains_key(id)
    }

    /// Returns the entry for `id`, if recorded.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LedgerEntry> {
        self.papers.get(id)
    }

    /// Records an entry under `id`. Last write wins: callers that must not
    /// overwrite check [`Ledger::contains`] first.
    pub fn put(&mut self, id: impl Into<String>, entry: LedgerEntry) {
        self.papers.insert(id.into(), entry);
    }

    /// Removes the given identifiers. Unknown ids are ignored.
    pub fn remove<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.papers.remove(id.as_ref());
        }
    }

    /// Number of recorded papers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.papers.len()
    }

    /// Returns true when no paper is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    /// Iterates over `(id, entry)` pairs in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &LedgerEntry)> {
        self.papers.iter()
    }

    /// Persists the full mapping atomically: serialize to a sibling temp
    /// file, then rename over the target.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] when the temp file cannot be written or
    /// renamed.
    #[instrument(skip(self), fields(path = %self.path.display(), entries = self.papers.len()))]
    pub fn flush(&self) -> Result<(), LedgerError> {
        let file = LedgerFile {
            papers: self.papers.clone(),
        };
        // BTreeMap + pretty printing keep the file diffable across sessions.
        let body = serde_json::to_string_pretty(&file).map_err(|source| LedgerError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|source| LedgerError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("ledger flushed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(title: &str) -> LedgerEntry {
        LedgerEntry {
            title: title.to_string(),
            authors: vec!["Ada Lovelace".to_string()],
            abstract_text: "An abstract.".to_string(),
            citation_count: 42,
            semantic_scholar_url: Some("https://www.semanticscholar.org/paper/abc".to_string()),
            published_date: "2023-01-05".to_string(),
            downloaded_date: "2024-06-01".to_string(),
            filename: "Lovelace-Title.pdf".to_string(),
            pdf_url: "https://arxiv.org/pdf/2301.01234".to_string(),
            categories: vec!["cs.AI".to_string()],
            venue: None,
            source: None,
        }
    }

    #[test]
    fn test_load_missing_file_is_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::load(dir.path().join("papers_db.json")).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_put_flush_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("papers_db.json");

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.put("2301.01234", entry("Sparse Attention Revisited"));
        ledger.flush().unwrap();

        // Simulated restart.
        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains("2301.01234"));
        assert!(!reloaded.contains("2301.99999"));
        assert_eq!(
            reloaded.get("2301.01234").unwrap(),
            &entry("Sparse Attention Revisited")
        );
    }

    #[test]
    fn test_put_overwrites_existing_entry() {
        let dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(dir.path().join("db.json")).unwrap();
        ledger.put("id", entry("first"));
        ledger.put("id", entry("second"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("id").unwrap().title, "second");
    }

    #[test]
    fn test_remove_batch_and_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let mut ledger = Ledger::load(&path).unwrap();
        ledger.put("a", entry("A"));
        ledger.put("b", entry("B"));
        ledger.put("c", entry("C"));
        ledger.remove(["a", "c", "never-existed"]);
        ledger.flush().unwrap();

        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains("b"));
    }

    #[test]
    fn test_corrupt_file_is_an_error_not_a_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Ledger::load(&path),
            Err(LedgerError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_flush_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let mut ledger = Ledger::load(&path).unwrap();
        ledger.put("a", entry("A"));
        ledger.flush().unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_wire_format_has_papers_key_and_abstract_rename() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let mut ledger = Ledger::load(&path).unwrap();
        ledger.put("a", entry("A"));
        ledger.flush().unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(value.get("papers").is_some());
        assert!(value["papers"]["a"].get("abstract").is_some());
        assert!(value["papers"]["a"].get("abstract_text").is_none());
    }
}
