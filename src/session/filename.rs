//! Filesystem-safe filename derivation for downloaded papers.

use std::path::{Path, PathBuf};

/// Maximum title length kept in a filename before truncation.
const MAX_TITLE_LEN: usize = 100;

/// Derives the `Surname-Title` stem for a paper.
///
/// The surname is the last whitespace-separated token of the first listed
/// author (`Unknown` when there are no authors). The title keeps only
/// alphanumerics, spaces, dashes, and underscores; overlong titles are
/// truncated with a trailing ellipsis marker.
#[must_use]
pub fn paper_stem(authors: &[String], title: &str) -> String {
    let surname = authors
        .first()
        .and_then(|author| author.split_whitespace().next_back())
        .unwrap_or("Unknown");

    let safe_title: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let safe_title = truncate_chars(safe_title.trim_end(), MAX_TITLE_LEN);

    format!("{surname}-{safe_title}")
}

/// Byte-safe truncation to a character count, appending `...` when
/// anything was cut.
fn truncate_chars(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let truncated: String = value.chars().take(max).collect();
    format!("{truncated}...")
}

/// Resolves the output path for a paper inside `dir`.
///
/// The plain `<stem>.pdf` name is preferred; when that file already exists
/// the provider identifier is appended (`<stem>_<id>.pdf`) to disambiguate
/// same-author-same-title collisions within a session. Path separators in
/// the identifier (legacy arXiv ids) are flattened first.
#[must_use]
pub fn resolve_paper_path(dir: &Path, stem: &str, id: &str) -> PathBuf {
    let base = dir.join(format!("{stem}.pdf"));
    if !base.exists() {
        return base;
    }
    let flat_id = id.replace('/', "_");
    dir.join(format!("{stem}_{flat_id}.pdf"))
}
