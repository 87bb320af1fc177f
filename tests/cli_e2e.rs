//! End-to-end smoke tests for the CLI binary. These exercise only paths
//! that require no network access.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_help_shows_subcommands() {
    Command::cargo_bin("harvester")
        .expect("binary builds")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_search_list_presets_exits_without_network() {
    Command::cargo_bin("harvester")
        .expect("binary builds")
        .args(["search", "--list-presets", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("llm"))
        .stdout(predicate::str::contains("Large language models"));
}

#[test]
fn test_search_rejects_inverted_year_range() {
    Command::cargo_bin("harvester")
        .expect("binary builds")
        .args([
            "search",
            "--year-from",
            "2024",
            "--year-to",
            "2020",
            "--quiet",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("inverted year range"));
}

#[test]
fn test_search_rejects_unknown_preset() {
    Command::cargo_bin("harvester")
        .expect("binary builds")
        .args(["search", "--preset", "numerology", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown preset"));
}

#[test]
fn test_check_with_empty_ledger_succeeds() {
    let dir = TempDir::new().expect("temp dir");
    Command::cargo_bin("harvester")
        .expect("binary builds")
        .current_dir(dir.path())
        .args(["check", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to verify"));
}

#[test]
fn test_check_rejects_corrupt_ledger() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("papers_db.json"), "{broken").expect("write");
    Command::cargo_bin("harvester")
        .expect("binary builds")
        .current_dir(dir.path())
        .args(["check", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot load ledger"));
}
