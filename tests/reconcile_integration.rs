//! Integration tests for the reconciliation pass.
//!
//! Entries whose file exists must trigger no network traffic at all;
//! missing entries walk the recovery chain (recorded URL, open-access
//! lookup, fresh title search) and unrecoverable ones are only pruned on
//! request.

use std::path::PathBuf;
use std::time::Duration;

use harvester_core::arxiv::ArxivClient;
use harvester_core::citations::SemanticScholarClient;
use harvester_core::fetch::{ArtifactFetcher, RetryPolicy};
use harvester_core::ledger::{Ledger, LedgerEntry};
use harvester_core::reconcile::ReconciliationPass;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PDF_BODY: &[u8] = b"%PDF-1.5 body";

fn fast_fetcher() -> ArtifactFetcher {
    ArtifactFetcher::with_policy(RetryPolicy::new(
        1,
        Duration::from_millis(10),
        Duration::from_millis(20),
        2.0,
    ))
}

fn entry(title: &str, filename: &str, pdf_url: &str) -> LedgerEntry {
    LedgerEntry {
        title: title.to_string(),
        authors: vec!["Ada Lovelace".to_string()],
        abstract_text: String::new(),
        citation_count: 0,
        semantic_scholar_url: None,
        published_date: "2023-01-01".to_string(),
        downloaded_date: "2024-01-01".to_string(),
        filename: filename.to_string(),
        pdf_url: pdf_url.to_string(),
        categories: vec![],
        venue: None,
        source: None,
    }
}

#[tokio::test]
async fn test_present_file_triggers_no_recovery_attempt() {
    let server = MockServer::start().await;
    // Any request would violate the no-op guarantee.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let workdir = TempDir::new().expect("temp dir");
    let downloads = workdir.path().join("arxiv_papers");
    let session = downloads.join("session_20240101_000000");
    std::fs::create_dir_all(&session).expect("session dir");
    std::fs::write(session.join("Lovelace-Paper.pdf"), PDF_BODY).expect("pdf");

    let mut ledger = Ledger::load(workdir.path().join("db.json")).expect("ledger");
    ledger.put(
        "1",
        entry(
            "Paper",
            "Lovelace-Paper.pdf",
            &format!("{}/1.pdf", server.uri()),
        ),
    );

    let fetcher = fast_fetcher();
    let scholar = SemanticScholarClient::with_base_url(server.uri());
    let arxiv = ArxivClient::with_base_url(format!("{}/query", server.uri()));

    let mut pass = ReconciliationPass::new(&mut ledger, &fetcher, &scholar, &arxiv);
    let report = pass
        .run(&downloads, &[downloads.clone()], false)
        .await
        .expect("pass runs");

    assert_eq!(report.ledgered, 1);
    assert_eq!(report.missing, 0);
    assert!(report.recovered.is_empty());
    assert!(report.recovery_dir.is_none());
}

#[tokio::test]
async fn test_missing_file_recovered_via_recorded_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(PDF_BODY),
        )
        .mount(&server)
        .await;

    let workdir = TempDir::new().expect("temp dir");
    let downloads = workdir.path().join("arxiv_papers");
    std::fs::create_dir_all(&downloads).expect("downloads dir");

    let mut ledger = Ledger::load(workdir.path().join("db.json")).expect("ledger");
    ledger.put(
        "1",
        entry(
            "Lost Paper",
            "Lovelace-Lost Paper.pdf",
            &format!("{}/1.pdf", server.uri()),
        ),
    );

    let fetcher = fast_fetcher();
    let scholar = SemanticScholarClient::with_base_url(server.uri());
    let arxiv = ArxivClient::with_base_url(format!("{}/query", server.uri()));

    let mut pass = ReconciliationPass::new(&mut ledger, &fetcher, &scholar, &arxiv);
    let report = pass
        .run(&downloads, &[downloads.clone()], false)
        .await
        .expect("pass runs");

    assert_eq!(report.missing, 1);
    assert_eq!(report.recovered, vec!["1".to_string()]);
    assert!(report.unrecoverable.is_empty());

    // The recovered file landed in a fresh session directory.
    let recovery_dir = report.recovery_dir.expect("recovery dir");
    assert!(recovery_dir.join("Lovelace-Lost Paper.pdf").exists());

    // The ledger entry is untouched (filename not rewritten).
    assert_eq!(
        ledger.get("1").expect("entry").filename,
        "Lovelace-Lost Paper.pdf"
    );
}

#[tokio::test]
async fn test_fallback_to_open_access_lookup_when_recorded_url_is_gone() {
    let server = MockServer::start().await;
    // Recorded URL is dead.
    Mock::given(method("GET"))
        .and(path("/dead.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    // Citation provider offers an open-access copy.
    Mock::given(method("GET"))
        .and(path("/paper/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "total": 1,
            "data": [{
                "paperId": "abc",
                "title": "Lost Paper",
                "openAccessPdf": {"url": format!("{}/oa.pdf", server.uri())}
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oa.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(PDF_BODY),
        )
        .mount(&server)
        .await;

    let workdir = TempDir::new().expect("temp dir");
    let downloads = workdir.path().join("arxiv_papers");
    std::fs::create_dir_all(&downloads).expect("downloads dir");

    let mut ledger = Ledger::load(workdir.path().join("db.json")).expect("ledger");
    ledger.put(
        "1",
        entry(
            "Lost Paper",
            "Lovelace-Lost Paper.pdf",
            &format!("{}/dead.pdf", server.uri()),
        ),
    );

    let fetcher = fast_fetcher();
    let scholar = SemanticScholarClient::with_base_url(server.uri());
    let arxiv = ArxivClient::with_base_url(format!("{}/query", server.uri()));

    let mut pass = ReconciliationPass::new(&mut ledger, &fetcher, &scholar, &arxiv);
    let report = pass
        .run(&downloads, &[downloads.clone()], false)
        .await
        .expect("pass runs");

    assert_eq!(report.recovered, vec!["1".to_string()]);
}

#[tokio::test]
async fn test_unrecoverable_entries_pruned_only_on_request() {
    let server = MockServer::start().await;
    // Everything fails: dead recorded URL, no citation hit, empty feed.
    Mock::given(method("GET"))
        .and(path("/dead.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/paper/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"total": 0, "data": []})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"></feed>"#,
        ))
        .mount(&server)
        .await;

    let workdir = TempDir::new().expect("temp dir");
    let downloads = workdir.path().join("arxiv_papers");
    std::fs::create_dir_all(&downloads).expect("downloads dir");
    let ledger_path = workdir.path().join("db.json");

    let mut ledger = Ledger::load(&ledger_path).expect("ledger");
    ledger.put(
        "1",
        entry(
            "Gone Forever",
            "Lovelace-Gone Forever.pdf",
            &format!("{}/dead.pdf", server.uri()),
        ),
    );
    ledger.flush().expect("flush");

    let fetcher = fast_fetcher();
    let scholar = SemanticScholarClient::with_base_url(server.uri()).with_max_retries(1);
    let arxiv = ArxivClient::with_base_url(format!("{}/query", server.uri()));

    // Without prune: entry stays.
    {
        let mut pass = ReconciliationPass::new(&mut ledger, &fetcher, &scholar, &arxiv);
        let report = pass
            .run(&downloads, &[downloads.clone()], false)
            .await
            .expect("pass runs");
        assert_eq!(report.unrecoverable.len(), 1);
        assert!(!report.pruned);
    }
    assert!(ledger.contains("1"));

    // With prune: entry removed and the removal flushed.
    {
        let mut pass = ReconciliationPass::new(&mut ledger, &fetcher, &scholar, &arxiv);
        let report = pass
            .run(&downloads, &[downloads.clone()], true)
            .await
            .expect("pass runs");
        assert!(report.pruned);
    }
    assert!(!ledger.contains("1"));
    let reloaded = Ledger::load(&ledger_path).expect("reload");
    assert!(reloaded.is_empty());
}

#[tokio::test]
async fn test_scan_covers_multiple_roots() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let workdir = TempDir::new().expect("temp dir");
    let arxiv_root = workdir.path().join("arxiv_papers");
    let alt_root = workdir.path().join("open_papers");
    std::fs::create_dir_all(&arxiv_root).expect("root");
    std::fs::create_dir_all(&alt_root).expect("root");
    std::fs::write(alt_root.join("Lovelace-Elsewhere.pdf"), PDF_BODY).expect("pdf");

    let mut ledger = Ledger::load(workdir.path().join("db.json")).expect("ledger");
    ledger.put(
        "1",
        entry("Elsewhere", "Lovelace-Elsewhere.pdf", "http://unused/x.pdf"),
    );

    let fetcher = fast_fetcher();
    let scholar = SemanticScholarClient::with_base_url(server.uri());
    let arxiv = ArxivClient::with_base_url(format!("{}/query", server.uri()));

    let roots: Vec<PathBuf> = vec![arxiv_root.clone(), alt_root];
    let mut pass = ReconciliationPass::new(&mut ledger, &fetcher, &scholar, &arxiv);
    let report = pass.run(&arxiv_root, &roots, false).await.expect("pass");

    assert_eq!(report.missing, 0);
}
