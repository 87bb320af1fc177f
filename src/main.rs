//! CLI entry point for the harvester tool.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info};

use harvester_core::{
    ArtifactFetcher, ArxivClient, DownloadSession, Ledger, ReconciliationPass, RetryPolicy,
    SearchCriteria, SearchPipeline, SemanticScholarClient, SessionDir,
};

mod cli;

use cli::{Args, CheckArgs, Command, SearchArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    // All work is sequential; the one concurrent thing in flight is the
    // interrupt listener, so Ctrl-C always produces a clean exit with the
    // ledger consistent as of its last flush.
    tokio::select! {
        result = run(args.command) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted. Ledger state as of the last flush is preserved.");
            Ok(())
        }
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Search(args) => run_search(args).await,
        Command::Check(args) => run_check(args).await,
    }
}

async fn run_search(args: SearchArgs) -> Result<()> {
    if args.list_presets {
        println!("Available keyword presets:");
        for preset in harvester_core::search::KEYWORD_PRESETS {
            println!("  {:<16} {} [{}]", preset.key, preset.name, preset.keywords);
        }
        return Ok(());
    }

    let criteria = build_criteria(&args)?;
    info!("Harvester search starting");

    let mut ledger = Ledger::load(&args.ledger)
        .with_context(|| format!("cannot load ledger {}", args.ledger.display()))?;
    info!(entries = ledger.len(), "ledger loaded");

    let arxiv = ArxivClient::new();
    let scholar = SemanticScholarClient::new();

    let outcome = {
        let pipeline = SearchPipeline::new(&arxiv, &scholar, &ledger);
        pipeline.run(&criteria).await.context("search failed")?
    };

    if outcome.papers.is_empty() {
        println!("No new papers matched the criteria.");
        print_scan_stats(&outcome);
        return Ok(());
    }

    println!("Found {} new papers:", outcome.papers.len());
    for (index, (candidate, citations)) in outcome.papers.iter().enumerate() {
        println!(
            "  {:>2}. {} ({}, {} citations)",
            index + 1,
            candidate.title,
            candidate.published.format("%Y-%m-%d"),
            citations.citation_count
        );
    }

    let session_dir = SessionDir::create(&args.download_dir, &criteria)
        .context("cannot create session directory")?;
    let fetcher = ArtifactFetcher::with_policy(RetryPolicy::with_max_attempts(u32::from(
        args.max_retries,
    )));

    let mut session = DownloadSession::new(&mut ledger, &fetcher, session_dir);
    println!("\nDownloading into {}", session.dir().display());
    let report = session.run(&outcome.papers).await;

    println!(
        "\nDone: {} downloaded, {} skipped, {} failed.",
        report.downloaded(),
        report.skipped(),
        report.failed()
    );
    print_scan_stats(&outcome);

    Ok(())
}

fn build_criteria(args: &SearchArgs) -> Result<SearchCriteria> {
    let keywords = match (&args.keywords, &args.preset) {
        (Some(keywords), _) => Some(keywords.clone()),
        (None, Some(key)) => {
            let Some(preset) = harvester_core::search::preset(key) else {
                bail!("unknown preset '{key}'; run with --list-presets to see the options");
            };
            Some(preset.keywords.to_string())
        }
        (None, None) => None,
    };

    let mut builder = SearchCriteria::builder()
        .authors(args.authors.clone())
        .categories(args.categories.clone())
        .include_keywords(args.include_keywords.clone())
        .exclude_keywords(args.exclude_keywords.clone())
        .years(args.year_from, args.year_to)
        .citations(args.min_citations, args.max_citations)
        .sort_by(args.sort_by)
        .max_results(usize::from(args.max_results));
    if let Some(keywords) = keywords {
        builder = builder.keywords(keywords);
    }
    if let Some(title) = &args.title {
        builder = builder.title(title.clone());
    }
    if let Some(terms) = &args.abstract_keywords {
        builder = builder.abstract_keywords(terms.clone());
    }

    builder.build().context("invalid search criteria")
}

fn print_scan_stats(outcome: &harvester_core::SearchOutcome) {
    let stats = outcome.stats;
    println!("\nScan statistics:");
    println!("  Query: {}", outcome.query);
    println!("  Candidates examined: {}", stats.examined);
    println!("  Already downloaded:  {}", stats.already_downloaded);
    println!("  Citation-filtered:   {}", stats.citation_filtered);
    println!("  Keyword-filtered:    {}", stats.keyword_filtered);
    println!("  Accepted:            {}", stats.accepted);

    if !outcome.skipped_titles.is_empty() {
        println!("\nSkipped (already in ledger):");
        for title in &outcome.skipped_titles {
            println!("  - {title}");
        }
    }
}

async fn run_check(args: CheckArgs) -> Result<()> {
    let mut ledger = Ledger::load(&args.ledger)
        .with_context(|| format!("cannot load ledger {}", args.ledger.display()))?;

    if ledger.is_empty() {
        println!("Ledger is empty; nothing to verify.");
        return Ok(());
    }

    let fetcher = ArtifactFetcher::with_policy(RetryPolicy::with_max_attempts(u32::from(
        args.max_retries,
    )));
    let scholar = SemanticScholarClient::new();
    let arxiv = ArxivClient::new();

    let roots: Vec<PathBuf> = args.download_dirs.clone();
    let base_dir = roots
        .first()
        .cloned()
        .unwrap_or_else(|| PathBuf::from("arxiv_papers"));

    let report = {
        let mut pass = ReconciliationPass::new(&mut ledger, &fetcher, &scholar, &arxiv);
        pass.run(&base_dir, &roots, args.prune)
            .await
            .context("reconciliation failed")?
    };

    println!("Ledger entries: {}", report.ledgered);
    println!("PDFs on disk:   {}", report.on_disk);
    if report.missing == 0 {
        println!("Every ledgered paper is present on disk.");
        return Ok(());
    }

    println!("Missing PDFs:   {}", report.missing);
    println!("Recovered:      {}", report.recovered.len());
    if let Some(dir) = &report.recovery_dir {
        println!("Recovered files were written to {}", dir.display());
        println!("Note: the ledger keeps the original filenames; recovered copies live only in that directory.");
    }

    if !report.unrecoverable.is_empty() {
        println!("\nUnrecoverable ({}):", report.unrecoverable.len());
        for (id, title) in &report.unrecoverable {
            println!("  - {id}: {title}");
        }
        if report.pruned {
            println!("These entries were removed from the ledger (--prune).");
        } else {
            println!("Re-run with --prune to remove them from the ledger.");
        }
    }

    Ok(())
}
