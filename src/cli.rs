//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use harvester_core::search::SortOrder;

/// Search, rank, and batch download academic papers.
///
/// Harvester queries paper metadata providers, filters and ranks the
/// results against your criteria, downloads the matching PDFs, and keeps a
/// ledger so nothing is fetched twice.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search providers and download matching papers
    Search(SearchArgs),
    /// Verify ledgered papers exist on disk and re-acquire missing ones
    Check(CheckArgs),
}

#[derive(ClapArgs, Debug)]
pub struct SearchArgs {
    /// Comma-separated keyword groups matched against title or abstract
    #[arg(short, long)]
    pub keywords: Option<String>,

    /// Use a built-in keyword preset instead of --keywords (see --list-presets)
    #[arg(long, conflicts_with = "keywords")]
    pub preset: Option<String>,

    /// List the built-in keyword presets and exit
    #[arg(long)]
    pub list_presets: bool,

    /// Title phrase the papers must match
    #[arg(short, long)]
    pub title: Option<String>,

    /// Author name; repeat for multiple authors (all must match)
    #[arg(long = "author")]
    pub authors: Vec<String>,

    /// Space-separated terms, at least one of which must appear in the abstract
    #[arg(long = "abstract")]
    pub abstract_keywords: Option<String>,

    /// Earliest publication year (inclusive)
    #[arg(long)]
    pub year_from: Option<i32>,

    /// Latest publication year (inclusive)
    #[arg(long)]
    pub year_to: Option<i32>,

    /// Category tag, e.g. cs.LG; repeat for multiple (any may match)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Minimum citation count
    #[arg(long)]
    pub min_citations: Option<u64>,

    /// Maximum citation count
    #[arg(long)]
    pub max_citations: Option<u64>,

    /// Term that must appear in title or abstract; repeat for multiple (all required)
    #[arg(long = "include")]
    pub include_keywords: Vec<String>,

    /// Term that must not appear in title or abstract; repeat for multiple
    #[arg(long = "exclude")]
    pub exclude_keywords: Vec<String>,

    /// Ordering policy for accepted papers
    #[arg(long, default_value = "relevance")]
    pub sort_by: SortOrder,

    /// Maximum papers to download (1-500)
    #[arg(short = 'n', long, default_value_t = 20, value_parser = clap::value_parser!(u16).range(1..=500))]
    pub max_results: u16,

    /// Base directory for session folders and PDFs
    #[arg(short = 'd', long, default_value = "arxiv_papers")]
    pub download_dir: PathBuf,

    /// Ledger file recording downloaded papers
    #[arg(long, default_value = "papers_db.json")]
    pub ledger: PathBuf,

    /// Maximum retry attempts for transient fetch failures (1-10)
    #[arg(short = 'r', long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_retries: u8,
}

#[derive(ClapArgs, Debug)]
pub struct CheckArgs {
    /// Ledger file to verify
    #[arg(long, default_value = "papers_db.json")]
    pub ledger: PathBuf,

    /// Directory scanned for existing PDFs; repeat for multiple roots.
    /// Recovered files are written under the first one.
    #[arg(short = 'd', long = "download-dir", default_value = "arxiv_papers")]
    pub download_dirs: Vec<PathBuf>,

    /// Remove entries from the ledger when no provider can still serve them
    #[arg(long)]
    pub prune: bool,

    /// Maximum retry attempts for transient fetch failures (1-10)
    #[arg(short = 'r', long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_retries: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_search_defaults() {
        let args = Args::try_parse_from(["harvester", "search"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        let Command::Search(search) = args.command else {
            panic!("expected search subcommand");
        };
        assert_eq!(search.max_results, 20);
        assert_eq!(search.max_retries, 3);
        assert_eq!(search.sort_by, SortOrder::Relevance);
        assert_eq!(search.download_dir, PathBuf::from("arxiv_papers"));
        assert_eq!(search.ledger, PathBuf::from("papers_db.json"));
    }

    #[test]
    fn test_cli_search_accepts_all_criteria_flags() {
        let args = Args::try_parse_from([
            "harvester",
            "search",
            "--keywords",
            "AI, RL",
            "--title",
            "attention",
            "--author",
            "Vaswani",
            "--author",
            "Shazeer",
            "--abstract",
            "sparse attention",
            "--year-from",
            "2020",
            "--year-to",
            "2024",
            "--category",
            "cs.LG",
            "--min-citations",
            "10",
            "--max-citations",
            "1000",
            "--include",
            "transformer",
            "--exclude",
            "survey",
            "--sort-by",
            "citations-per-year",
            "-n",
            "5",
        ])
        .unwrap();
        let Command::Search(search) = args.command else {
            panic!("expected search subcommand");
        };
        assert_eq!(search.authors.len(), 2);
        assert_eq!(search.sort_by, SortOrder::CitationsPerYear);
        assert_eq!(search.max_results, 5);
        assert_eq!(search.min_citations, Some(10));
    }

    #[test]
    fn test_cli_search_rejects_zero_max_results() {
        let result = Args::try_parse_from(["harvester", "search", "-n", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_search_rejects_invalid_sort_order() {
        let result = Args::try_parse_from(["harvester", "search", "--sort-by", "pagerank"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_preset_conflicts_with_keywords() {
        let result = Args::try_parse_from([
            "harvester",
            "search",
            "--keywords",
            "AI",
            "--preset",
            "llm",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_check_defaults() {
        let args = Args::try_parse_from(["harvester", "check"]).unwrap();
        let Command::Check(check) = args.command else {
            panic!("expected check subcommand");
        };
        assert!(!check.prune);
        assert_eq!(check.download_dirs, vec![PathBuf::from("arxiv_papers")]);
    }

    #[test]
    fn test_cli_check_multiple_roots_and_prune() {
        let args = Args::try_parse_from([
            "harvester",
            "check",
            "-d",
            "arxiv_papers",
            "-d",
            "open_papers",
            "--prune",
        ])
        .unwrap();
        let Command::Check(check) = args.command else {
            panic!("expected check subcommand");
        };
        assert_eq!(check.download_dirs.len(), 2);
        assert!(check.prune);
    }

    #[test]
    fn test_cli_verbose_flag_is_global() {
        let args = Args::try_parse_from(["harvester", "search", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }
}
