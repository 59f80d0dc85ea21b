//! listing-scribe CLI - LLM-generated ratings, reviews, summaries and rewrites
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use listing_scribe::jobs::{self, Job, RatingReviewJob, RewriteJob, SeenIds, SummaryJob};
use listing_scribe::{listing, ChatClient, Config, Storage};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "listing-scribe")]
#[command(author, version, about = "Generate listing ratings, reviews, summaries and rewrites with a local LLM", long_about = None)]
struct Cli {
    /// Config file (default: listing-scribe.toml in cwd or ~/.config/listing-scribe/)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// CSV file of listings, overriding the configured input
    #[arg(long, global = true)]
    input: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and save ratings and reviews for properties
    Rate,
    /// Generate and save summaries for properties
    Summarize,
    /// Rewrite property titles and descriptions
    Rewrite,
    /// Run the rating, summary and rewrite jobs in turn
    All,
    /// List stored records
    List {
        #[arg(value_enum)]
        kind: RecordKind,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RecordKind {
    Ratings,
    Summaries,
    Rewrites,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "listing-scribe",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let storage = Storage::open(&config.storage.path)?;
    let client = ChatClient::from_config(&config.llm)?;

    let rate = || -> Box<dyn Job> { Box::new(RatingReviewJob::new(client.clone())) };
    let summarize = || -> Box<dyn Job> { Box::new(SummaryJob::new(client.clone())) };
    let rewrite = || -> Box<dyn Job> {
        Box::new(RewriteJob::new(client.clone(), config.rewrite.title_max_chars))
    };

    let queue = match cli.command {
        Commands::Rate => vec![rate()],
        Commands::Summarize => vec![summarize()],
        Commands::Rewrite => vec![rewrite()],
        Commands::All => vec![rate(), summarize(), rewrite()],
        Commands::List { kind } => return list(&storage, kind),
        Commands::Completions { .. } => return Ok(()),
    };

    let input = cli.input.unwrap_or_else(|| config.input.path.clone());
    let listings = listing::read_listings(&input)?;
    tracing::info!(
        input = %input.display(),
        rows = listings.len(),
        model = client.model(),
        "starting"
    );

    for job in &queue {
        run(job.as_ref(), &listings, &storage).await?;
    }

    Ok(())
}

/// Run one job over every listing with a fresh duplicate set
async fn run(job: &dyn Job, listings: &[listing::Listing], storage: &Storage) -> anyhow::Result<()> {
    let (report, _seen) = jobs::run_pass(job, listings, SeenIds::new(), storage).await?;
    println!("{}", format!("✅ {}", report).green());
    if report.fallbacks > 0 {
        println!(
            "{}",
            format!("⚠️  {} generated fields used fallback values", report.fallbacks).yellow()
        );
    }
    Ok(())
}

fn list(storage: &Storage, kind: RecordKind) -> anyhow::Result<()> {
    match kind {
        RecordKind::Ratings => {
            let records = storage.rating_reviews()?;
            println!("Stored ratings ({}):\n", records.len());
            for record in records {
                println!("⭐ {} ({})", record, record.created_at.format("%Y-%m-%d %H:%M"));
                println!("   {}\n", record.review);
            }
        }
        RecordKind::Summaries => {
            let records = storage.summaries()?;
            println!("Stored summaries ({}):\n", records.len());
            for record in records {
                println!("📄 {} ({})", record, record.created_at.format("%Y-%m-%d %H:%M"));
                println!("   {}\n", record.summary);
            }
        }
        RecordKind::Rewrites => {
            let records = storage.rewrites()?;
            println!("Stored rewrites ({}):\n", records.len());
            for record in records {
                println!("✏️  {} ({})", record, record.created_at.format("%Y-%m-%d %H:%M"));
                println!("   {}\n", record.description);
            }
        }
    }
    Ok(())
}
