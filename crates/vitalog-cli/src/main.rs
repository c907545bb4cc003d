//! vitalog command-line interface.
//!
//! Opens the SQLite store and drives ingestion, summarisation, and
//! retrieval. The database path resolves in order: `--db`, the config
//! file / `VITALOG_DB_PATH` environment variable, then
//! `~/.vitalog/vitalog.db`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vitalog_core::{Category, ReadingStore, store::SummaryQuery};
use vitalog_ingest::Ingestor;
use vitalog_store_sqlite::SqliteStore;
use vitalog_summarise::generate_summaries;

#[derive(Parser)]
#[command(author, version, about = "Personal biometric journal")]
struct Cli {
  /// Path to the SQLite database; overrides config and environment.
  #[arg(long)]
  db: Option<PathBuf>,

  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "~/.vitalog/config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Stream an Apple Health export into the store, then summarise.
  Ingest {
    /// Path to the export.xml file.
    export: PathBuf,

    /// Owning entity for the ingested readings.
    #[arg(long, default_value = "apple_health")]
    entity: String,

    /// Skip the summarisation pass after ingestion.
    #[arg(long)]
    no_summaries: bool,
  },

  /// Generate daily summaries for days that lack them.
  Summarise {
    #[arg(long, default_value = "apple_health")]
    entity: String,
  },

  /// Full-text search over summary narratives.
  Search {
    query: String,

    /// Restrict hits to one category.
    #[arg(long)]
    category: Option<Category>,

    #[arg(long, default_value_t = 20)]
    limit: usize,
  },

  /// Per-category reading counts.
  Stats {
    #[arg(long, default_value = "apple_health")]
    entity: String,
  },
}

/// Settings accepted from the config file or `VITALOG_`-prefixed
/// environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
struct AppConfig {
  db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let db_path = resolve_db_path(&cli)?;
  if let Some(dir) = db_path.parent() {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("failed to create {dir:?}"))?;
  }
  let store = SqliteStore::open(&db_path)
    .await
    .with_context(|| format!("failed to open store at {db_path:?}"))?;

  match cli.command {
    Command::Ingest {
      export,
      entity,
      no_summaries,
    } => {
      eprintln!("Ingesting {}...", export.display());
      let report = Ingestor::new()
        .ingest_file(&export, &entity, &store, |count| {
          eprint!("\r  parsed {count} readings...");
        })
        .await?;
      eprintln!();
      eprintln!("  inserted: {}", report.inserted);
      eprintln!("  skipped (dedup): {}", report.skipped);

      if !no_summaries {
        eprintln!("Generating daily summaries...");
        let written = generate_summaries(&store, &entity).await?;
        eprintln!("  generated {written} daily summaries");
      }

      print_breakdown(&store, &entity).await?;
      eprintln!("Done.");
    }

    Command::Summarise { entity } => {
      let written = generate_summaries(&store, &entity).await?;
      println!("generated {written} daily summaries");
    }

    Command::Search {
      query,
      category,
      limit,
    } => {
      let mut params = SummaryQuery::new(query);
      params.category = category;
      params.limit = Some(limit);
      for hit in store.search_summaries(&params).await? {
        println!("{} [{}] {}", hit.date, hit.category, hit.narrative);
      }
    }

    Command::Stats { entity } => {
      for (category, count) in store.category_counts(&entity).await? {
        println!(
          "{:<12} {:>9}  {}",
          category.as_str(),
          count,
          category.describe()
        );
      }
    }
  }

  Ok(())
}

async fn print_breakdown(store: &SqliteStore, entity: &str) -> anyhow::Result<()> {
  let counts = store.category_counts(entity).await?;
  if counts.is_empty() {
    return Ok(());
  }
  eprintln!("  breakdown:");
  for (category, count) in counts {
    eprintln!("    {category}: {count}");
  }
  Ok(())
}

fn resolve_db_path(cli: &Cli) -> anyhow::Result<PathBuf> {
  if let Some(db) = &cli.db {
    return Ok(expand_tilde(db));
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(expand_tilde(&cli.config)).required(false))
    .add_source(config::Environment::with_prefix("VITALOG"))
    .build()
    .context("failed to read configuration")?;
  let app: AppConfig = settings
    .try_deserialize()
    .context("failed to deserialise configuration")?;

  Ok(expand_tilde(
    &app
      .db_path
      .unwrap_or_else(|| PathBuf::from("~/.vitalog/vitalog.db")),
  ))
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
