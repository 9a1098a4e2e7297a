use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use vax_etl::config::{ConfigOverrides, EtlConfig};
use vax_etl::constants;
use vax_etl::db::DatabaseManager;
use vax_etl::logging;
use vax_etl::pipeline::Pipeline;
use vax_etl::storage::TableStore;
use vax_etl::types::{LoadOutcome, NullPolicy, RoutingEntry, RunSummary};

#[derive(Parser)]
#[command(name = "vax_etl")]
#[command(about = "Vaccination data transform-and-load pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the batch: bridge table first, then every routed source file
    Run {
        /// Specific sources to load (comma-separated).
        /// Available: coverage, incidence, cases, introduction, schedule
        #[arg(long)]
        sources: Option<String>,

        /// Null policy for recognized numeric columns
        #[arg(long, value_enum, default_value_t = NullPolicy::NullPreserving)]
        policy: NullPolicy,

        /// Directory holding the raw source files (env: RAW_DATA_ROOT)
        #[arg(long)]
        raw_root: Option<PathBuf>,

        /// Directory for the clean CSV backups (env: CLEAN_DATA_ROOT)
        #[arg(long)]
        clean_root: Option<PathBuf>,

        /// Database URL, `libsql://` remote or a local file path
        /// (env: DATABASE_URL)
        #[arg(long)]
        database_url: Option<String>,

        /// Auth token for remote databases (env: DATABASE_AUTH_TOKEN)
        #[arg(long)]
        auth_token: Option<String>,

        /// Write the run summary as JSON to this path
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            sources,
            policy,
            raw_root,
            clean_root,
            database_url,
            auth_token,
            summary_json,
        } => {
            let config = EtlConfig::resolve(ConfigOverrides {
                database_url,
                auth_token,
                raw_data_root: raw_root,
                clean_data_root: clean_root,
                null_policy: Some(policy),
            })
            .context("resolving configuration")?;

            let entries = select_entries(sources.as_deref())?;

            // Nothing is processed until the sink answers; an unreachable
            // database before the batch is fatal.
            let manager = DatabaseManager::connect(&config.database)
                .await
                .context("connecting to database")?;
            let store: Arc<dyn TableStore> = Arc::new(manager);
            store.ping().await.context("database connectivity check")?;
            println!("✅ Connected to database\n");

            let pipeline = Pipeline::new(config, store);
            let summary = pipeline.run_entries(&entries).await;

            print_summary(&summary);
            if let Some(path) = summary_json {
                let json = serde_json::to_string_pretty(&summary)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("writing summary to {}", path.display()))?;
                info!("wrote run summary to {}", path.display());
            }
        }
    }

    Ok(())
}

fn select_entries(sources: Option<&str>) -> anyhow::Result<Vec<RoutingEntry>> {
    let Some(list) = sources else {
        return Ok(constants::ROUTING_TABLE.to_vec());
    };
    let mut entries = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match constants::entry_by_name(name) {
            Some(entry) => entries.push(*entry),
            None => anyhow::bail!(
                "unknown source '{}'; available: {}",
                name,
                constants::supported_sources().join(", ")
            ),
        }
    }
    Ok(entries)
}

fn print_summary(summary: &RunSummary) {
    println!("\n📊 Batch Results (run {}):", summary.run_id);
    println!("   Policy: {}", summary.policy);
    match &summary.bridge {
        LoadOutcome::Loaded { rows } => println!("   Bridge table: {rows} rows"),
        LoadOutcome::Failed { error } => println!("   Bridge table: FAILED ({error})"),
        LoadOutcome::SkippedMissing => {}
    }
    for entry in &summary.entries {
        let status = match &entry.outcome {
            LoadOutcome::SkippedMissing => "skipped (missing)".to_string(),
            LoadOutcome::Loaded { rows } => format!("loaded ({rows} rows)"),
            LoadOutcome::Failed { error } => format!("failed: {error}"),
        };
        println!("   {} -> {}: {}", entry.source_file, entry.table, status);
    }
    println!(
        "   {} loaded, {} skipped, {} failed",
        summary.loaded_count(),
        summary.skipped_count(),
        summary.failed_count()
    );
}
