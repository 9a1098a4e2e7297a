use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::bridge::{bridge_record_set, BRIDGE_TABLE};
use crate::clean::clean;
use crate::config::EtlConfig;
use crate::constants::ROUTING_TABLE;
use crate::error::Result;
use crate::reader::load_record_set;
use crate::sink::SinkWriter;
use crate::storage::TableStore;
use crate::types::{EntryOutcome, LoadOutcome, RoutingEntry, RunSummary};

/// Batch orchestrator. Replaces the bridge table, then sweeps the routing
/// entries, isolating every per-entry failure so one bad file never aborts
/// the run.
pub struct Pipeline {
    config: EtlConfig,
    store: Arc<dyn TableStore>,
    sink: SinkWriter,
}

impl Pipeline {
    pub fn new(config: EtlConfig, store: Arc<dyn TableStore>) -> Self {
        let sink = SinkWriter::new(config.clean_data_root.clone(), store.clone());
        Self {
            config,
            store,
            sink,
        }
    }

    /// Runs the full batch over every routed source file. Partial success
    /// is expected: tables replaced by earlier entries stay replaced even
    /// when a later entry fails.
    pub async fn run(&self) -> RunSummary {
        self.run_entries(&ROUTING_TABLE).await
    }

    /// Runs the batch restricted to the given routing entries. Entries
    /// outside the subset are not touched and do not appear in the summary.
    pub async fn run_entries(&self, entries: &[RoutingEntry]) -> RunSummary {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, policy = %self.config.null_policy, "starting batch run");

        let bridge = self.generate_bridge().await;

        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            let outcome = self.process_entry(entry).await;
            match &outcome {
                LoadOutcome::SkippedMissing => {
                    warn!("source file not found: {}", entry.source_file);
                    println!("⚠️ File not found: {}\n", entry.source_file);
                }
                LoadOutcome::Loaded { rows } => {
                    info!("loaded {} rows into {}", rows, entry.table);
                    println!(" -> ✅ Success! ({rows} rows)\n");
                }
                LoadOutcome::Failed { error } => {
                    error!("processing {} failed: {}", entry.source_file, error);
                    println!("❌ Error processing {}: {error}\n", entry.source_file);
                }
            }
            outcomes.push(EntryOutcome {
                name: entry.name,
                source_file: entry.source_file,
                table: entry.table,
                outcome,
            });
        }

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            policy: self.config.null_policy,
            bridge,
            entries: outcomes,
        };
        info!(
            %run_id,
            loaded = summary.loaded_count(),
            skipped = summary.skipped_count(),
            failed = summary.failed_count(),
            "batch run complete"
        );
        summary
    }

    /// One routed file, behind the error boundary that keeps per-file
    /// failures non-fatal.
    #[instrument(skip(self), fields(source = %entry.source_file))]
    async fn process_entry(&self, entry: &RoutingEntry) -> LoadOutcome {
        match self.load_entry(entry).await {
            Ok(outcome) => outcome,
            Err(e) => LoadOutcome::Failed {
                error: e.to_string(),
            },
        }
    }

    async fn load_entry(&self, entry: &RoutingEntry) -> Result<LoadOutcome> {
        let path = self.config.raw_data_root.join(entry.source_file);
        if !path.exists() {
            return Ok(LoadOutcome::SkippedMissing);
        }

        info!("processing {}", entry.source_file);
        println!("Processing {}...", entry.source_file);
        let raw = load_record_set(&path)?;
        let cleaned = clean(raw, self.config.null_policy);

        println!(" -> Uploading to {}...", entry.table);
        let rows = self
            .sink
            .write(&cleaned, entry.source_file, entry.table)
            .await?;
        Ok(LoadOutcome::Loaded { rows })
    }

    /// The bridge runs once per batch, before the file loop, in its own
    /// failure domain. It goes straight to the table store; there is no
    /// CSV backup for generated data.
    async fn generate_bridge(&self) -> LoadOutcome {
        info!("generating vaccine-disease bridge table");
        println!("Generating Vaccine-Disease Bridge Table...");
        let bridge = bridge_record_set();
        match self.store.replace_table(BRIDGE_TABLE, &bridge).await {
            Ok(rows) => {
                info!("bridge table replaced with {rows} rows");
                println!(" -> ✅ Success! Bridge table uploaded.\n");
                LoadOutcome::Loaded { rows }
            }
            Err(e) => {
                error!("bridge table upload failed: {e}");
                println!(" -> ❌ Error uploading bridge table: {e}\n");
                LoadOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
