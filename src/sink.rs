use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::storage::TableStore;
use crate::types::RecordSet;

/// Persists a cleaned record set twice: a CSV backup under the clean-data
/// root, then the destination table. The backup lands first and is not
/// rolled back when the table write fails.
pub struct SinkWriter {
    clean_data_root: PathBuf,
    store: Arc<dyn TableStore>,
}

impl SinkWriter {
    pub fn new(clean_data_root: PathBuf, store: Arc<dyn TableStore>) -> Self {
        Self {
            clean_data_root,
            store,
        }
    }

    /// Backup path for a source file: `clean_<stem>.csv` under the
    /// clean-data root.
    pub fn backup_path(&self, source_file: &str) -> PathBuf {
        let stem = Path::new(source_file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source_file.to_string());
        self.clean_data_root.join(format!("clean_{stem}.csv"))
    }

    /// Writes the backup and replaces the destination table, returning the
    /// rows written.
    pub async fn write(&self, data: &RecordSet, source_file: &str, table: &str) -> Result<usize> {
        fs::create_dir_all(&self.clean_data_root)?;
        let backup = self.backup_path(source_file);
        write_backup_csv(&backup, data)?;
        debug!("wrote backup {}", backup.display());

        let rows = self.store.replace_table(table, data).await?;
        info!("replaced table {table} with {rows} rows");
        Ok(rows)
    }
}

/// Serializes a record set as CSV: header row first, no index column, nulls
/// as empty fields.
pub fn write_backup_csv(path: &Path, data: &RecordSet) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if data.column_count() > 0 {
        writer.write_record(data.columns())?;
        for row in data.rows() {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use crate::types::Value;

    fn sample_set() -> RecordSet {
        RecordSet::new(
            vec!["year".to_string(), "coverage".to_string()],
            vec![
                vec![Value::Int(2020), Value::Float(95.5)],
                vec![Value::Int(2021), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn backup_path_uses_the_source_stem() {
        let sink = SinkWriter::new(PathBuf::from("clean"), Arc::new(InMemoryStore::new()));
        assert_eq!(
            sink.backup_path("coverage-data.xlsx"),
            PathBuf::from("clean/clean_coverage-data.csv")
        );
        assert_eq!(
            sink.backup_path("reported-cases-data.csv"),
            PathBuf::from("clean/clean_reported-cases-data.csv")
        );
    }

    #[test]
    fn backup_csv_renders_nulls_as_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean_coverage-data.csv");
        write_backup_csv(&path, &sample_set()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "year,coverage\n2020,95.5\n2021,\n");
    }

    #[tokio::test]
    async fn write_lands_in_both_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let sink = SinkWriter::new(dir.path().join("clean"), store.clone());

        let rows = sink
            .write(&sample_set(), "coverage-data.xlsx", "vaccination_coverage")
            .await
            .unwrap();
        assert_eq!(rows, 2);
        assert!(dir.path().join("clean/clean_coverage-data.csv").exists());
        assert_eq!(store.table("vaccination_coverage"), Some(sample_set()));
    }
}
