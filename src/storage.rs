use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::types::RecordSet;

/// Destination store for cleaned relations. Every write replaces the whole
/// table; prior contents are discarded, never merged.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Cheap connectivity probe. A store that fails here before the batch
    /// starts is treated as fatal.
    async fn ping(&self) -> Result<()>;

    /// Replaces `table` with the given rows and returns how many were
    /// written.
    async fn replace_table(&self, table: &str, data: &RecordSet) -> Result<usize>;
}

/// In-memory store for development and testing.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<HashMap<String, RecordSet>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one table, if it has been written.
    pub fn table(&self, name: &str) -> Option<RecordSet> {
        self.tables.lock().unwrap().get(name).cloned()
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl TableStore for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn replace_table(&self, table: &str, data: &RecordSet) -> Result<usize> {
        let rows = data.row_count();
        self.tables
            .lock()
            .unwrap()
            .insert(table.to_string(), data.clone());
        debug!("replaced in-memory table {table} with {rows} rows");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn two_row_set() -> RecordSet {
        RecordSet::new(
            vec!["year".to_string()],
            vec![vec![Value::Int(2020)], vec![Value::Int(2021)]],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn replace_overwrites_prior_contents() {
        let store = InMemoryStore::new();
        let first = two_row_set();
        assert_eq!(store.replace_table("t", &first).await.unwrap(), 2);

        let second = RecordSet::new(vec!["year".to_string()], vec![vec![Value::Int(1999)]])
            .unwrap();
        assert_eq!(store.replace_table("t", &second).await.unwrap(), 1);
        assert_eq!(store.table("t"), Some(second));
        assert_eq!(store.table_names(), ["t"]);
    }
}
