use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{EtlError, Result};

/// A single cell in a record set.
///
/// Floats are constructed through [`Value::from_f64`], which maps non-finite
/// numbers to `Null` and collapses negative zero, so the bit-pattern based
/// `Eq` and `Hash` impls below agree with `PartialEq`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    /// Builds a float cell. NaN and infinities become `Null`.
    pub fn from_f64(f: f64) -> Value {
        if !f.is_finite() {
            return Value::Null;
        }
        if f == 0.0 {
            return Value::Float(0.0);
        }
        Value::Float(f)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for `Int` and `Float` cells.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

/// Renders the cell the way it appears in a clean CSV backup. `Null` is an
/// empty field.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Ordered rows under named columns, the unit of data handed between the
/// readers, the cleaning rules, and the sinks.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RecordSet {
    /// Builds a record set, rejecting rows whose width does not match the
    /// header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let width = columns.len();
        if let Some(bad) = rows.iter().position(|row| row.len() != width) {
            return Err(EtlError::MalformedSource(format!(
                "row {} has {} cells, expected {}",
                bad + 1,
                rows[bad].len(),
                width
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell lookup by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Decomposes into columns and rows for transforms that rebuild the set.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }

    /// Rebuilds from parts already known to be rectangular.
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }
}

/// Governs what happens to cells in recognized numeric columns that cannot
/// be read as numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NullPolicy {
    /// Unreadable values become 0 and every row survives.
    ZeroFill,
    /// Unreadable values stay null, except in `year`, where the whole row
    /// is dropped.
    #[default]
    NullPreserving,
}

impl std::fmt::Display for NullPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NullPolicy::ZeroFill => f.write_str("zero-fill"),
            NullPolicy::NullPreserving => f.write_str("null-preserving"),
        }
    }
}

/// Static mapping from one source file to one destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingEntry {
    /// Short handle used to select a subset of entries from the CLI.
    pub name: &'static str,
    pub source_file: &'static str,
    pub table: &'static str,
}

/// What happened to one routed file during a batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// The source file was not present under the raw data root.
    SkippedMissing,
    /// Cleaned and written to both sinks.
    Loaded { rows: usize },
    /// Loading, cleaning, or writing failed; the batch continued.
    Failed { error: String },
}

/// Per-entry slice of a run summary.
#[derive(Debug, Clone, Serialize)]
pub struct EntryOutcome {
    pub name: &'static str,
    pub source_file: &'static str,
    pub table: &'static str,
    pub outcome: LoadOutcome,
}

/// Result of one complete batch run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub policy: NullPolicy,
    pub bridge: LoadOutcome,
    pub entries: Vec<EntryOutcome>,
}

impl RunSummary {
    pub fn loaded_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, LoadOutcome::Loaded { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, LoadOutcome::SkippedMissing))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, LoadOutcome::Failed { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn from_f64_maps_non_finite_to_null() {
        assert_eq!(Value::from_f64(f64::NAN), Value::Null);
        assert_eq!(Value::from_f64(f64::INFINITY), Value::Null);
        assert_eq!(Value::from_f64(f64::NEG_INFINITY), Value::Null);
        assert_eq!(Value::from_f64(95.5), Value::Float(95.5));
    }

    #[test]
    fn from_f64_collapses_negative_zero() {
        let zero = Value::from_f64(-0.0);
        assert_eq!(zero, Value::Float(0.0));
        let mut set = HashSet::new();
        set.insert(zero);
        assert!(set.contains(&Value::from_f64(0.0)));
    }

    #[test]
    fn equal_values_hash_alike() {
        let mut set = HashSet::new();
        set.insert(Value::Int(2020));
        set.insert(Value::Text("2020".to_string()));
        set.insert(Value::from_f64(0.5));
        assert!(set.contains(&Value::Int(2020)));
        assert!(set.contains(&Value::Text("2020".to_string())));
        assert!(set.contains(&Value::from_f64(0.5)));
        assert!(!set.contains(&Value::Int(2021)));
    }

    #[test]
    fn int_and_float_forms_are_distinct_values() {
        assert_ne!(Value::Int(2020), Value::from_f64(2020.0));
    }

    #[test]
    fn record_set_rejects_ragged_rows() {
        let result = RecordSet::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Value::Int(1), Value::Int(2)], vec![Value::Int(3)]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn cell_lookup_by_column_name() {
        let set = RecordSet::new(
            vec!["year".to_string(), "coverage".to_string()],
            vec![vec![Value::Int(2020), Value::from_f64(95.5)]],
        )
        .unwrap();
        assert_eq!(set.cell(0, "coverage"), Some(&Value::Float(95.5)));
        assert_eq!(set.cell(0, "missing"), None);
        assert_eq!(set.cell(9, "year"), None);
    }

    #[test]
    fn null_renders_as_empty_field() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Int(3).to_string(), "3");
        assert_eq!(Value::from_f64(1.5).to_string(), "1.5");
    }
}
