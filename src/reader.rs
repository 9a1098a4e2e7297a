use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::{EtlError, Result};
use crate::types::{RecordSet, Value};

/// Loads a source file into a record set. `.csv` goes through the
/// delimited-text reader; anything else goes through the workbook reader,
/// which sniffs the actual format and fails on unreadable content.
pub fn load_record_set(path: &Path) -> Result<RecordSet> {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        read_delimited(path)
    } else {
        read_workbook(path)
    }
}

/// CSV cells arrive untyped: non-empty fields load as text and empty fields
/// as null. Typing recognized columns is the cleaning step's job.
fn read_delimited(path: &Path) -> Result<RecordSet> {
    let mut reader = csv::Reader::from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Value::Null
                    } else {
                        Value::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    debug!("read {} rows from {}", rows.len(), path.display());
    RecordSet::new(columns, rows)
}

/// Reads the first sheet of a workbook. The first row becomes the header;
/// cells keep the types the workbook stored.
fn read_workbook(path: &Path) -> Result<RecordSet> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EtlError::MalformedSource(format!("{} has no sheets", path.display())))??;

    let mut rows_iter = range.rows();
    let columns: Vec<String> = match rows_iter.next() {
        Some(header) => header.iter().map(cell_to_header).collect(),
        None => return Ok(RecordSet::empty(Vec::new())),
    };

    let rows: Vec<Vec<Value>> = rows_iter
        .map(|row| row.iter().map(cell_to_value).collect())
        .collect();
    debug!("read {} rows from {}", rows.len(), path.display());
    RecordSet::new(columns, rows)
}

fn cell_to_header(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Maps one workbook cell to the internal value model. Floats go through
/// the finite-guard constructor, error cells degrade to null, and datetime
/// cells are carried as text.
fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(f) => Value::from_f64(*f),
        Data::Int(i) => Value::Int(*i),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(_) => Value::Null,
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| Value::Text(d.to_string()))
            .unwrap_or(Value::Null),
        Data::DateTimeIso(s) => Value::Text(s.clone()),
        Data::DurationIso(s) => Value::Text(s.clone()),
    }
}
