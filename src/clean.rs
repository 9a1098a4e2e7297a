use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::constants::{NUMERIC_COLUMNS, REQUIRED_YEAR_COLUMN};
use crate::types::{NullPolicy, RecordSet, Value};

/// Runs the full cleaning ruleset: header normalization, numeric coercion
/// under the given null policy, then exact-duplicate removal.
pub fn clean(record_set: RecordSet, policy: NullPolicy) -> RecordSet {
    let normalized = normalize_headers(record_set);
    let coerced = coerce_numeric_columns(normalized, policy);
    dedup_rows(coerced)
}

/// Canonical form of one raw header: whitespace trimmed, lowercased, and
/// interior spaces replaced with underscores.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Normalizes every column name. When two raw headers collide after
/// normalization the later column overwrites the earlier one: the surviving
/// column sits at the first occurrence's position and carries the last
/// occurrence's values.
pub fn normalize_headers(record_set: RecordSet) -> RecordSet {
    let (columns, rows) = record_set.into_parts();
    let normalized: Vec<String> = columns.iter().map(|c| normalize_header(c)).collect();

    let mut slot_for: HashMap<&str, usize> = HashMap::new();
    let mut keep: Vec<usize> = Vec::with_capacity(normalized.len());
    for (idx, name) in normalized.iter().enumerate() {
        if let Some(&slot) = slot_for.get(name.as_str()) {
            keep[slot] = idx;
        } else {
            slot_for.insert(name.as_str(), keep.len());
            keep.push(idx);
        }
    }

    if keep.len() == normalized.len() {
        return RecordSet::from_parts(normalized, rows);
    }

    debug!(
        "header collision: {} columns collapsed to {}",
        normalized.len(),
        keep.len()
    );
    let columns: Vec<String> = keep.iter().map(|&i| normalized[i].clone()).collect();
    let rows: Vec<Vec<Value>> = rows
        .into_iter()
        .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
        .collect();
    RecordSet::from_parts(columns, rows)
}

/// Converts recognized numeric columns to numeric form. A cell that cannot
/// be read as a number degrades to null, never to an error; the policy then
/// decides whether nulls become zero, stay null, or, for `year` under the
/// null-preserving policy, drop the whole row.
pub fn coerce_numeric_columns(record_set: RecordSet, policy: NullPolicy) -> RecordSet {
    let (columns, mut rows) = record_set.into_parts();

    for column in NUMERIC_COLUMNS {
        let Some(idx) = columns.iter().position(|c| c.as_str() == column) else {
            continue;
        };

        for row in rows.iter_mut() {
            let cell = std::mem::replace(&mut row[idx], Value::Null);
            row[idx] = coerce_value(cell);
        }

        match policy {
            NullPolicy::ZeroFill => {
                for row in rows.iter_mut() {
                    if row[idx].is_null() {
                        row[idx] = Value::Int(0);
                    }
                }
            }
            NullPolicy::NullPreserving => {
                if column == REQUIRED_YEAR_COLUMN {
                    let before = rows.len();
                    rows.retain(|row| !row[idx].is_null());
                    let dropped = before - rows.len();
                    if dropped > 0 {
                        debug!("dropped {dropped} rows with unreadable year");
                    }
                }
            }
        }
    }

    RecordSet::from_parts(columns, rows)
}

/// Coerces one cell to numeric form. Whole-number floats canonicalize to
/// `Int` so text and workbook renditions of the same number compare equal.
fn coerce_value(value: Value) -> Value {
    match value {
        Value::Int(_) | Value::Null => value,
        Value::Float(f) => canonical_number(f),
        Value::Bool(b) => Value::Int(i64::from(b)),
        Value::Text(s) => parse_number(s.trim()),
    }
}

fn parse_number(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = text.parse::<i64>() {
        return Value::Int(i);
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => canonical_number(f),
        _ => Value::Null,
    }
}

fn canonical_number(f: f64) -> Value {
    if !f.is_finite() {
        return Value::Null;
    }
    // i64::MAX as f64 rounds up to 2^63, which does not convert back
    // exactly, so the upper bound is exclusive.
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Value::Int(f as i64)
    } else {
        Value::from_f64(f)
    }
}

/// Removes rows that exactly duplicate an earlier row, keeping the first
/// occurrence and the relative order of the rest.
pub fn dedup_rows(record_set: RecordSet) -> RecordSet {
    let (columns, mut rows) = record_set.into_parts();
    let before = rows.len();
    let mut seen: HashSet<Vec<Value>> = HashSet::with_capacity(rows.len());
    rows.retain(|row| seen.insert(row.clone()));
    let removed = before - rows.len();
    if removed > 0 {
        debug!("removed {removed} duplicate rows");
    }
    RecordSet::from_parts(columns, rows)
}
