use async_trait::async_trait;
use libsql::{Builder, Connection};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::{EtlError, Result};
use crate::storage::TableStore;
use crate::types::{RecordSet, Value};

/// Relational sink over libSQL, either a Turso-style remote URL or a local
/// database file. One connection is opened up front and reused for every
/// write in the run.
pub struct DatabaseManager {
    conn: Connection,
}

impl DatabaseManager {
    /// Connects according to the config. Remote URLs (`libsql://`,
    /// `http://`, `https://`) use the auth token; anything else is opened
    /// as a local file.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config.url.clone();
        let db = if is_remote_url(&url) {
            let auth_token = config.auth_token.clone().unwrap_or_default();
            info!("connecting to remote database at {url}");
            Builder::new_remote(url, auth_token)
                .build()
                .await
                .map_err(|e| EtlError::Database {
                    message: format!("failed to connect to database: {e}"),
                })?
        } else {
            info!("opening local database at {url}");
            Builder::new_local(&url)
                .build()
                .await
                .map_err(|e| EtlError::Database {
                    message: format!("failed to open local database: {e}"),
                })?
        };

        let conn = db.connect().map_err(|e| EtlError::Database {
            message: format!("failed to get database connection: {e}"),
        })?;

        Ok(Self { conn })
    }
}

fn is_remote_url(url: &str) -> bool {
    url.starts_with("libsql://") || url.starts_with("http://") || url.starts_with("https://")
}

#[async_trait]
impl TableStore for DatabaseManager {
    async fn ping(&self) -> Result<()> {
        self.conn
            .query("SELECT 1", libsql::params![])
            .await
            .map_err(|e| EtlError::Database {
                message: format!("database unreachable: {e}"),
            })?;
        Ok(())
    }

    async fn replace_table(&self, table: &str, data: &RecordSet) -> Result<usize> {
        if data.column_count() == 0 {
            return Err(EtlError::Database {
                message: format!("cannot replace {table} from a zero-column record set"),
            });
        }

        let quoted = quote_identifier(table);
        self.conn
            .execute(&format!("DROP TABLE IF EXISTS {quoted}"), libsql::params![])
            .await
            .map_err(|e| EtlError::Database {
                message: format!("failed to drop {table}: {e}"),
            })?;

        self.conn
            .execute(&create_table_sql(table, data), libsql::params![])
            .await
            .map_err(|e| EtlError::Database {
                message: format!("failed to create {table}: {e}"),
            })?;

        let insert = insert_sql(table, data.columns());
        let mut written = 0usize;
        for row in data.rows() {
            let params: Vec<libsql::Value> = row.iter().map(bind_value).collect();
            self.conn
                .execute(&insert, params)
                .await
                .map_err(|e| EtlError::Database {
                    message: format!("failed to insert into {table}: {e}"),
                })?;
            written += 1;
        }
        debug!("replaced table {table} with {written} rows");
        Ok(written)
    }
}

/// Declared affinity follows the values: integer-only columns (nulls
/// allowed) become INTEGER, any float makes the column REAL, bools count as
/// integers, and anything textual or wholly null stays TEXT.
fn column_affinity(data: &RecordSet, idx: usize) -> &'static str {
    let mut saw_int = false;
    let mut saw_float = false;
    for row in data.rows() {
        match &row[idx] {
            Value::Null => {}
            Value::Int(_) | Value::Bool(_) => saw_int = true,
            Value::Float(_) => saw_float = true,
            Value::Text(_) => return "TEXT",
        }
    }
    if saw_float {
        "REAL"
    } else if saw_int {
        "INTEGER"
    } else {
        "TEXT"
    }
}

fn create_table_sql(table: &str, data: &RecordSet) -> String {
    let columns = data
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| format!("{} {}", quote_identifier(name), column_affinity(data, idx)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({columns})", quote_identifier(table))
}

fn insert_sql(table: &str, columns: &[String]) -> String {
    let cols = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({cols}) VALUES ({placeholders})",
        quote_identifier(table)
    )
}

/// Double-quotes an SQL identifier, escaping embedded quotes.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn bind_value(value: &Value) -> libsql::Value {
    match value {
        Value::Null => libsql::Value::Null,
        Value::Int(i) => libsql::Value::Integer(*i),
        Value::Float(f) => libsql::Value::Real(*f),
        Value::Bool(b) => libsql::Value::Integer(i64::from(*b)),
        Value::Text(s) => libsql::Value::Text(s.clone()),
    }
}
