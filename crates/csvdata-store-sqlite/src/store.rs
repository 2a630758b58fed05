// crates/csvdata-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite CSV Data Store
// Description: Durable CsvDataStore backed by SQLite.
// Purpose: Create the `csvdata` table, insert uploads atomically, run filters.
// Dependencies: csvdata-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteCsvDataStore`] owns one connection behind a mutex. All SQL text is
//! assembled from the compile-time column table in `csvdata_core`; request
//! data only ever reaches `SQLite` as bound named parameters.
//!
//! The table is `STRICT`, so integer columns refuse text, and text columns
//! carry `CHECK` constraints for their length limits. A constraint failure on
//! any row aborts the whole upload transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use csvdata_core::CellValue;
use csvdata_core::ColumnKind;
use csvdata_core::CsvDataStore;
use csvdata_core::EnrollmentRecord;
use csvdata_core::FieldValue;
use csvdata_core::ID_COLUMN;
use csvdata_core::RECORD_FIELDS;
use csvdata_core::RecordFilter;
use csvdata_core::ResultSet;
use csvdata_core::StoreError;
use csvdata_core::TABLE_NAME;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::ToSql;
use rusqlite::params;
use rusqlite::types::Value;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` csv data store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a config for `path` with default tuning.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages never embed row contents beyond the engine message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// A row insert failed; the transaction was rolled back.
    #[error("sqlite store row {row} insert failed: {message}")]
    RowInsert {
        /// 1-based data row number.
        row: usize,
        /// Engine message.
        message: String,
    },
    /// Invalid store configuration or data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Db(message),
            SqliteStoreError::RowInsert {
                row,
                message,
            } => Self::RowInsert {
                row,
                message,
            },
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps an engine error to [`SqliteStoreError::Db`].
fn db_error(err: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: SQL
// ============================================================================

/// Returns the idempotent `CREATE TABLE` statement.
#[must_use]
pub fn create_table_sql() -> String {
    let mut columns = vec![format!("{ID_COLUMN} INTEGER PRIMARY KEY AUTOINCREMENT")];
    for field in RECORD_FIELDS {
        let name = field.column_name();
        let column = match field.kind() {
            ColumnKind::Text {
                max_len,
            } => format!("{name} TEXT CHECK ({name} IS NULL OR length({name}) <= {max_len})"),
            ColumnKind::Integer => format!("{name} INTEGER"),
        };
        columns.push(column);
    }
    format!("CREATE TABLE IF NOT EXISTS {TABLE_NAME} (\n    {}\n) STRICT;", columns.join(",\n    "))
}

/// Returns the insert statement binding every non-id field by name.
#[must_use]
pub fn insert_sql() -> String {
    let names: Vec<&str> = RECORD_FIELDS.iter().map(|field| field.column_name()).collect();
    let placeholders: Vec<String> = names.iter().map(|name| format!(":{name}")).collect();
    format!(
        "INSERT INTO {TABLE_NAME} ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
    )
}

/// Builds the filtered select statement and its bound values.
fn select_sql(filter: &RecordFilter) -> (String, Vec<(&'static str, Value)>) {
    let mut sql = format!("SELECT * FROM {TABLE_NAME} WHERE 1=1");
    let mut bound = Vec::new();
    if let Some(ac_year) = &filter.ac_year {
        sql.push_str(" AND ac_year = :ac_year");
        bound.push((":ac_year", Value::Text(ac_year.clone())));
    }
    if let Some(state_name) = &filter.state_name {
        sql.push_str(" AND state_name = :state_name");
        bound.push((":state_name", Value::Text(state_name.clone())));
    }
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT :limit");
        bound.push((":limit", Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX))));
    }
    (sql, bound)
}

/// Converts a record field value to an owned `SQLite` value.
fn sql_value(value: FieldValue<'_>) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Integer(number) => Value::Integer(number),
        FieldValue::Text(text) => Value::Text(text.to_string()),
    }
}

/// Converts a borrowed `SQLite` value to a result cell.
fn cell_value(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(number) => CellValue::Integer(number),
        ValueRef::Real(number) => CellValue::Real(number),
        ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Blob(bytes.to_vec()),
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed csv data store.
///
/// # Invariants
/// - `SQLite` connection access is serialized through a mutex.
/// - Each `insert_records` call runs in exactly one transaction.
#[derive(Clone)]
pub struct SqliteCsvDataStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
    /// Cached insert statement text.
    insert_sql: Arc<str>,
    /// Named parameters for the insert statement, in column order.
    insert_params: Arc<[String]>,
}

impl SqliteCsvDataStore {
    /// Opens an `SQLite`-backed csv data store.
    ///
    /// The `csvdata` table is not created here; ingestion creates it lazily.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is unsafe or the database
    /// cannot be opened.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let connection = open_connection(&config)?;
        let insert_params: Vec<String> =
            RECORD_FIELDS.iter().map(|field| format!(":{}", field.column_name())).collect();
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
            insert_sql: Arc::from(insert_sql()),
            insert_params: Arc::from(insert_params),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite store mutex poisoned".to_string()))
    }

    /// Executes the idempotent schema statement.
    fn create_table(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.execute_batch(&create_table_sql()).map_err(|err| db_error(&err))
    }

    /// Inserts records inside one transaction.
    fn insert_all(&self, records: &[EnrollmentRecord]) -> Result<u64, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        {
            let mut stmt = tx.prepare(&self.insert_sql).map_err(|err| db_error(&err))?;
            for (index, record) in records.iter().enumerate() {
                let values: Vec<Value> =
                    record.values().map(|(_, value)| sql_value(value)).collect();
                let bound: Vec<(&str, &dyn ToSql)> = self
                    .insert_params
                    .iter()
                    .zip(values.iter())
                    .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
                    .collect();
                stmt.execute(bound.as_slice()).map_err(|err| SqliteStoreError::RowInsert {
                    row: index + 1,
                    message: err.to_string(),
                })?;
            }
        }
        tx.commit().map_err(|err| db_error(&err))?;
        u64::try_from(records.len())
            .map_err(|_| SqliteStoreError::Invalid("row count exceeds u64".to_string()))
    }

    /// Runs a filtered select.
    fn select(&self, filter: &RecordFilter) -> Result<ResultSet, SqliteStoreError> {
        let guard = self.lock()?;
        let (sql, bound) = select_sql(filter);
        let params: Vec<(&str, &dyn ToSql)> =
            bound.iter().map(|(name, value)| (*name, value as &dyn ToSql)).collect();
        let mut stmt = guard.prepare(&sql).map_err(|err| db_error(&err))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let width = columns.len();
        let mut rows = stmt.query(params.as_slice()).map_err(|err| db_error(&err))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(|err| db_error(&err))? {
            let mut cells = Vec::with_capacity(width);
            for index in 0 .. width {
                let value = row.get_ref(index).map_err(|err| db_error(&err))?;
                cells.push(cell_value(value));
            }
            out.push(cells);
        }
        Ok(ResultSet {
            columns,
            rows: out,
        })
    }

    /// Counts rows, returning zero when the table is absent.
    fn count_rows(&self) -> Result<u64, SqliteStoreError> {
        let guard = self.lock()?;
        let tables: i64 = guard
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![TABLE_NAME],
                |row| row.get(0),
            )
            .map_err(|err| db_error(&err))?;
        if tables == 0 {
            return Ok(0);
        }
        let count: i64 = guard
            .query_row(&format!("SELECT COUNT(*) FROM {TABLE_NAME}"), [], |row| row.get(0))
            .map_err(|err| db_error(&err))?;
        u64::try_from(count).map_err(|_| SqliteStoreError::Invalid("negative row count".to_string()))
    }

    /// Verifies the store can execute a simple SQL statement.
    fn check_connection(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).map_err(|err| db_error(&err))?;
        Ok(())
    }
}

impl CsvDataStore for SqliteCsvDataStore {
    fn ensure_table(&self) -> Result<(), StoreError> {
        self.create_table().map_err(StoreError::from)
    }

    fn insert_records(&self, records: &[EnrollmentRecord]) -> Result<u64, StoreError> {
        self.insert_all(records).map_err(StoreError::from)
    }

    fn query(&self, filter: &RecordFilter) -> Result<ResultSet, StoreError> {
        self.select(filter).map_err(StoreError::from)
    }

    fn count(&self) -> Result<u64, StoreError> {
        self.count_rows().map_err(StoreError::from)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.check_connection().map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection =
        Connection::open_with_flags(&config.path, flags).map_err(|err| db_error(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas for durability and lock waiting.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
