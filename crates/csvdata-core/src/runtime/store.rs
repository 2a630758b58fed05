// crates/csvdata-core/src/runtime/store.rs
// ============================================================================
// Module: CSV Data In-Memory Store
// Description: In-memory `csvdata` table for tests and local demos.
// Purpose: Provide a store with the same observable semantics as SQLite.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryCsvDataStore`] keeps rows behind a mutex and mirrors the SQLite
//! store: the table exists only after [`CsvDataStore::ensure_table`], ids
//! increase monotonically and are never reused, text length limits are
//! checked, and a failing batch leaves no rows behind.
//!
//! [`SharedCsvDataStore`] wraps any store in a clonable `Arc` handle that is
//! built once at startup and passed to both services.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::CellValue;
use crate::core::EnrollmentRecord;
use crate::core::RECORD_FIELDS;
use crate::core::RecordFilter;
use crate::core::ResultSet;
use crate::core::TABLE_NAME;
use crate::core::table_columns;
use crate::interfaces::CsvDataStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Table contents guarded by the store mutex.
#[derive(Debug, Default)]
struct InMemoryTable {
    /// Whether `ensure_table` has run.
    created: bool,
    /// Highest id ever assigned.
    last_id: i64,
    /// Stored rows with their ids, in insertion order.
    rows: Vec<(i64, EnrollmentRecord)>,
}

/// In-memory `csvdata` store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCsvDataStore {
    /// Table state protected by a mutex.
    table: Arc<Mutex<InMemoryTable>>,
}

impl InMemoryCsvDataStore {
    /// Creates a new store with no table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes rows matching `predicate` without touching the id sequence.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Store`] when the mutex is poisoned.
    #[cfg(test)]
    pub(crate) fn remove_where(
        &self,
        predicate: impl Fn(i64, &EnrollmentRecord) -> bool,
    ) -> Result<usize, StoreError> {
        let mut guard = lock_table(&self.table)?;
        let before = guard.rows.len();
        guard.rows.retain(|(id, record)| !predicate(*id, record));
        Ok(before - guard.rows.len())
    }
}

/// Locks the table mutex.
fn lock_table(
    table: &Mutex<InMemoryTable>,
) -> Result<MutexGuard<'_, InMemoryTable>, StoreError> {
    table.lock().map_err(|_| StoreError::Store("csv data store mutex poisoned".to_string()))
}

/// Error reported when the table has not been created.
fn missing_table() -> StoreError {
    StoreError::Db(format!("no such table: {TABLE_NAME}"))
}

impl CsvDataStore for InMemoryCsvDataStore {
    fn ensure_table(&self) -> Result<(), StoreError> {
        lock_table(&self.table)?.created = true;
        Ok(())
    }

    fn insert_records(&self, records: &[EnrollmentRecord]) -> Result<u64, StoreError> {
        let mut guard = lock_table(&self.table)?;
        if !guard.created {
            return Err(missing_table());
        }
        for (index, record) in records.iter().enumerate() {
            record.check_lengths().map_err(|err| StoreError::RowInsert {
                row: index + 1,
                message: err.to_string(),
            })?;
        }
        for record in records {
            guard.last_id += 1;
            let id = guard.last_id;
            guard.rows.push((id, record.clone()));
        }
        Ok(records.len() as u64)
    }

    fn query(&self, filter: &RecordFilter) -> Result<ResultSet, StoreError> {
        let guard = lock_table(&self.table)?;
        if !guard.created {
            return Err(missing_table());
        }
        let limit = filter.limit.map_or(usize::MAX, |limit| {
            usize::try_from(limit).unwrap_or(usize::MAX)
        });
        let rows = guard
            .rows
            .iter()
            .filter(|(_, record)| {
                filter.matches(record.ac_year.as_deref(), record.state_name.as_deref())
            })
            .take(limit)
            .map(|(id, record)| row_cells(*id, record))
            .collect();
        Ok(ResultSet {
            columns: table_columns().into_iter().map(str::to_string).collect(),
            rows,
        })
    }

    fn count(&self) -> Result<u64, StoreError> {
        let guard = lock_table(&self.table)?;
        Ok(guard.rows.len() as u64)
    }
}

/// Builds result cells for one stored row.
fn row_cells(id: i64, record: &EnrollmentRecord) -> Vec<CellValue> {
    let mut cells = Vec::with_capacity(RECORD_FIELDS.len() + 1);
    cells.push(CellValue::Integer(id));
    cells.extend(RECORD_FIELDS.iter().map(|field| CellValue::from(record.get(*field))));
    cells
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared `csvdata` store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedCsvDataStore {
    /// Inner store implementation.
    inner: Arc<dyn CsvDataStore + Send + Sync>,
}

impl SharedCsvDataStore {
    /// Wraps a store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl CsvDataStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn CsvDataStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl CsvDataStore for SharedCsvDataStore {
    fn ensure_table(&self) -> Result<(), StoreError> {
        self.inner.ensure_table()
    }

    fn insert_records(&self, records: &[EnrollmentRecord]) -> Result<u64, StoreError> {
        self.inner.insert_records(records)
    }

    fn query(&self, filter: &RecordFilter) -> Result<ResultSet, StoreError> {
        self.inner.query(filter)
    }

    fn count(&self) -> Result<u64, StoreError> {
        self.inner.count()
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.inner.readiness()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
