//! Incremental, append-only loading of a batch into the warehouse.
//!
//! The load is a two-phase protocol: take a snapshot of the stored keys, then
//! append the rows whose key is not in the snapshot. The two phases are not
//! atomic. Two runs against the same table can both see a key as new and
//! both append it. That duplicate is accepted; no upsert is attempted.

use crate::error::WarehouseError;
use crate::models::{find_field, Batch, BatchRow, FieldValue, Row};
use crate::warehouse::{key_column, TableRef, Warehouse};
use std::collections::HashSet;
use tracing::{info, warn};

/// Result of reading the stored key set
#[derive(Debug)]
pub enum KeySnapshot {
    Known(HashSet<i64>),
    Unavailable(WarehouseError),
}

impl KeySnapshot {
    pub async fn take<W: Warehouse + ?Sized>(warehouse: &W, table: &TableRef) -> Self {
        match warehouse.existing_keys(table).await {
            Ok(keys) => KeySnapshot::Known(keys),
            Err(e) => KeySnapshot::Unavailable(e),
        }
    }

    /// Fail-open: an unreadable key set is treated as empty, so every row
    /// counts as new.
    pub fn or_empty(self, table: &TableRef) -> HashSet<i64> {
        match self {
            KeySnapshot::Known(keys) => keys,
            KeySnapshot::Unavailable(e) => {
                warn!(
                    table = %table,
                    error = %e,
                    "Could not fetch existing keys, loading all rows"
                );
                HashSet::new()
            }
        }
    }
}

/// Integer key stored under `key`, if any.
fn row_key(row: &Row, key: &str) -> Option<i64> {
    match find_field(row, key) {
        Some((_, FieldValue::Integer(code))) => Some(*code),
        _ => None,
    }
}

/// Check that `key` names an integer field of every row.
fn check_key_field(rows: &[Row], key: &str) -> Result<(), WarehouseError> {
    let holds_keys = rows.iter().all(|row| {
        matches!(
            find_field(row, key),
            Some((_, FieldValue::Integer(_) | FieldValue::Null))
        )
    });
    if holds_keys {
        Ok(())
    } else {
        Err(WarehouseError::KeyNotInBatch {
            column: key.to_string(),
        })
    }
}

/// Rows whose key is not in `existing`. Rows without a key are always kept.
pub fn new_rows<'a>(rows: &'a [Row], key: &str, existing: &HashSet<i64>) -> Vec<&'a Row> {
    rows.iter()
        .filter(|row| row_key(row, key).map_or(true, |code| !existing.contains(&code)))
        .collect()
}

/// Append the rows of `batch` that `table` does not hold yet.
///
/// Returns the number of rows appended. Nothing is written when every row is
/// already stored. The batch and the destination must both carry
/// `table.key_column`, otherwise the load fails before anything is written.
pub async fn load<W: Warehouse + ?Sized>(
    batch: &Batch,
    warehouse: &W,
    table: &TableRef,
) -> Result<u64, WarehouseError> {
    let rows: Vec<Row> = batch.rows.iter().map(BatchRow::to_row).collect();
    check_key_field(&rows, &table.key_column)?;

    info!(table = %table, backend = warehouse.backend_name(), "Fetching existing keys");
    let existing = KeySnapshot::take(warehouse, table).await.or_empty(table);

    let fresh: Vec<Row> = new_rows(&rows, &table.key_column, &existing)
        .into_iter()
        .cloned()
        .collect();
    if fresh.is_empty() {
        info!(table = %table, "No new data to load, all properties are already in the table");
        return Ok(0);
    }

    let schema = warehouse.table_schema(table).await?;
    key_column(&schema, table)?;
    let dropped = schema.unmatched(&fresh[0]);
    if !dropped.is_empty() {
        warn!(table = %table, columns = ?dropped, "Batch fields missing from the table, dropping them");
    }

    info!(table = %table, rows = fresh.len(), "Loading new rows");
    let written = warehouse.append(table, &schema, &fresh).await?;
    info!(table = %table, rows = written, "Successfully loaded rows");

    Ok(written)
}
