use super::{key_column, TableRef, TableSchema, Warehouse};
use crate::error::WarehouseError;
use crate::models::{FieldValue, Row};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

struct MemoryTable {
    schema: TableSchema,
    rows: Vec<Row>,
}

/// In-process warehouse, used by the test suites
#[derive(Default)]
pub struct MemoryWarehouse {
    tables: Mutex<HashMap<String, MemoryTable>>,
    fail_key_query: AtomicBool,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) an empty table
    pub fn create_table(&self, table: &TableRef, schema: TableSchema) {
        self.lock().insert(
            table.to_string(),
            MemoryTable {
                schema,
                rows: Vec::new(),
            },
        );
    }

    /// Make `existing_keys` fail until switched back off
    pub fn set_fail_key_query(&self, fail: bool) {
        self.fail_key_query.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of the stored rows
    pub fn rows(&self, table: &TableRef) -> Vec<Row> {
        self.lock()
            .get(&table.to_string())
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, MemoryTable>> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn not_found(table: &TableRef) -> WarehouseError {
    WarehouseError::TableNotFound {
        table: table.to_string(),
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn existing_keys(&self, table: &TableRef) -> Result<HashSet<i64>, WarehouseError> {
        if self.fail_key_query.load(Ordering::SeqCst) {
            return Err(WarehouseError::Unavailable(format!(
                "key query on {} failed",
                table
            )));
        }

        let tables = self.lock();
        let stored = tables.get(&table.to_string()).ok_or_else(|| not_found(table))?;
        let column = key_column(&stored.schema, table)?;
        Ok(stored
            .rows
            .iter()
            .filter_map(|row| match row.get(&column.name) {
                Some(FieldValue::Integer(key)) => Some(*key),
                _ => None,
            })
            .collect())
    }

    async fn table_schema(&self, table: &TableRef) -> Result<TableSchema, WarehouseError> {
        self.lock()
            .get(&table.to_string())
            .map(|t| t.schema.clone())
            .ok_or_else(|| not_found(table))
    }

    async fn append(
        &self,
        table: &TableRef,
        schema: &TableSchema,
        rows: &[Row],
    ) -> Result<u64, WarehouseError> {
        let projected = rows
            .iter()
            .map(|row| {
                let values = schema.project(row)?;
                Ok(schema
                    .columns
                    .iter()
                    .map(|c| c.name.clone())
                    .zip(values)
                    .collect::<Row>())
            })
            .collect::<Result<Vec<Row>, WarehouseError>>()?;

        let mut tables = self.lock();
        let stored = tables
            .get_mut(&table.to_string())
            .ok_or_else(|| not_found(table))?;
        stored.rows.extend(projected);
        Ok(rows.len() as u64)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
