//! Destination table access.
//!
//! The loader needs three things from a warehouse: the set of keys already
//! stored, the destination schema, and an append-only bulk write.

pub mod memory;
pub mod postgres;
mod schema;

pub use memory::MemoryWarehouse;
pub use postgres::PgWarehouse;
pub use schema::{Column, ColumnType, TableSchema};

use crate::error::WarehouseError;
use crate::models::Row;
use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;

/// A destination table and its natural key column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Schema name, if the table was configured as `schema.table`
    pub schema: Option<String>,
    pub name: String,
    pub key_column: String,
}

impl TableRef {
    pub fn new(table: &str, key_column: &str) -> Self {
        let (schema, name) = match table.split_once('.') {
            Some((schema, name)) => (Some(schema.to_string()), name.to_string()),
            None => (None, table.to_string()),
        };
        Self {
            schema,
            name,
            key_column: key_column.to_string(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Column of `schema` holding the natural key of `table`
pub(crate) fn key_column<'a>(
    schema: &'a TableSchema,
    table: &TableRef,
) -> Result<&'a Column, WarehouseError> {
    schema
        .column(&table.key_column)
        .ok_or_else(|| WarehouseError::MissingKeyColumn {
            table: table.to_string(),
            column: table.key_column.clone(),
        })
}

/// Append-only table store
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Every non-null key currently stored in `table`
    async fn existing_keys(&self, table: &TableRef) -> Result<HashSet<i64>, WarehouseError>;

    /// Column names and types as declared by the destination
    async fn table_schema(&self, table: &TableRef) -> Result<TableSchema, WarehouseError>;

    /// Append `rows` laid out as `schema`, returning once the write is durable.
    /// Existing rows are never touched.
    async fn append(
        &self,
        table: &TableRef,
        schema: &TableSchema,
        rows: &[Row],
    ) -> Result<u64, WarehouseError>;

    /// Get the name of the backend
    fn backend_name(&self) -> &'static str;
}
