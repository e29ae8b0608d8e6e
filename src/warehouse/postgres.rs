use super::{key_column, Column, ColumnType, TableRef, TableSchema, Warehouse};
use crate::error::WarehouseError;
use crate::models::{FieldValue, Row};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::query_builder::Separated;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Postgres caps a statement at 65535 bind parameters.
const BIND_LIMIT: usize = 65_535;

/// Warehouse backed by a PostgreSQL table
#[derive(Clone)]
pub struct PgWarehouse {
    pool: PgPool,
}

impl PgWarehouse {
    // Never include the DSN in spans; it carries credentials.
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self, WarehouseError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await?;
        info!("connected to warehouse");
        Ok(Self { pool })
    }

    /// Connect using the connection URL stored in a credential file.
    pub async fn from_credentials_file(path: &Path) -> anyhow::Result<Self> {
        let database_url = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read warehouse credentials from {}", path.display()))?;
        let warehouse = Self::connect(database_url.trim())
            .await
            .context("Failed to connect to warehouse")?;
        Ok(warehouse)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn qualified_name(table: &TableRef) -> String {
    match &table.schema {
        Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(&table.name)),
        None => quote_ident(&table.name),
    }
}

/// Bind `value`; nulls are bound with the column's own type so Postgres accepts them.
fn push_value(b: &mut Separated<'_, '_, Postgres, &'static str>, value: &FieldValue, ty: ColumnType) {
    match value {
        FieldValue::Null => match ty {
            ColumnType::Integer => b.push_bind(None::<i64>),
            ColumnType::Float => b.push_bind(None::<f64>),
            ColumnType::Boolean => b.push_bind(None::<bool>),
            ColumnType::Text => b.push_bind(None::<String>),
            ColumnType::Timestamp => b.push_bind(None::<DateTime<Utc>>),
        },
        FieldValue::Integer(v) => b.push_bind(*v),
        FieldValue::Float(v) => b.push_bind(*v),
        FieldValue::Boolean(v) => b.push_bind(*v),
        FieldValue::Text(v) => b.push_bind(v.clone()),
        FieldValue::Timestamp(v) => b.push_bind(*v),
    };
}

#[async_trait]
impl Warehouse for PgWarehouse {
    #[instrument(skip(self, table), fields(table = %table))]
    async fn existing_keys(&self, table: &TableRef) -> Result<HashSet<i64>, WarehouseError> {
        // The stored column name may differ in case from the configured one.
        let schema = self.table_schema(table).await?;
        let key = quote_ident(&key_column(&schema, table)?.name);
        let sql = format!(
            "SELECT {key}::bigint FROM {} WHERE {key} IS NOT NULL",
            qualified_name(table)
        );
        let keys: Vec<i64> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
        debug!(count = keys.len(), "fetched existing keys");
        Ok(keys.into_iter().collect())
    }

    #[instrument(skip(self, table), fields(table = %table))]
    async fn table_schema(&self, table: &TableRef) -> Result<TableSchema, WarehouseError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT column_name::text, data_type::text
               FROM information_schema.columns
              WHERE table_schema = COALESCE($1, current_schema()::text)
                AND table_name = $2
              ORDER BY ordinal_position",
        )
        .bind(table.schema.as_deref())
        .bind(&table.name)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(WarehouseError::TableNotFound {
                table: table.to_string(),
            });
        }

        Ok(TableSchema::new(
            rows.into_iter()
                .map(|(name, data_type)| Column::new(name, ColumnType::from_sql(&data_type)))
                .collect(),
        ))
    }

    #[instrument(skip(self, table, schema, rows), fields(table = %table, rows = rows.len()))]
    async fn append(
        &self,
        table: &TableRef,
        schema: &TableSchema,
        rows: &[Row],
    ) -> Result<u64, WarehouseError> {
        if rows.is_empty() {
            return Ok(0);
        }
        if schema.columns.is_empty() {
            return Err(WarehouseError::TableNotFound {
                table: table.to_string(),
            });
        }

        let projected = rows
            .iter()
            .map(|row| schema.project(row))
            .collect::<Result<Vec<_>, _>>()?;

        let columns = schema
            .columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let insert = format!("INSERT INTO {} ({}) ", qualified_name(table), columns);
        let chunk_size = (BIND_LIMIT / schema.columns.len()).max(1);

        let mut tx = self.pool.begin().await?;
        let mut written = 0u64;
        for chunk in projected.chunks(chunk_size) {
            let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(insert.as_str());
            qb.push_values(chunk, |mut b, values| {
                for (value, column) in values.iter().zip(&schema.columns) {
                    push_value(&mut b, value, column.ty);
                }
            });
            written += qb.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        info!(written, "appended rows");
        Ok(written)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
