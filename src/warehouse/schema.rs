use crate::error::WarehouseError;
use crate::models::{find_field, FieldValue, Row};
use chrono::{DateTime, Utc};

/// Storage class of a destination column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
    Timestamp,
}

impl ColumnType {
    /// Map an `information_schema.columns.data_type` value.
    /// Anything unrecognised is treated as text.
    pub fn from_sql(data_type: &str) -> Self {
        match data_type.to_ascii_lowercase().as_str() {
            "bigint" | "integer" | "smallint" | "int8" | "int4" | "int2" => ColumnType::Integer,
            "double precision" | "real" | "numeric" | "float8" | "float4" => ColumnType::Float,
            "boolean" | "bool" => ColumnType::Boolean,
            "timestamp with time zone" | "timestamp without time zone" | "timestamptz"
            | "timestamp" => ColumnType::Timestamp,
            _ => ColumnType::Text,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Text => "text",
            ColumnType::Timestamp => "timestamp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Destination layout, in table column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Column called `name`, matched exactly first and then ignoring ASCII case.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    /// Lay `row` out in column order, coercing each value to its column type.
    ///
    /// Field names match column names ignoring ASCII case. Columns the row
    /// lacks become null; row fields the table lacks are dropped (see
    /// [`TableSchema::unmatched`]).
    pub fn project(&self, row: &Row) -> Result<Vec<FieldValue>, WarehouseError> {
        self.columns
            .iter()
            .map(|column| match find_field(row, &column.name) {
                Some((_, value)) => coerce(value, column),
                None => Ok(FieldValue::Null),
            })
            .collect()
    }

    /// Fields of `row` that no column picks up.
    pub fn unmatched<'a>(&self, row: &'a Row) -> Vec<&'a str> {
        row.keys()
            .map(String::as_str)
            .filter(|field| self.column(field).is_none())
            .collect()
    }
}

fn mismatch(value: &FieldValue, column: &Column) -> WarehouseError {
    WarehouseError::TypeMismatch {
        column: column.name.clone(),
        expected: column.ty.label().to_string(),
        value: format!("{:?}", value),
    }
}

fn coerce(value: &FieldValue, column: &Column) -> Result<FieldValue, WarehouseError> {
    use FieldValue::*;

    let coerced = match (column.ty, value) {
        (_, Null) => Null,

        (ColumnType::Integer, Integer(v)) => Integer(*v),
        (ColumnType::Integer, Float(v)) if v.fract() == 0.0 && v.is_finite() => Integer(*v as i64),
        (ColumnType::Integer, Text(v)) => match v.trim().parse::<i64>() {
            Ok(parsed) => Integer(parsed),
            Err(_) => return Err(mismatch(value, column)),
        },

        (ColumnType::Float, Float(v)) => Float(*v),
        (ColumnType::Float, Integer(v)) => Float(*v as f64),
        (ColumnType::Float, Text(v)) => match v.trim().parse::<f64>() {
            Ok(parsed) => Float(parsed),
            Err(_) => return Err(mismatch(value, column)),
        },

        (ColumnType::Boolean, Boolean(v)) => Boolean(*v),

        (ColumnType::Text, Text(v)) => Text(v.clone()),
        (ColumnType::Text, Integer(v)) => Text(v.to_string()),
        (ColumnType::Text, Float(v)) => Text(v.to_string()),
        (ColumnType::Text, Boolean(v)) => Text(v.to_string()),
        (ColumnType::Text, Timestamp(v)) => Text(v.to_rfc3339()),

        (ColumnType::Timestamp, Timestamp(v)) => Timestamp(*v),
        (ColumnType::Timestamp, Text(v)) => match DateTime::parse_from_rfc3339(v) {
            Ok(parsed) => Timestamp(parsed.with_timezone(&Utc)),
            Err(_) => return Err(mismatch(value, column)),
        },

        _ => return Err(mismatch(value, column)),
    };

    Ok(coerced)
}
