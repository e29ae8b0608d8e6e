use super::{FieldValue, FlatRecord, Row};
use chrono::{DateTime, Utc};

/// A private-seller record ready for the warehouse
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRow {
    pub record: FlatRecord,
    pub category: String,
    pub fetch_timestamp: DateTime<Utc>,
}

impl BatchRow {
    /// Record columns plus `category` and `fetch_timestamp`.
    pub fn to_row(&self) -> Row {
        let mut row = self.record.columns();
        row.insert("category".into(), FieldValue::Text(self.category.clone()));
        row.insert("fetch_timestamp".into(), self.fetch_timestamp.into());
        row
    }
}

/// One run's worth of rows, built once and handed to the loader
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub rows: Vec<BatchRow>,
    pub fetch_timestamp: DateTime<Utc>,
}

impl Batch {
    /// Keep only records whose `userType` equals `seller_type` and stamp them.
    ///
    /// Every row shares the same `fetch_timestamp`.
    pub fn assemble(
        records: Vec<FlatRecord>,
        seller_type: &str,
        category: &str,
        fetch_timestamp: DateTime<Utc>,
    ) -> Self {
        let rows = records
            .into_iter()
            .filter(|record| record.user_type.as_deref() == Some(seller_type))
            .map(|record| BatchRow {
                record,
                category: category.to_string(),
                fetch_timestamp,
            })
            .collect();

        Self {
            rows,
            fetch_timestamp,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
