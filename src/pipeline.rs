//! One run's batch: fetch every area, flatten, keep private sellers.

use crate::config::PipelineConfig;
use crate::models::{Area, Batch, FlatRecord};
use crate::normalize::normalize;
use crate::scrapers::{ListingsApi, Paginator};
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::info;

pub struct Pipeline<A> {
    paginator: Paginator<A>,
    areas: Vec<Area>,
    settings: PipelineConfig,
}

impl<A: ListingsApi> Pipeline<A> {
    pub fn new(api: A, areas: Vec<Area>, settings: PipelineConfig) -> Self {
        Self {
            paginator: Paginator::new(api),
            areas,
            settings,
        }
    }

    /// Fetch and flatten every area in order, tagging records with the area name.
    pub async fn collect(&self) -> Vec<FlatRecord> {
        let mut all_records = Vec::new();

        for area in &self.areas {
            let started = Instant::now();

            let listings = self.paginator.fetch(area).await;
            let mut records = normalize(&listings);
            for record in &mut records {
                record.origin_location_name = Some(area.name.clone());
            }

            info!(
                area = %area.id,
                name = %area.name,
                records = records.len(),
                "Finished processing area in {:.2}s",
                started.elapsed().as_secs_f64()
            );
            all_records.extend(records);
        }

        all_records
    }

    /// Collect all areas and shape the result into this run's batch.
    pub async fn build_batch(&self, fetch_timestamp: DateTime<Utc>) -> Batch {
        let records = self.collect().await;
        let collected = records.len();

        let batch = Batch::assemble(
            records,
            &self.settings.seller_type,
            &self.settings.category,
            fetch_timestamp,
        );

        info!(
            collected,
            kept = batch.len(),
            seller_type = %self.settings.seller_type,
            "Total number of properties collected"
        );
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;
    use crate::models::{ContactInfo, PropertyCode, RawListing};
    use crate::scrapers::paginator::tests::ScriptedApi;
    use crate::warehouse::{Column, ColumnType, MemoryWarehouse, TableRef, TableSchema};

    fn listing(code: &str, user_type: &str) -> RawListing {
        RawListing {
            property_code: Some(PropertyCode::Text(code.into())),
            size: Some(700.0),
            contact_info: Some(ContactInfo {
                user_type: Some(user_type.into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn areas() -> Vec<Area> {
        vec![
            Area {
                id: "A".into(),
                name: "Sol, Madrid".into(),
            },
            Area {
                id: "B".into(),
                name: "Tetuán, Madrid".into(),
            },
        ]
    }

    fn api() -> ScriptedApi {
        ScriptedApi::default()
            .with_listings(
                "A",
                1,
                Some(2),
                vec![listing("1", "private"), listing("2", "professional")],
            )
            .with_listings("A", 2, None, vec![listing("3", "private")])
            .with_listings("B", 1, Some(1), vec![listing("4", "private")])
    }

    #[tokio::test]
    async fn test_collect_tags_records_with_area_name() {
        let pipeline = Pipeline::new(api(), areas(), PipelineConfig::default());

        let records = pipeline.collect().await;

        let tagged: Vec<_> = records
            .iter()
            .map(|r| (r.property_code, r.origin_location_name.as_deref()))
            .collect();
        assert_eq!(
            tagged,
            vec![
                (Some(1), Some("Sol, Madrid")),
                (Some(2), Some("Sol, Madrid")),
                (Some(3), Some("Sol, Madrid")),
                (Some(4), Some("Tetuán, Madrid")),
            ]
        );
        assert!(records.iter().all(|r| r.size == Some(70.0)));
    }

    #[tokio::test]
    async fn test_build_batch_filters_and_stamps() {
        let pipeline = Pipeline::new(api(), areas(), PipelineConfig::default());
        let now = Utc::now();

        let batch = pipeline.build_batch(now).await;

        let keys: Vec<_> = batch.rows.iter().map(|r| r.record.property_code).collect();
        assert_eq!(keys, vec![Some(1), Some(3), Some(4)]);
        assert!(batch.rows.iter().all(|r| r.category == "raw" && r.fetch_timestamp == now));
    }

    #[tokio::test]
    async fn test_batch_loads_private_listings_once() {
        let table = TableRef::new("pisos_particular", "propertyCode");
        let warehouse = MemoryWarehouse::new();
        warehouse.create_table(
            &table,
            TableSchema::new(vec![
                Column::new("propertyCode", ColumnType::Integer),
                Column::new("userType", ColumnType::Text),
                Column::new("origin_location_name", ColumnType::Text),
            ]),
        );
        let pipeline = Pipeline::new(api(), areas(), PipelineConfig::default());

        for expected in [3, 0] {
            let batch = pipeline.build_batch(Utc::now()).await;
            assert_eq!(loader::load(&batch, &warehouse, &table).await.unwrap(), expected);
        }
    }
}
