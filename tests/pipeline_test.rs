//! End-to-end tests for a scout run
//!
//! A JSON-serving fake stands in for the listings API and the in-memory
//! warehouse stands in for the destination table.

use async_trait::async_trait;
use chrono::Utc;
use idealista_scout::config::{Config, PipelineConfig};
use idealista_scout::models::{Area, FieldValue};
use idealista_scout::scrapers::{ListingsApi, ListingsPage};
use idealista_scout::warehouse::{Column, ColumnType, MemoryWarehouse, TableRef, TableSchema, Warehouse};
use idealista_scout::{loader, FetchError, Pipeline, WarehouseError};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

/// Serves canned JSON bodies; pages without a body fail like a 503
struct JsonApi {
    bodies: HashMap<(String, u32), Value>,
}

impl JsonApi {
    fn new(pages: Vec<(&str, u32, Value)>) -> Self {
        Self {
            bodies: pages
                .into_iter()
                .map(|(area, page, body)| ((area.to_string(), page), body))
                .collect(),
        }
    }
}

#[async_trait]
impl ListingsApi for JsonApi {
    async fn fetch_page(&self, area: &Area, page: u32) -> Result<ListingsPage, FetchError> {
        let body = self
            .bodies
            .get(&(area.id.clone(), page))
            .ok_or(FetchError::Status { status: 503 })?;
        Ok(serde_json::from_value(body.clone())?)
    }

    fn source_name(&self) -> &'static str {
        "JSON fixture"
    }
}

fn listing(code: &str, user_type: &str) -> Value {
    json!({
        "propertyCode": code,
        "price": 199000.0,
        "size": 850,
        "rooms": 3,
        "contactInfo": {
            "userType": user_type,
            "phone1": {"phoneNumberForMobileDialing": "+34911111111"}
        },
        "features": {"hasTerrace": true}
    })
}

fn areas() -> Vec<Area> {
    vec![
        Area {
            id: "0-EU-ES-28-07-001-079-06".into(),
            name: "Tetuán, Madrid".into(),
        },
        Area {
            id: "0-EU-ES-45-05-003-161".into(),
            name: "Seseña, Toledo".into(),
        },
    ]
}

fn table() -> TableRef {
    TableRef::new("pisos.pisos_particular", "propertyCode")
}

fn warehouse() -> MemoryWarehouse {
    let warehouse = MemoryWarehouse::new();
    warehouse.create_table(
        &table(),
        TableSchema::new(vec![
            Column::new("propertyCode", ColumnType::Integer),
            Column::new("price", ColumnType::Float),
            Column::new("size", ColumnType::Float),
            Column::new("rooms", ColumnType::Integer),
            Column::new("phoneNumberForMobileDialing", ColumnType::Text),
            Column::new("userType", ColumnType::Text),
            Column::new("hasTerrace", ColumnType::Boolean),
            Column::new("hasGarden", ColumnType::Boolean),
            Column::new("origin_location_name", ColumnType::Text),
            Column::new("category", ColumnType::Text),
            Column::new("fetch_timestamp", ColumnType::Timestamp),
        ]),
    );
    warehouse
}

fn api() -> JsonApi {
    JsonApi::new(vec![
        (
            "0-EU-ES-28-07-001-079-06",
            1,
            json!({
                "totalPages": 3,
                "elementList": [listing("101", "private"), listing("102", "professional")]
            }),
        ),
        // page 2 is malformed, so page 3 is never requested
        ("0-EU-ES-28-07-001-079-06", 2, json!({"elementList": "oops"})),
        (
            "0-EU-ES-28-07-001-079-06",
            3,
            json!({"elementList": [listing("103", "private")]}),
        ),
        (
            "0-EU-ES-45-05-003-161",
            1,
            json!({"totalPages": 1, "elementList": [listing("201", "private")]}),
        ),
    ])
}

/// Fetch a fresh batch and load it, as the binary does
async fn run<A: ListingsApi>(
    pipeline: &Pipeline<A>,
    warehouse: &MemoryWarehouse,
    table: &TableRef,
) -> Result<u64, WarehouseError> {
    let batch = pipeline.build_batch(Utc::now()).await;
    loader::load(&batch, warehouse, table).await
}

#[tokio::test]
async fn test_run_loads_private_listings_from_all_areas() {
    let warehouse = warehouse();
    let pipeline = Pipeline::new(api(), areas(), PipelineConfig::default());

    let written = run(&pipeline, &warehouse, &table()).await.unwrap();
    assert_eq!(written, 2);

    let rows = warehouse.rows(&table());
    let by_code: HashMap<i64, _> = rows
        .iter()
        .filter_map(|row| match row["propertyCode"] {
            FieldValue::Integer(code) => Some((code, row)),
            _ => None,
        })
        .collect();

    let tetuan = by_code[&101];
    assert_eq!(tetuan["size"], FieldValue::Float(85.0));
    assert_eq!(tetuan["rooms"], FieldValue::Integer(3));
    assert_eq!(tetuan["userType"], FieldValue::Text("private".into()));
    assert_eq!(tetuan["hasTerrace"], FieldValue::Boolean(true));
    assert_eq!(tetuan["hasGarden"], FieldValue::Null);
    assert_eq!(tetuan["category"], FieldValue::Text("raw".into()));
    assert_eq!(
        tetuan["origin_location_name"],
        FieldValue::Text("Tetuán, Madrid".into())
    );

    let sesena = by_code[&201];
    assert_eq!(
        sesena["origin_location_name"],
        FieldValue::Text("Seseña, Toledo".into())
    );
    assert_eq!(tetuan["fetch_timestamp"], sesena["fetch_timestamp"]);
}

#[tokio::test]
async fn test_repeated_run_is_idempotent() {
    let warehouse = warehouse();
    let pipeline = Pipeline::new(api(), areas(), PipelineConfig::default());

    assert_eq!(run(&pipeline, &warehouse, &table()).await.unwrap(), 2);
    assert_eq!(run(&pipeline, &warehouse, &table()).await.unwrap(), 0);

    let keys = warehouse.existing_keys(&table()).await.unwrap();
    assert_eq!(keys, HashSet::from([101, 201]));
}

#[tokio::test]
async fn test_unreadable_key_set_loads_whole_batch() {
    let warehouse = warehouse();
    let pipeline = Pipeline::new(api(), areas(), PipelineConfig::default());
    run(&pipeline, &warehouse, &table()).await.unwrap();

    warehouse.set_fail_key_query(true);
    assert_eq!(run(&pipeline, &warehouse, &table()).await.unwrap(), 2);
    assert_eq!(warehouse.rows(&table()).len(), 4);
}

#[tokio::test]
async fn test_later_page_with_odd_total_pages_is_kept() {
    let api = JsonApi::new(vec![
        (
            "0-EU-ES-45-05-003-161",
            1,
            json!({"totalPages": 2, "elementList": [listing("201", "private")]}),
        ),
        (
            "0-EU-ES-45-05-003-161",
            2,
            json!({"totalPages": "2", "elementList": [listing("202", "private")]}),
        ),
    ]);
    let pipeline = Pipeline::new(api, areas()[1..].to_vec(), PipelineConfig::default());

    let records = pipeline.collect().await;

    let codes: Vec<_> = records.iter().map(|r| r.property_code).collect();
    assert_eq!(codes, vec![Some(201), Some(202)]);
}

#[tokio::test]
async fn test_lowercase_table_is_loaded_once() {
    let warehouse = MemoryWarehouse::new();
    warehouse.create_table(
        &table(),
        TableSchema::new(vec![
            Column::new("propertycode", ColumnType::Integer),
            Column::new("usertype", ColumnType::Text),
            Column::new("category", ColumnType::Text),
        ]),
    );
    let pipeline = Pipeline::new(api(), areas(), PipelineConfig::default());

    assert_eq!(run(&pipeline, &warehouse, &table()).await.unwrap(), 2);
    assert_eq!(run(&pipeline, &warehouse, &table()).await.unwrap(), 0);

    let keys = warehouse.existing_keys(&table()).await.unwrap();
    assert_eq!(keys, HashSet::from([101, 201]));
    let rows = warehouse.rows(&table());
    assert!(rows.iter().all(|row| row["usertype"] == FieldValue::Text("private".into())));
}

#[test]
fn test_shipped_config_parses() {
    let config = Config::from_toml(include_str!("../scout.toml")).unwrap();

    assert_eq!(config.areas.len(), 13);
    assert_eq!(config.api.search.max_items, 40);
    assert_eq!(config.api.search.since_date, "W");
    assert_eq!(config.warehouse.table_ref(), table());
    assert_eq!(config.pipeline, PipelineConfig::default());
}
