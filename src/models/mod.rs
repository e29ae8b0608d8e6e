use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

mod batch;

pub use batch::{Batch, BatchRow};

/// A configured search area
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Area {
    /// Opaque location code understood by the listings API
    pub id: String,
    /// Human readable label, copied onto every record fetched for this area
    pub name: String,
}

/// Accept any JSON value and keep it only if it fits `T`.
///
/// Missing keys, explicit nulls and values of the wrong JSON type all end up
/// as `None`, so one odd field never sinks the whole page.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Listing identifier as sent by the API, either a string or a number
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PropertyCode {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl PropertyCode {
    /// Integer key for the warehouse, if the code is numeric.
    pub fn as_key(&self) -> Option<i64> {
        match self {
            PropertyCode::Integer(code) => Some(*code),
            PropertyCode::Float(code) => float_to_key(*code),
            PropertyCode::Text(text) => {
                let text = text.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(float_to_key))
            }
        }
    }
}

fn float_to_key(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Phone {
    #[serde(default, deserialize_with = "lenient")]
    pub phone_number_for_mobile_dialing: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub phone1: Option<Phone>,
    #[serde(default, deserialize_with = "lenient")]
    pub contact_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub user_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParkingSpace {
    #[serde(default, deserialize_with = "lenient")]
    pub has_parking_space: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    #[serde(default, deserialize_with = "lenient")]
    pub has_swimming_pool: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub has_terrace: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub has_air_conditioning: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub has_box_room: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub has_garden: Option<bool>,
}

/// Listing object as returned in `elementList`.
///
/// Only the fields the normalizer reads are modelled; anything else in the
/// payload is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawListing {
    #[serde(default, deserialize_with = "lenient")]
    pub property_code: Option<PropertyCode>,
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub property_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub operation: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub size: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub rooms: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub bathrooms: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub province: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub municipality: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub location_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub contact_info: Option<ContactInfo>,
    #[serde(default, deserialize_with = "lenient")]
    pub parking_space: Option<ParkingSpace>,
    #[serde(default, deserialize_with = "lenient")]
    pub price_by_area: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub features: Option<Features>,
}

/// Flattened listing, one warehouse row before batch augmentation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlatRecord {
    /// Natural key; `None` when the source code is missing or not numeric
    pub property_code: Option<i64>,
    pub price: Option<f64>,
    pub property_type: Option<String>,
    pub operation: Option<String>,
    /// Square meters (source value / 10)
    pub size: Option<f64>,
    pub rooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub address: Option<String>,
    pub province: Option<String>,
    pub municipality: Option<String>,
    pub location_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub phone_number_for_mobile_dialing: Option<String>,
    pub contact_name: Option<String>,
    pub user_type: Option<String>,
    pub has_parking_space: Option<bool>,
    pub price_by_area: Option<f64>,
    pub has_swimming_pool: Option<bool>,
    pub has_terrace: Option<bool>,
    pub has_air_conditioning: Option<bool>,
    pub has_box_room: Option<bool>,
    pub has_garden: Option<bool>,
    #[serde(rename = "origin_location_name")]
    pub origin_location_name: Option<String>,
}

impl FlatRecord {
    /// Column/value pairs using the warehouse column names.
    pub fn columns(&self) -> Row {
        let mut row = Row::new();
        row.insert("propertyCode".into(), self.property_code.into());
        row.insert("price".into(), self.price.into());
        row.insert("propertyType".into(), self.property_type.clone().into());
        row.insert("operation".into(), self.operation.clone().into());
        row.insert("size".into(), self.size.into());
        row.insert("rooms".into(), self.rooms.into());
        row.insert("bathrooms".into(), self.bathrooms.into());
        row.insert("address".into(), self.address.clone().into());
        row.insert("province".into(), self.province.clone().into());
        row.insert("municipality".into(), self.municipality.clone().into());
        row.insert("locationId".into(), self.location_id.clone().into());
        row.insert("latitude".into(), self.latitude.into());
        row.insert("longitude".into(), self.longitude.into());
        row.insert("url".into(), self.url.clone().into());
        row.insert("description".into(), self.description.clone().into());
        row.insert("status".into(), self.status.clone().into());
        row.insert(
            "phoneNumberForMobileDialing".into(),
            self.phone_number_for_mobile_dialing.clone().into(),
        );
        row.insert("contactName".into(), self.contact_name.clone().into());
        row.insert("userType".into(), self.user_type.clone().into());
        row.insert("hasParkingSpace".into(), self.has_parking_space.into());
        row.insert("priceByArea".into(), self.price_by_area.into());
        row.insert("hasSwimmingPool".into(), self.has_swimming_pool.into());
        row.insert("hasTerrace".into(), self.has_terrace.into());
        row.insert("hasAirConditioning".into(), self.has_air_conditioning.into());
        row.insert("hasBoxRoom".into(), self.has_box_room.into());
        row.insert("hasGarden".into(), self.has_garden.into());
        row.insert(
            "origin_location_name".into(),
            self.origin_location_name.clone().into(),
        );
        row
    }
}

/// A single cell headed for the warehouse
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl From<Option<i64>> for FieldValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Integer)
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Float)
    }
}

impl From<Option<bool>> for FieldValue {
    fn from(value: Option<bool>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Boolean)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Text)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

/// Column name to value, ordered by column name
pub type Row = BTreeMap<String, FieldValue>;

/// Look up `name` in `row`, falling back to an ASCII case-insensitive match.
///
/// Destination column names may have been case-folded (Postgres folds
/// unquoted identifiers to lowercase), so `propertycode` finds `propertyCode`.
pub fn find_field<'a>(row: &'a Row, name: &str) -> Option<(&'a str, &'a FieldValue)> {
    row.get_key_value(name)
        .or_else(|| row.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)))
        .map(|(key, value)| (key.as_str(), value))
}
