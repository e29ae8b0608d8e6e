use crate::models::{Area, RawListing};
use serde::{Deserialize, Serialize};

/// Query settings shared by every page request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchParams {
    /// Result ordering (`relevance`, `mostrecent`, ...)
    pub order: String,
    /// `sale` or `rent`
    pub operation: String,
    /// Country code of the portal
    pub location: String,
    /// Response language
    pub locale: String,
    /// Page size
    pub max_items: u32,
    /// Recency filter; `W` is "published this week"
    pub since_date: String,
    /// Fixed `locationName` sent with every request. When unset the area's
    /// display name is used.
    pub location_name: Option<String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            order: "relevance".to_string(),
            operation: "sale".to_string(),
            location: "es".to_string(),
            locale: "es".to_string(),
            max_items: 40,
            since_date: "W".to_string(),
            location_name: None,
        }
    }
}

impl SearchParams {
    /// Query string pairs for one page of one area.
    pub fn query_for(&self, area: &Area, page: u32) -> Vec<(&'static str, String)> {
        let location_name = self
            .location_name
            .clone()
            .unwrap_or_else(|| area.name.clone());

        vec![
            ("order", self.order.clone()),
            ("operation", self.operation.clone()),
            ("locationId", area.id.clone()),
            ("locationName", location_name),
            ("numPage", page.to_string()),
            ("maxItems", self.max_items.to_string()),
            ("location", self.location.clone()),
            ("locale", self.locale.clone()),
            ("sinceDate", self.since_date.clone()),
        ]
    }
}

/// One page of the `listhomes` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingsPage {
    /// Only read from the first page; an unusable value decodes as `None`.
    #[serde(default, deserialize_with = "crate::models::lenient")]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub element_list: Vec<RawListing>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sol() -> Area {
        Area {
            id: "0-EU-ES-28-07-001-079-01-006".into(),
            name: "Sol, Madrid".into(),
        }
    }

    #[test]
    fn test_query_uses_defaults_and_area() {
        let query = SearchParams::default().query_for(&sol(), 3);
        let get = |key: &str| {
            query
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("locationId"), Some("0-EU-ES-28-07-001-079-01-006"));
        assert_eq!(get("locationName"), Some("Sol, Madrid"));
        assert_eq!(get("numPage"), Some("3"));
        assert_eq!(get("maxItems"), Some("40"));
        assert_eq!(get("sinceDate"), Some("W"));
        assert_eq!(get("operation"), Some("sale"));
    }

    #[test]
    fn test_fixed_location_name_overrides_area() {
        let params = SearchParams {
            location_name: Some("Madrid".into()),
            ..Default::default()
        };
        let query = params.query_for(&sol(), 1);
        assert!(query.contains(&("locationName", "Madrid".to_string())));
    }

    #[test]
    fn test_page_defaults_when_fields_missing() {
        let page: ListingsPage = serde_json::from_str("{}").unwrap();
        assert_eq!(page.total_pages, None);
        assert!(page.element_list.is_empty());
    }

    #[test]
    fn test_odd_total_pages_keeps_listings() {
        let page: ListingsPage = serde_json::from_str(
            r#"{"totalPages": "2", "elementList": [{"propertyCode": "5"}]}"#,
        )
        .unwrap();
        assert_eq!(page.total_pages, None);
        assert_eq!(page.element_list.len(), 1);

        let page: ListingsPage =
            serde_json::from_str(r#"{"totalPages": -1, "elementList": []}"#).unwrap();
        assert_eq!(page.total_pages, None);
    }
}
