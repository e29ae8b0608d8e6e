use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::models::Area;
use crate::scrapers::traits::ListingsApi;
use crate::scrapers::types::{ListingsPage, SearchParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the Idealista `listhomes` endpoint on RapidAPI
pub struct IdealistaClient {
    client: Client,
    endpoint: String,
    host: String,
    api_key: SecretString,
    params: SearchParams,
}

impl IdealistaClient {
    /// Create a new client from the `[api]` settings and the API key
    pub fn new(api: &ApiConfig, api_key: SecretString) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = api.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/listhomes", api.base_url.trim_end_matches('/')),
            host: api.host.clone(),
            api_key,
            params: api.search.clone(),
        })
    }
}

#[async_trait]
impl ListingsApi for IdealistaClient {
    async fn fetch_page(&self, area: &Area, page: u32) -> Result<ListingsPage, FetchError> {
        let query = self.params.query_for(area, page);
        debug!(url = %self.endpoint, area = %area.id, page, "Requesting listings page");

        let response = self
            .client
            .get(&self.endpoint)
            .header("x-rapidapi-key", self.api_key.expose_secret())
            .header("x-rapidapi-host", &self.host)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(area = %area.id, page, "Idealista returned status: {}", status);
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!("Downloaded {} bytes of JSON", body.len());

        Ok(serde_json::from_str(&body)?)
    }

    fn source_name(&self) -> &'static str {
        "Idealista"
    }
}
