use crate::error::FetchError;
use crate::models::Area;
use crate::scrapers::types::ListingsPage;
use async_trait::async_trait;

/// A source that serves listings one page at a time.
/// The paginator only talks to this trait, so tests can swap in a scripted source.
#[async_trait]
pub trait ListingsApi: Send + Sync {
    /// Fetch page `page` (1-based) for `area`
    async fn fetch_page(&self, area: &Area, page: u32) -> Result<ListingsPage, FetchError>;

    /// Get the name of the listings source
    fn source_name(&self) -> &'static str;
}
