use crate::models::{Area, RawListing};
use crate::scrapers::traits::ListingsApi;
use tracing::{info, warn};

/// Walks every page of an area, one request at a time.
pub struct Paginator<A> {
    api: A,
}

impl<A: ListingsApi> Paginator<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    #[cfg(test)]
    pub(crate) fn api(&self) -> &A {
        &self.api
    }

    /// Fetch all listings for `area`, in page order.
    ///
    /// The page count comes from the first response. Any failed page ends the
    /// walk for this area and the listings gathered so far are returned.
    pub async fn fetch(&self, area: &Area) -> Vec<RawListing> {
        info!(
            area = %area.id,
            name = %area.name,
            source = self.api.source_name(),
            "Starting data retrieval"
        );

        let mut listings = Vec::new();
        let mut page = 1u32;
        let mut total_pages = 1u32;

        while page <= total_pages {
            info!(area = %area.id, page, "Fetching page");

            match self.api.fetch_page(area, page).await {
                Ok(response) => {
                    if page == 1 {
                        total_pages = response.total_pages.unwrap_or(1);
                        info!(area = %area.id, total_pages, "Total pages");
                    }
                    listings.extend(response.element_list);
                    page += 1;
                }
                Err(e) => {
                    warn!(area = %area.id, page, error = %e, "Error fetching page, stopping this area");
                    break;
                }
            }
        }

        listings
    }
}
