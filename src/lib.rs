pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod scrapers;
pub mod warehouse;

pub use config::{Config, Secrets};
pub use error::{ConfigError, FetchError, WarehouseError};
pub use models::{Area, Batch, BatchRow, FlatRecord, RawListing};
pub use pipeline::Pipeline;
