pub mod idealista;
pub mod paginator;
pub mod traits;
pub mod types;

pub use idealista::IdealistaClient;
pub use paginator::Paginator;
pub use traits::ListingsApi;
pub use types::{ListingsPage, SearchParams};
