//! Photo Organiser client core
//!
//! Paginated, filterable media feeds over the Photo Organiser REST API, with
//! month grouping, a scroll-triggered loader and a session query cache that
//! mutations invalidate.

pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
pub mod feed;
pub mod models;
pub mod session;

pub use api::CatalogClient;
pub use cache::QueryCache;
pub use config::Config;
pub use errors::ClientError;
pub use feed::{FeedController, FilterSpec, LoadOutcome};
pub use session::Library;

#[cfg(test)]
mod test_support;
