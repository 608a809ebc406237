//! Data models for the Photo Organiser catalog.
//!
//! These models match the backend's JSON projections field for field
//! (snake_case), so they decode responses directly and serialize back into
//! the same shape for caching.

mod album;
mod import;
mod person;
mod photo;
mod processing;
mod search;
mod tag;
pub mod timestamp;

pub use album::*;
pub use import::*;
pub use person::*;
pub use photo::*;
pub use processing::*;
pub use search::*;
pub use tag::*;

use serde::{Deserialize, Serialize};

/// Generic `{"status": ...}` acknowledgement returned by mutation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusAck {
    pub status: String,
}
