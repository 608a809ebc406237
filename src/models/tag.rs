//! Tag model.

use serde::{Deserialize, Serialize};

/// An automatically assigned or user tag.
///
/// `photo_count` is only present in the tag listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_count: Option<i64>,
}
