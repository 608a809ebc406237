//! Import sources.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Kind of location photos are imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Folder,
    GoogleTakeout,
    Usb,
}

/// Request body for `POST /import/`.
#[derive(Debug, Clone, Serialize)]
pub struct ImportRequest {
    pub source_path: String,
    pub source_type: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A recorded import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSource {
    pub id: i64,
    pub name: String,
    pub source_type: String,
    #[serde(default)]
    pub source_path: Option<String>,
    #[serde(with = "super::timestamp")]
    pub date_imported: NaiveDateTime,
    #[serde(default)]
    pub photo_count: i64,
    pub status: String,
}

/// Progress of an import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProgress {
    pub source_id: i64,
    pub total_files: i64,
    pub processed_files: i64,
    pub status: String,
}

/// Response of `DELETE /import/sources/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSourceDeleted {
    pub status: String,
    pub source_id: i64,
}
