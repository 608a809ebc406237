//! Album models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::MediaItem;

/// A user-curated album.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_photo_id: Option<i64>,
    #[serde(with = "super::timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(with = "super::timestamp")]
    pub updated_at: NaiveDateTime,
    #[serde(default)]
    pub photo_count: i64,
}

/// Album with its photos, as returned by `GET /albums/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumDetail {
    #[serde(flatten)]
    pub album: Album,
    #[serde(default)]
    pub photos: Vec<MediaItem>,
}

/// Request body for creating an album.
#[derive(Debug, Clone, Serialize)]
pub struct AlbumCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request body for updating an album. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlbumUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_photo_id: Option<i64>,
}

/// Request body for adding photos to an album.
#[derive(Debug, Clone, Serialize)]
pub struct AlbumAddPhotos {
    pub photo_ids: Vec<i64>,
}

/// Response of `POST /albums/{id}/photos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotosAdded {
    pub status: String,
    pub added_count: i64,
}

/// Response of `DELETE /albums/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumDeleted {
    pub status: String,
    pub album_id: i64,
}

/// Response of `DELETE /albums/{id}/photos/{photo_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRemoved {
    pub status: String,
    pub photo_id: i64,
}
