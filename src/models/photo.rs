//! Photo/video projections.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Person, Pet, Tag};

/// Photo or video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }

    /// Value of the backend's `is_video` flag for this kind.
    pub fn is_video(&self) -> bool {
        matches!(self, MediaKind::Video)
    }
}

/// Thumbnail size token understood by the thumbnail endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbnailSize {
    Small,
    Medium,
    Large,
}

impl ThumbnailSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThumbnailSize::Small => "small",
            ThumbnailSize::Medium => "medium",
            ThumbnailSize::Large => "large",
        }
    }
}

/// A photo or video as listed in feeds.
///
/// Read-only projection of the backend record; the id is stable and unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: i64,
    pub file_name: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub thumbnail_small: Option<String>,
    #[serde(default)]
    pub thumbnail_medium: Option<String>,
    #[serde(default)]
    pub thumbnail_large: Option<String>,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
    /// Acquisition time; absent for undated media
    #[serde(default, with = "super::timestamp::option")]
    pub date_taken: Option<NaiveDateTime>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub is_processed: bool,
}

impl MediaItem {
    pub fn kind(&self) -> MediaKind {
        if self.is_video {
            MediaKind::Video
        } else {
            MediaKind::Photo
        }
    }

    /// Name shown under the thumbnail; also the fallback date source.
    pub fn display_name(&self) -> &str {
        &self.file_name
    }

    /// Best available place label: the geocoded name, else "city, country".
    pub fn place_label(&self) -> Option<String> {
        if let Some(name) = self.location_name.as_deref().filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        match (self.city.as_deref(), self.country.as_deref()) {
            (Some(city), Some(country)) => Some(format!("{}, {}", city, country)),
            (Some(city), None) => Some(city.to_string()),
            (None, Some(country)) => Some(country.to_string()),
            (None, None) => None,
        }
    }
}

/// Full photo record returned by `GET /photos/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoDetail {
    #[serde(flatten)]
    pub item: MediaItem,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub camera_make: Option<String>,
    #[serde(default)]
    pub camera_model: Option<String>,
    #[serde(default, with = "super::timestamp::option")]
    pub date_imported: Option<NaiveDateTime>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub pets: Vec<Pet>,
}

/// Response of `DELETE /photos/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoDeleted {
    pub status: String,
    pub photo_id: i64,
}
