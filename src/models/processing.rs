//! Background processing and library statistics.

use serde::{Deserialize, Serialize};

/// Queue counters from `GET /processing/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStatus {
    pub queue_length: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
}

/// Live progress of continuous processing from `GET /processing/progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingProgress {
    pub is_running: bool,
    #[serde(default)]
    pub current_photo: Option<String>,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default)]
    pub processed: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub percent: f64,
}

/// Library totals from `GET /processing/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total_photos: i64,
    pub total_videos: i64,
    pub total_people: i64,
    pub total_pets: i64,
    pub total_tags: i64,
    pub processed_count: i64,
    pub unprocessed_count: i64,
    pub storage_size_bytes: i64,
}

/// Response of the queueing endpoints (`queue-all`, `queue-faces`,
/// `requeue-videos`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAck {
    pub queued: i64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /processing/backfill-dates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillAck {
    pub updated: i64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of the start endpoints. `status` is `started` or
/// `already_running`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStarted {
    pub status: String,
    #[serde(default)]
    pub batch_size: Option<i64>,
    #[serde(default)]
    pub max_items: Option<i64>,
}

impl ProcessingStarted {
    pub fn already_running(&self) -> bool {
        self.status == "already_running"
    }
}
