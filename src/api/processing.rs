//! Processing endpoints.

use serde::Deserialize;

use super::CatalogClient;
use crate::errors::ClientError;
use crate::models::{
    BackfillAck, LibraryStats, ProcessingProgress, ProcessingStarted, ProcessingStatus, QueuedAck,
    StatusAck,
};

/// Body of `POST /processing/reprocess/{id}`; a missing photo is reported
/// in-band with a success status.
#[derive(Debug, Deserialize)]
struct ReprocessBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl CatalogClient {
    /// GET /processing/status - Queue counters.
    pub async fn processing_status(&self) -> Result<ProcessingStatus, ClientError> {
        self.get("/processing/status", &[]).await
    }

    /// GET /processing/progress - Live progress of continuous processing.
    pub async fn processing_progress(&self) -> Result<ProcessingProgress, ClientError> {
        self.get("/processing/progress", &[]).await
    }

    /// GET /processing/stats - Library totals.
    pub async fn library_stats(&self) -> Result<LibraryStats, ClientError> {
        self.get("/processing/stats", &[]).await
    }

    /// POST /processing/start - Process one batch of queued photos.
    pub async fn start_processing(&self, batch_size: u32) -> Result<ProcessingStarted, ClientError> {
        self.post(
            "/processing/start",
            &[("batch_size", batch_size.to_string())],
        )
        .await
    }

    /// POST /processing/start-continuous - Process until the queue drains.
    pub async fn start_continuous_processing(
        &self,
        max_items: Option<u32>,
    ) -> Result<ProcessingStarted, ClientError> {
        let query: Vec<(&str, String)> = max_items
            .map(|m| vec![("max_items", m.to_string())])
            .unwrap_or_default();
        self.post("/processing/start-continuous", &query).await
    }

    /// POST /processing/stop - Ask continuous processing to stop.
    pub async fn stop_processing(&self) -> Result<StatusAck, ClientError> {
        self.post("/processing/stop", &[]).await
    }

    /// POST /processing/queue-all - Queue every unprocessed photo.
    pub async fn queue_all_unprocessed(&self) -> Result<QueuedAck, ClientError> {
        self.post("/processing/queue-all", &[]).await
    }

    /// POST /processing/queue-faces - Queue photos lacking face detection.
    pub async fn queue_faces(&self) -> Result<QueuedAck, ClientError> {
        self.post("/processing/queue-faces", &[]).await
    }

    /// POST /processing/reprocess/{id} - Reprocess a single photo.
    pub async fn reprocess_photo(&self, photo_id: i64) -> Result<StatusAck, ClientError> {
        let body: ReprocessBody = self
            .post(&format!("/processing/reprocess/{}", photo_id), &[])
            .await?;
        match (body.error, body.status) {
            (Some(error), _) => Err(ClientError::Status {
                status: 404,
                message: error,
            }),
            (None, Some(status)) => Ok(StatusAck { status }),
            (None, None) => Err(ClientError::Decode(
                "reprocess response carried neither status nor error".to_string(),
            )),
        }
    }

    /// POST /processing/backfill-dates - Fill missing dates from file times.
    pub async fn backfill_dates(&self) -> Result<BackfillAck, ClientError> {
        self.post("/processing/backfill-dates", &[]).await
    }

    /// POST /processing/requeue-videos - Queue all videos for thumbnail regeneration.
    pub async fn requeue_videos(&self) -> Result<QueuedAck, ClientError> {
        self.post("/processing/requeue-videos", &[]).await
    }
}
