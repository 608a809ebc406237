//! Import endpoints.

use super::CatalogClient;
use crate::errors::ClientError;
use crate::models::{ImportProgress, ImportRequest, ImportSource, ImportSourceDeleted};

impl CatalogClient {
    /// POST /import/ - Start importing from a folder, takeout archive or device.
    pub async fn start_import(&self, request: &ImportRequest) -> Result<ImportSource, ClientError> {
        self.post_json("/import/", request).await
    }

    /// GET /import/sources - Import runs, newest first.
    pub async fn list_import_sources(&self) -> Result<Vec<ImportSource>, ClientError> {
        self.get("/import/sources", &[]).await
    }

    /// GET /import/sources/{id}
    pub async fn get_import_source(&self, id: i64) -> Result<ImportSource, ClientError> {
        self.get(&format!("/import/sources/{}", id), &[]).await
    }

    /// GET /import/sources/{id}/progress
    pub async fn import_progress(&self, id: i64) -> Result<ImportProgress, ClientError> {
        self.get(&format!("/import/sources/{}/progress", id), &[])
            .await
    }

    /// DELETE /import/sources/{id} - Forget an import run, optionally with its photos.
    pub async fn delete_import_source(
        &self,
        id: i64,
        delete_photos: bool,
    ) -> Result<ImportSourceDeleted, ClientError> {
        self.delete(
            &format!("/import/sources/{}", id),
            &[("delete_photos", delete_photos.to_string())],
        )
        .await
    }
}
