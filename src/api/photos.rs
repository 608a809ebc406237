//! Photo endpoints.

use super::{page_query, CatalogClient};
use crate::errors::ClientError;
use crate::models::{MediaItem, MediaKind, PhotoDeleted, PhotoDetail, ThumbnailSize};

impl CatalogClient {
    /// GET /photos/ - List photos, newest first, optionally restricted to one kind.
    pub async fn list_photos(
        &self,
        limit: u32,
        offset: u32,
        kind: Option<MediaKind>,
    ) -> Result<Vec<MediaItem>, ClientError> {
        let mut query = page_query(limit, offset);
        if let Some(kind) = kind {
            query.push(("is_video", kind.is_video().to_string()));
        }
        self.get("/photos/", &query).await
    }

    /// GET /photos/{id} - Photo details.
    pub async fn get_photo(&self, id: i64) -> Result<PhotoDetail, ClientError> {
        self.get(&format!("/photos/{}", id), &[]).await
    }

    /// DELETE /photos/{id} - Remove a photo from the library, optionally from disk.
    pub async fn delete_photo(
        &self,
        id: i64,
        delete_file: bool,
    ) -> Result<PhotoDeleted, ClientError> {
        self.delete(
            &format!("/photos/{}", id),
            &[("delete_file", delete_file.to_string())],
        )
        .await
    }

    /// URL of the original file. Opaque to the client; never fetched here.
    pub fn photo_file_url(&self, id: i64) -> String {
        self.url(&format!("/photos/{}/file", id))
    }

    /// URL of a thumbnail. Opaque to the client; never fetched here.
    pub fn thumbnail_url(&self, id: i64, size: ThumbnailSize) -> String {
        self.url(&format!("/photos/{}/thumbnail/{}", id, size.as_str()))
    }
}
