//! Tag endpoints.

use super::{page_query, CatalogClient};
use crate::errors::ClientError;
use crate::models::{MediaItem, Tag};

impl CatalogClient {
    /// GET /tags/ - All tags with photo counts, most used first.
    pub async fn list_tags(&self) -> Result<Vec<Tag>, ClientError> {
        self.get("/tags/", &[]).await
    }

    /// GET /tags/{id}/photos - Photos carrying a tag.
    pub async fn tag_photos(
        &self,
        tag_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MediaItem>, ClientError> {
        self.get(
            &format!("/tags/{}/photos", tag_id),
            &page_query(limit, offset),
        )
        .await
    }
}
