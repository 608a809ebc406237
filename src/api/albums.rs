//! Album endpoints.

use super::{page_query, CatalogClient};
use crate::errors::ClientError;
use crate::models::{
    Album, AlbumAddPhotos, AlbumCreate, AlbumDeleted, AlbumDetail, AlbumUpdate, PhotoRemoved,
    PhotosAdded,
};

impl CatalogClient {
    /// GET /albums/ - Albums, most recently updated first.
    pub async fn list_albums(&self, limit: u32, offset: u32) -> Result<Vec<Album>, ClientError> {
        self.get("/albums/", &page_query(limit, offset)).await
    }

    /// POST /albums/ - Create an album.
    pub async fn create_album(&self, request: &AlbumCreate) -> Result<Album, ClientError> {
        self.post_json("/albums/", request).await
    }

    /// GET /albums/{id} - Album with its photos.
    pub async fn get_album(&self, id: i64) -> Result<AlbumDetail, ClientError> {
        self.get(&format!("/albums/{}", id), &[]).await
    }

    /// PUT /albums/{id} - Update name, description or cover.
    pub async fn update_album(&self, id: i64, update: &AlbumUpdate) -> Result<Album, ClientError> {
        self.put_json(&format!("/albums/{}", id), update).await
    }

    /// DELETE /albums/{id} - Delete the album; its photos stay in the library.
    pub async fn delete_album(&self, id: i64) -> Result<AlbumDeleted, ClientError> {
        self.delete(&format!("/albums/{}", id), &[]).await
    }

    /// POST /albums/{id}/photos - Add photos; already present ones are skipped.
    pub async fn add_photos_to_album(
        &self,
        id: i64,
        request: &AlbumAddPhotos,
    ) -> Result<PhotosAdded, ClientError> {
        self.post_json(&format!("/albums/{}/photos", id), request)
            .await
    }

    /// DELETE /albums/{id}/photos/{photo_id} - Remove one photo from an album.
    pub async fn remove_photo_from_album(
        &self,
        album_id: i64,
        photo_id: i64,
    ) -> Result<PhotoRemoved, ClientError> {
        self.delete(&format!("/albums/{}/photos/{}", album_id, photo_id), &[])
            .await
    }
}
