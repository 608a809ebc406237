//! People endpoints.

use super::{page_query, CatalogClient};
use crate::errors::ClientError;
use crate::models::{MediaItem, Person, PersonDeleted, PersonMerged, PersonUpdate};

/// Largest face crop the backend renders.
const MAX_FACE_SIZE: u32 = 512;

impl CatalogClient {
    /// GET /people/ - Recognised people, most photographed first.
    pub async fn list_people(
        &self,
        named_only: bool,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Person>, ClientError> {
        let mut query = vec![("named_only", named_only.to_string())];
        query.extend(page_query(limit, offset));
        self.get("/people/", &query).await
    }

    /// GET /people/{id} - Person details.
    pub async fn get_person(&self, id: i64) -> Result<Person, ClientError> {
        self.get(&format!("/people/{}", id), &[]).await
    }

    /// PUT /people/{id} - Update a person (naming).
    pub async fn update_person(
        &self,
        id: i64,
        update: &PersonUpdate,
    ) -> Result<Person, ClientError> {
        self.put_json(&format!("/people/{}", id), update).await
    }

    /// GET /people/{id}/photos - Photos containing a person, newest first.
    pub async fn person_photos(
        &self,
        person_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MediaItem>, ClientError> {
        self.get(
            &format!("/people/{}/photos", person_id),
            &page_query(limit, offset),
        )
        .await
    }

    /// POST /people/{id}/merge/{other} - Fold `other` into `id`.
    pub async fn merge_people(&self, id: i64, other: i64) -> Result<PersonMerged, ClientError> {
        self.post(&format!("/people/{}/merge/{}", id, other), &[])
            .await
    }

    /// DELETE /people/{id} - Delete a person; their faces become unassigned.
    pub async fn delete_person(&self, id: i64) -> Result<PersonDeleted, ClientError> {
        self.delete(&format!("/people/{}", id), &[]).await
    }

    /// URL of a person's representative face crop.
    pub fn person_face_url(&self, person_id: i64, size: u32) -> String {
        self.url(&format!(
            "/people/{}/face?size={}",
            person_id,
            size.min(MAX_FACE_SIZE)
        ))
    }

    /// URL of a single detected face crop.
    pub fn face_thumbnail_url(&self, face_id: i64, size: u32) -> String {
        self.url(&format!(
            "/people/faces/{}/thumbnail?size={}",
            face_id,
            size.min(MAX_FACE_SIZE)
        ))
    }
}
