//! People and pets recognised by the backend.

use serde::{Deserialize, Serialize};

/// A face cluster, optionally named by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_named: bool,
    #[serde(default)]
    pub photo_count: i64,
    #[serde(default)]
    pub representative_face_id: Option<i64>,
}

impl Person {
    /// Name to show; unnamed clusters get a stable placeholder.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => name.to_string(),
            None => format!("Person {}", self.id),
        }
    }
}

/// A recognised pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub is_named: bool,
    #[serde(default)]
    pub photo_count: i64,
}

/// Request body for `PUT /people/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct PersonUpdate {
    pub name: Option<String>,
}

/// Response of `POST /people/{id}/merge/{other}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonMerged {
    pub status: String,
    pub person_id: i64,
}

/// Response of `DELETE /people/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonDeleted {
    pub status: String,
    pub person_id: i64,
}
