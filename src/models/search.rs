//! Search requests and suggestion payloads.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Body of the combined search (`POST /search/`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_datetime"
    )]
    pub date_from: Option<NaiveDateTime>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_datetime"
    )]
    pub date_to: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_video: Option<bool>,
    pub limit: u32,
    pub offset: u32,
}

fn serialize_opt_datetime<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    super::timestamp::option::serialize(value, serializer)
}

/// Filters for `GET /search/filter`. List filters are sent comma-separated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    pub people: Vec<i64>,
    pub pets: Vec<i64>,
    pub tags: Vec<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub date_from: Option<NaiveDateTime>,
    pub date_to: Option<NaiveDateTime>,
    pub is_video: Option<bool>,
}

impl SearchFilter {
    /// Render as query-string pairs, omitting empty filters.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.people.is_empty() {
            pairs.push(("people", join(&self.people)));
        }
        if !self.pets.is_empty() {
            pairs.push(("pets", join(&self.pets)));
        }
        if !self.tags.is_empty() {
            pairs.push(("tags", self.tags.join(",")));
        }
        if let Some(location) = &self.location {
            pairs.push(("location", location.clone()));
        }
        if let Some(country) = &self.country {
            pairs.push(("country", country.clone()));
        }
        if let Some(city) = &self.city {
            pairs.push(("city", city.clone()));
        }
        if let Some(from) = &self.date_from {
            pairs.push(("date_from", super::timestamp::format(from)));
        }
        if let Some(to) = &self.date_to {
            pairs.push(("date_to", super::timestamp::format(to)));
        }
        if let Some(is_video) = self.is_video {
            pairs.push(("is_video", is_video.to_string()));
        }
        pairs
    }
}

fn join(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Person entry in search suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSuggestion {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Pet entry in search suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetSuggestion {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
}

/// Tag entry in search suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSuggestion {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Response of `GET /search/suggestions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSuggestions {
    #[serde(default)]
    pub people: Vec<PersonSuggestion>,
    #[serde(default)]
    pub pets: Vec<PetSuggestion>,
    #[serde(default)]
    pub tags: Vec<TagSuggestion>,
    #[serde(default)]
    pub locations: Vec<String>,
}
