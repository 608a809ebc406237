//! Search endpoints.
//!
//! Results come back relevance-sorted and are returned in server order.

use super::{page_query, CatalogClient};
use crate::errors::ClientError;
use crate::models::{MediaItem, SearchFilter, SearchQuery, SearchSuggestions};

/// Maximum number of suggestions the backend returns per category.
const MAX_SUGGESTIONS: u32 = 50;

impl CatalogClient {
    /// GET /search/semantic - Natural language search.
    pub async fn semantic_search(
        &self,
        text: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MediaItem>, ClientError> {
        let mut query = vec![("q", text.to_string())];
        query.extend(page_query(limit, offset));
        self.get("/search/semantic", &query).await
    }

    /// POST /search/ - Combined text and filter search.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<MediaItem>, ClientError> {
        self.post_json("/search/", query).await
    }

    /// GET /search/filter - Filter-only search.
    pub async fn filter_search(
        &self,
        filter: &SearchFilter,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MediaItem>, ClientError> {
        let mut query = filter.query_pairs();
        query.extend(page_query(limit, offset));
        self.get("/search/filter", &query).await
    }

    /// GET /search/suggestions - Completion candidates for a partial query.
    pub async fn suggestions(
        &self,
        partial: &str,
        limit: u32,
    ) -> Result<SearchSuggestions, ClientError> {
        self.get(
            "/search/suggestions",
            &[
                ("q", partial.to_string()),
                ("limit", limit.min(MAX_SUGGESTIONS).to_string()),
            ],
        )
        .await
    }
}
