//! Remote catalog client.
//!
//! Typed request/response boundary to the backend REST API. One file per
//! resource, each adding methods to [`CatalogClient`]. Pure I/O: no caching
//! and no business rules live here.

mod albums;
mod imports;
mod people;
mod photos;
mod processing;
mod search;
mod tags;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::{status_error, ClientError};
use crate::feed::{FilterSpec, PageSource};
use crate::models::MediaItem;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query-string pairs.
pub type Query<'a> = [(&'a str, String)];

/// HTTP client for the catalog backend.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: String,
}

impl CatalogClient {
    /// Create a client from configuration.
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| ClientError::Config(format!("Invalid API key header: {}", e)))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Catalog client ready: url={}, auth={}",
            config.api_base_url,
            config.api_key.is_some()
        );

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL including the `/api` prefix.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query<'_>,
    ) -> Result<T, ClientError> {
        self.execute(Method::GET, path, query, None::<&()>).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query<'_>,
    ) -> Result<T, ClientError> {
        self.execute(Method::POST, path, query, None::<&()>).await
    }

    pub(crate) async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.execute(Method::POST, path, &[], Some(body)).await
    }

    pub(crate) async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.execute(Method::PUT, path, &[], Some(body)).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query<'_>,
    ) -> Result<T, ClientError> {
        self.execute(Method::DELETE, path, query, None::<&()>).await
    }

    async fn execute<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &Query<'_>,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        debug!(%method, path, ?query, "catalog request");

        let mut request: RequestBuilder = self.http.request(method.clone(), self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = status_error(status.as_u16(), &text);
            warn!(%method, path, status = status.as_u16(), "catalog request failed: {}", err);
            return Err(err);
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Decode(format!("{} {}: {}", method, path, e)))
    }
}

/// Paging parameters.
pub(crate) fn page_query(limit: u32, offset: u32) -> Vec<(&'static str, String)> {
    vec![("limit", limit.to_string()), ("offset", offset.to_string())]
}

#[async_trait]
impl PageSource for CatalogClient {
    async fn fetch_page(
        &self,
        filter: &FilterSpec,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<MediaItem>, ClientError> {
        match filter {
            FilterSpec::All => self.list_photos(limit, offset, None).await,
            FilterSpec::MediaKind(kind) => self.list_photos(limit, offset, Some(*kind)).await,
            FilterSpec::Tag(tag_id) => self.tag_photos(*tag_id, limit, offset).await,
            FilterSpec::Person(person_id) => self.person_photos(*person_id, limit, offset).await,
            FilterSpec::Query(text) => self.semantic_search(text, limit, offset).await,
        }
    }
}
