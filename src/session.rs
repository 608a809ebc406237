//! Library session.
//!
//! A [`Library`] ties one catalog client, one query cache and the
//! configuration together for the lifetime of a session. Views get feeds and
//! cached reads from it; every mutation goes through it so that it is
//! validated, serialized per entity and followed by the right invalidations.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::api::CatalogClient;
use crate::cache::{CacheKey, EntityKind, EntityRef, Invalidate, ListKind, QueryCache};
use crate::config::Config;
use crate::errors::ClientError;
use crate::feed::{FeedController, FilterSpec, PageSource, ScrollSensor, ViewportHost};
use crate::models::{
    Album, AlbumAddPhotos, AlbumCreate, AlbumDeleted, AlbumDetail, AlbumUpdate, ImportRequest,
    ImportSource, ImportSourceDeleted, LibraryStats, MediaItem, Person, PersonDeleted,
    PersonMerged, PersonUpdate, PhotoDeleted, PhotoDetail, PhotoRemoved, PhotosAdded,
    ProcessingStatus, SearchSuggestions, StatusAck, Tag,
};

/// Feed pages served through the session cache.
pub struct CachedPages {
    client: Arc<CatalogClient>,
    cache: QueryCache,
}

impl CachedPages {
    pub fn new(client: Arc<CatalogClient>, cache: QueryCache) -> Self {
        Self { client, cache }
    }
}

#[async_trait]
impl PageSource for CachedPages {
    async fn fetch_page(
        &self,
        filter: &FilterSpec,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<MediaItem>, ClientError> {
        let client = Arc::clone(&self.client);
        let owned = filter.clone();
        self.cache
            .fetch(CacheKey::feed_page(filter, offset, limit), move || async move {
                client.fetch_page(&owned, offset, limit).await
            })
            .await
    }

    fn is_invalidated(&self, filter: &FilterSpec, offset: u32, limit: u32) -> bool {
        self.cache
            .is_invalidated(&CacheKey::feed_page(filter, offset, limit))
    }
}

/// Everything a deleted photo could have appeared in.
fn photo_removal_scopes(photo_id: i64) -> Vec<Invalidate> {
    vec![
        Invalidate::Entity(EntityRef::Photo(photo_id)),
        Invalidate::AllFeeds,
        Invalidate::Entities(EntityKind::Album),
        Invalidate::Entities(EntityKind::Person),
        Invalidate::List(ListKind::Albums),
        Invalidate::List(ListKind::People),
        Invalidate::List(ListKind::Tags),
        Invalidate::List(ListKind::LibraryStats),
        Invalidate::List(ListKind::ProcessingStatus),
    ]
}

/// Everything that shows a person's name or membership.
fn person_scopes(person_id: i64) -> Vec<Invalidate> {
    vec![
        Invalidate::Entity(EntityRef::Person(person_id)),
        Invalidate::Feed(FilterSpec::Person(person_id)),
        Invalidate::Entities(EntityKind::Photo),
        Invalidate::List(ListKind::People),
        Invalidate::List(ListKind::Suggestions),
    ]
}

fn album_scopes(album_id: i64) -> Vec<Invalidate> {
    vec![
        Invalidate::Entity(EntityRef::Album(album_id)),
        Invalidate::List(ListKind::Albums),
    ]
}

fn require_name(field: &str, value: &str) -> Result<String, ClientError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Validation(format!("{} must not be blank", field)));
    }
    Ok(trimmed.to_string())
}

/// Session-scoped entry point to the catalog.
pub struct Library {
    config: Arc<Config>,
    client: Arc<CatalogClient>,
    cache: QueryCache,
}

impl Library {
    /// Open a session with a fresh client and an empty cache.
    pub fn open(config: Config) -> Result<Self, ClientError> {
        let client = CatalogClient::new(&config)?;
        let cache = QueryCache::new(config.cache_ttl);
        info!(
            "Library session opened: page_size={}, cache_ttl={:?}",
            config.page_size, config.cache_ttl
        );
        Ok(Self::with_parts(config, Arc::new(client), cache))
    }

    /// Assemble a session from existing parts.
    pub fn with_parts(config: Config, client: Arc<CatalogClient>, cache: QueryCache) -> Self {
        Self {
            config: Arc::new(config),
            client,
            cache,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn pages(&self) -> Arc<CachedPages> {
        Arc::new(CachedPages::new(self.client.clone(), self.cache.clone()))
    }

    /// A new feed bound to this session's cache.
    pub fn feed(&self, filter: FilterSpec) -> Arc<FeedController> {
        Arc::new(FeedController::new(
            self.pages(),
            filter,
            self.config.page_size,
            self.config.request_timeout,
        ))
    }

    /// Scroll sensor that loads `feed` using the configured margin.
    pub fn sensor(&self, host: &ViewportHost, feed: Arc<FeedController>) -> ScrollSensor {
        ScrollSensor::for_feed(host, feed, self.config.sentinel_margin_px)
    }

    /// End the session. Cached data is dropped; feeds keep what they loaded.
    pub fn close(&self) {
        self.cache.close();
        info!("Library session closed");
    }

    // Cached reads

    pub async fn photo(&self, id: i64) -> Result<PhotoDetail, ClientError> {
        let client = self.client.clone();
        self.cache
            .fetch(CacheKey::entity(EntityRef::Photo(id)), move || async move {
                client.get_photo(id).await
            })
            .await
    }

    pub async fn people(
        &self,
        named_only: bool,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Person>, ClientError> {
        let client = self.client.clone();
        let params = format!("named_only={}&limit={}&offset={}", named_only, limit, offset);
        self.cache
            .fetch(CacheKey::list(ListKind::People, params), move || async move {
                client.list_people(named_only, limit, offset).await
            })
            .await
    }

    pub async fn person(&self, id: i64) -> Result<Person, ClientError> {
        let client = self.client.clone();
        self.cache
            .fetch(CacheKey::entity(EntityRef::Person(id)), move || async move {
                client.get_person(id).await
            })
            .await
    }

    pub async fn albums(&self, limit: u32, offset: u32) -> Result<Vec<Album>, ClientError> {
        let client = self.client.clone();
        let params = format!("limit={}&offset={}", limit, offset);
        self.cache
            .fetch(CacheKey::list(ListKind::Albums, params), move || async move {
                client.list_albums(limit, offset).await
            })
            .await
    }

    pub async fn album(&self, id: i64) -> Result<AlbumDetail, ClientError> {
        let client = self.client.clone();
        self.cache
            .fetch(CacheKey::entity(EntityRef::Album(id)), move || async move {
                client.get_album(id).await
            })
            .await
    }

    pub async fn tags(&self) -> Result<Vec<Tag>, ClientError> {
        let client = self.client.clone();
        self.cache
            .fetch(CacheKey::list(ListKind::Tags, ""), move || async move {
                client.list_tags().await
            })
            .await
    }

    pub async fn processing_status(&self) -> Result<ProcessingStatus, ClientError> {
        let client = self.client.clone();
        self.cache
            .fetch(
                CacheKey::list(ListKind::ProcessingStatus, ""),
                move || async move { client.processing_status().await },
            )
            .await
    }

    pub async fn library_stats(&self) -> Result<LibraryStats, ClientError> {
        let client = self.client.clone();
        self.cache
            .fetch(CacheKey::list(ListKind::LibraryStats, ""), move || async move {
                client.library_stats().await
            })
            .await
    }

    pub async fn import_sources(&self) -> Result<Vec<ImportSource>, ClientError> {
        let client = self.client.clone();
        self.cache
            .fetch(CacheKey::list(ListKind::ImportSources, ""), move || async move {
                client.list_import_sources().await
            })
            .await
    }

    /// Completion candidates. A blank prefix has none and sends nothing.
    pub async fn suggestions(&self, partial: &str, limit: u32) -> Result<SearchSuggestions, ClientError> {
        let partial = partial.trim().to_string();
        if partial.is_empty() {
            return Ok(SearchSuggestions::default());
        }
        let client = self.client.clone();
        let params = format!("q={}&limit={}", partial, limit);
        self.cache
            .fetch(CacheKey::list(ListKind::Suggestions, params), move || async move {
                client.suggestions(&partial, limit).await
            })
            .await
    }

    // Mutations

    pub async fn delete_photo(&self, id: i64, delete_file: bool) -> Result<PhotoDeleted, ClientError> {
        info!(photo_id = id, delete_file, "deleting photo");
        self.cache
            .mutate(
                &[EntityRef::Photo(id)],
                &photo_removal_scopes(id),
                self.client.delete_photo(id, delete_file),
            )
            .await
    }

    pub async fn rename_person(&self, id: i64, name: &str) -> Result<Person, ClientError> {
        let name = require_name("person name", name)?;
        info!(person_id = id, "renaming person");
        let update = PersonUpdate { name: Some(name) };
        self.cache
            .mutate(
                &[EntityRef::Person(id)],
                &person_scopes(id),
                self.client.update_person(id, &update),
            )
            .await
    }

    /// Fold `other` into `target`.
    pub async fn merge_people(&self, target: i64, other: i64) -> Result<PersonMerged, ClientError> {
        if target == other {
            return Err(ClientError::Validation(
                "cannot merge a person with themselves".to_string(),
            ));
        }
        info!(target, other, "merging people");
        let mut scopes = person_scopes(target);
        scopes.push(Invalidate::Entity(EntityRef::Person(other)));
        scopes.push(Invalidate::Feed(FilterSpec::Person(other)));
        scopes.push(Invalidate::List(ListKind::LibraryStats));
        self.cache
            .mutate(
                &[EntityRef::Person(target), EntityRef::Person(other)],
                &scopes,
                self.client.merge_people(target, other),
            )
            .await
    }

    pub async fn delete_person(&self, id: i64) -> Result<PersonDeleted, ClientError> {
        info!(person_id = id, "deleting person");
        let mut scopes = person_scopes(id);
        scopes.push(Invalidate::List(ListKind::LibraryStats));
        self.cache
            .mutate(
                &[EntityRef::Person(id)],
                &scopes,
                self.client.delete_person(id),
            )
            .await
    }

    pub async fn create_album(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Album, ClientError> {
        let request = AlbumCreate {
            name: require_name("album name", name)?,
            description: description.map(str::to_string),
        };
        info!(name = %request.name, "creating album");
        self.cache
            .mutate(
                &[],
                &[Invalidate::List(ListKind::Albums)],
                self.client.create_album(&request),
            )
            .await
    }

    pub async fn update_album(&self, id: i64, update: AlbumUpdate) -> Result<Album, ClientError> {
        let mut update = update;
        if let Some(name) = update.name.take() {
            update.name = Some(require_name("album name", &name)?);
        }
        if update.name.is_none() && update.description.is_none() && update.cover_photo_id.is_none()
        {
            return Err(ClientError::Validation("album update is empty".to_string()));
        }
        info!(album_id = id, "updating album");
        self.cache
            .mutate(
                &[EntityRef::Album(id)],
                &album_scopes(id),
                self.client.update_album(id, &update),
            )
            .await
    }

    pub async fn delete_album(&self, id: i64) -> Result<AlbumDeleted, ClientError> {
        info!(album_id = id, "deleting album");
        self.cache
            .mutate(
                &[EntityRef::Album(id)],
                &album_scopes(id),
                self.client.delete_album(id),
            )
            .await
    }

    pub async fn add_to_album(&self, album_id: i64, photo_ids: &[i64]) -> Result<PhotosAdded, ClientError> {
        if photo_ids.is_empty() {
            return Err(ClientError::Validation(
                "no photos to add to the album".to_string(),
            ));
        }
        info!(album_id, count = photo_ids.len(), "adding photos to album");
        let request = AlbumAddPhotos {
            photo_ids: photo_ids.to_vec(),
        };
        self.cache
            .mutate(
                &[EntityRef::Album(album_id)],
                &album_scopes(album_id),
                self.client.add_photos_to_album(album_id, &request),
            )
            .await
    }

    pub async fn remove_from_album(&self, album_id: i64, photo_id: i64) -> Result<PhotoRemoved, ClientError> {
        info!(album_id, photo_id, "removing photo from album");
        self.cache
            .mutate(
                &[EntityRef::Album(album_id)],
                &album_scopes(album_id),
                self.client.remove_photo_from_album(album_id, photo_id),
            )
            .await
    }

    pub async fn reprocess_photo(&self, photo_id: i64) -> Result<StatusAck, ClientError> {
        info!(photo_id, "requesting reprocess");
        self.cache
            .mutate(
                &[EntityRef::Photo(photo_id)],
                &[
                    Invalidate::Entity(EntityRef::Photo(photo_id)),
                    Invalidate::List(ListKind::ProcessingStatus),
                ],
                self.client.reprocess_photo(photo_id),
            )
            .await
    }

    pub async fn start_import(&self, request: &ImportRequest) -> Result<ImportSource, ClientError> {
        require_name("import source path", &request.source_path)?;
        info!(path = %request.source_path, "starting import");
        self.cache
            .mutate(
                &[],
                &[
                    Invalidate::List(ListKind::ImportSources),
                    Invalidate::List(ListKind::LibraryStats),
                    Invalidate::List(ListKind::ProcessingStatus),
                ],
                self.client.start_import(request),
            )
            .await
    }

    pub async fn delete_import_source(
        &self,
        id: i64,
        delete_photos: bool,
    ) -> Result<ImportSourceDeleted, ClientError> {
        info!(source_id = id, delete_photos, "deleting import source");
        let mut scopes = vec![
            Invalidate::Entity(EntityRef::ImportSource(id)),
            Invalidate::List(ListKind::ImportSources),
        ];
        if delete_photos {
            scopes.extend([
                Invalidate::AllFeeds,
                Invalidate::Entities(EntityKind::Photo),
                Invalidate::Entities(EntityKind::Album),
                Invalidate::Entities(EntityKind::Person),
                Invalidate::List(ListKind::Albums),
                Invalidate::List(ListKind::People),
                Invalidate::List(ListKind::Tags),
                Invalidate::List(ListKind::LibraryStats),
            ]);
        }
        self.cache
            .mutate(
                &[EntityRef::ImportSource(id)],
                &scopes,
                self.client.delete_import_source(id, delete_photos),
            )
            .await
    }
}
