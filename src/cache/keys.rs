//! Cache keys and invalidation scopes.

use std::fmt;

use crate::feed::FilterSpec;

/// Kind of catalog entity that can be mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Photo,
    Person,
    Album,
    ImportSource,
}

/// A single catalog entity. Orders by kind, then id; mutation locks are
/// always taken in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityRef {
    Photo(i64),
    Person(i64),
    Album(i64),
    ImportSource(i64),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Photo(_) => EntityKind::Photo,
            EntityRef::Person(_) => EntityKind::Person,
            EntityRef::Album(_) => EntityKind::Album,
            EntityRef::ImportSource(_) => EntityKind::ImportSource,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            EntityRef::Photo(id)
            | EntityRef::Person(id)
            | EntityRef::Album(id)
            | EntityRef::ImportSource(id) => *id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind() {
            EntityKind::Photo => "photo",
            EntityKind::Person => "person",
            EntityKind::Album => "album",
            EntityKind::ImportSource => "import-source",
        };
        write!(f, "{}/{}", kind, self.id())
    }
}

/// Collection-level queries that are not feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    People,
    Albums,
    Tags,
    ImportSources,
    ProcessingStatus,
    LibraryStats,
    Suggestions,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::People => "people",
            ListKind::Albums => "albums",
            ListKind::Tags => "tags",
            ListKind::ImportSources => "import-sources",
            ListKind::ProcessingStatus => "processing-status",
            ListKind::LibraryStats => "stats",
            ListKind::Suggestions => "suggestions",
        }
    }
}

/// Identity of one cached query. Equal keys denote the same server query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    FeedPage {
        filter: FilterSpec,
        offset: u32,
        limit: u32,
    },
    Entity(EntityRef),
    /// `params` is the canonical query string, so different paging of the
    /// same list are different keys.
    List { kind: ListKind, params: String },
}

impl CacheKey {
    pub fn feed_page(filter: &FilterSpec, offset: u32, limit: u32) -> Self {
        CacheKey::FeedPage {
            filter: filter.clone(),
            offset,
            limit,
        }
    }

    pub fn entity(entity: EntityRef) -> Self {
        CacheKey::Entity(entity)
    }

    pub fn list(kind: ListKind, params: impl Into<String>) -> Self {
        CacheKey::List {
            kind,
            params: params.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::FeedPage {
                filter,
                offset,
                limit,
            } => write!(f, "feed[{}]@{}+{}", filter, offset, limit),
            CacheKey::Entity(entity) => write!(f, "{}", entity),
            CacheKey::List { kind, params } if params.is_empty() => write!(f, "{}", kind.as_str()),
            CacheKey::List { kind, params } => write!(f, "{}?{}", kind.as_str(), params),
        }
    }
}

/// A set of cache keys a mutation makes stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidate {
    /// One entity's detail query
    Entity(EntityRef),
    /// Detail queries of every entity of a kind
    Entities(EntityKind),
    /// Every page of every feed
    AllFeeds,
    /// Every page of one feed
    Feed(FilterSpec),
    /// Every variant of a list query
    List(ListKind),
}

impl Invalidate {
    pub fn matches(&self, key: &CacheKey) -> bool {
        match (self, key) {
            (Invalidate::Entity(target), CacheKey::Entity(entity)) => target == entity,
            (Invalidate::Entities(kind), CacheKey::Entity(entity)) => entity.kind() == *kind,
            (Invalidate::AllFeeds, CacheKey::FeedPage { .. }) => true,
            (Invalidate::Feed(target), CacheKey::FeedPage { filter, .. }) => target == filter,
            (Invalidate::List(target), CacheKey::List { kind, .. }) => target == kind,
            _ => false,
        }
    }
}
