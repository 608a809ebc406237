//! Feed filter identity.

use std::fmt;

use crate::models::MediaKind;

/// Which subset of the catalog a feed is drawn from.
///
/// At most one constraint applies at a time; the enum makes that structural.
/// Equality is plain value equality and is what cache keys and feed identity
/// are built on, so two specs built from the same inputs always compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum FilterSpec {
    /// Whole library
    #[default]
    All,
    /// Only photos or only videos
    MediaKind(MediaKind),
    /// Photos carrying a tag
    Tag(i64),
    /// Photos containing a person
    Person(i64),
    /// Free-text (semantic) query
    Query(String),
}

impl FilterSpec {
    /// Build a text-query spec. Surrounding whitespace is dropped and a blank
    /// query means no filter.
    pub fn query(text: impl AsRef<str>) -> Self {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            FilterSpec::All
        } else {
            FilterSpec::Query(trimmed.to_string())
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        matches!(self, FilterSpec::All)
    }

    /// Results of text queries come back relevance-ordered rather than by date.
    pub fn is_relevance_ordered(&self) -> bool {
        matches!(self, FilterSpec::Query(_))
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::All => write!(f, "all"),
            FilterSpec::MediaKind(kind) => write!(f, "kind={}", kind.as_str()),
            FilterSpec::Tag(id) => write!(f, "tag={}", id),
            FilterSpec::Person(id) => write!(f, "person={}", id),
            FilterSpec::Query(text) => write!(f, "query={:?}", text),
        }
    }
}
