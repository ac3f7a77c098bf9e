use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Feed, SavedSearch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Feed,
    Search,
    /// A video service user's uploads, or a direct submission for videos
    User,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Feed => "feed",
            SourceKind::Search => "search",
            SourceKind::User => "user",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formset row identifier: `feed-<uuid>` or `search-<uuid>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceId {
    Feed(Uuid),
    Search(Uuid),
}

impl SourceId {
    pub fn uuid(&self) -> Uuid {
        match self {
            SourceId::Feed(id) | SourceId::Search(id) => *id,
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Feed(id) => write!(f, "feed-{}", id),
            SourceId::Search(id) => write!(f, "search-{}", id),
        }
    }
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, raw) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid source id: {}", s))?;
        let id = Uuid::parse_str(raw).map_err(|_| format!("Invalid source id: {}", s))?;

        match prefix {
            "feed" => Ok(SourceId::Feed(id)),
            "search" => Ok(SourceId::Search(id)),
            _ => Err(format!("Invalid source id: {}", s)),
        }
    }
}

impl Serialize for SourceId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SourceId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone)]
pub enum Source {
    Feed(Feed),
    Search(SavedSearch),
}

impl Source {
    pub fn id(&self) -> SourceId {
        match self {
            Source::Feed(feed) => SourceId::Feed(feed.id),
            Source::Search(search) => SourceId::Search(search.id),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Source::Feed(feed) => &feed.name,
            Source::Search(search) => &search.query_string,
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Feed(feed) if feed.video_service.is_some() => SourceKind::User,
            Source::Feed(_) => SourceKind::Feed,
            Source::Search(_) => SourceKind::Search,
        }
    }

    pub fn auto_approve(&self) -> bool {
        match self {
            Source::Feed(feed) => feed.auto_approve,
            Source::Search(search) => search.auto_approve,
        }
    }

    /// Text searched by the `q` filter.
    pub fn matches_text(&self, needle_lower: &str) -> bool {
        match self {
            Source::Feed(feed) => {
                feed.name.to_lowercase().contains(needle_lower)
                    || feed.feed_url.to_lowercase().contains(needle_lower)
            }
            Source::Search(search) => search.query_string.to_lowercase().contains(needle_lower),
        }
    }
}

/// A source with its auto-attribution sets
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub source: Source,
    pub auto_categories: Vec<Uuid>,
    pub auto_authors: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_round_trips_through_text() {
        let id = Uuid::from_u128(7);
        let feed: SourceId = format!("feed-{}", id).parse().unwrap();
        let search: SourceId = format!("search-{}", id).parse().unwrap();

        assert_eq!(feed, SourceId::Feed(id));
        assert_eq!(search.to_string(), format!("search-{}", id));
    }

    #[test]
    fn test_source_id_rejects_bad_prefix_or_uuid() {
        assert!("video-00000000-0000-0000-0000-000000000007".parse::<SourceId>().is_err());
        assert!("feed-42".parse::<SourceId>().is_err());
        assert!("feed".parse::<SourceId>().is_err());
    }
}
