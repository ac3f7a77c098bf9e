use crate::features::sources::models::{SourceEntry, SourceKind};
use crate::shared::sorting::{SortDef, SortHeaders};

pub const SOURCE_SORT_DEFS: &[SortDef] = &[
    ("Source", Some("name__lower")),
    ("Categories", None),
    ("User Attribution", None),
    ("Type", Some("type")),
    ("Auto Approve", Some("auto_approve")),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSortKey {
    NameLower,
    Type,
    AutoApprove,
}

impl SourceSortKey {
    pub fn from_headers(headers: &SortHeaders) -> Self {
        match headers.ordering() {
            "type" => SourceSortKey::Type,
            "auto_approve" => SourceSortKey::AutoApprove,
            _ => SourceSortKey::NameLower,
        }
    }
}

/// The `filter` parameter of the source manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFilter {
    /// Plain feeds
    Feed,
    /// Video service user feeds
    User,
    Search,
}

impl SourceFilter {
    /// Unknown values mean "no filter".
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "feed" => Some(SourceFilter::Feed),
            "user" => Some(SourceFilter::User),
            "search" => Some(SourceFilter::Search),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFilter::Feed => "feed",
            SourceFilter::User => "user",
            SourceFilter::Search => "search",
        }
    }

    fn kind(&self) -> SourceKind {
        match self {
            SourceFilter::Feed => SourceKind::Feed,
            SourceFilter::User => SourceKind::User,
            SourceFilter::Search => SourceKind::Search,
        }
    }
}

pub fn filter_sources(
    entries: Vec<SourceEntry>,
    filter: Option<SourceFilter>,
    q: Option<&str>,
) -> Vec<SourceEntry> {
    let needle = q.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty());

    entries
        .into_iter()
        .filter(|e| filter.is_none_or(|f| e.source.kind() == f.kind()))
        .filter(|e| needle.as_deref().is_none_or(|n| e.source.matches_text(n)))
        .collect()
}

/// Sort in place. The id tie-break makes descending the exact reverse of ascending.
pub fn sort_sources(entries: &mut [SourceEntry], key: SourceSortKey, descending: bool) {
    entries.sort_by(|a, b| {
        let ordering = match key {
            SourceSortKey::NameLower => a
                .source
                .display_name()
                .to_lowercase()
                .cmp(&b.source.display_name().to_lowercase()),
            SourceSortKey::Type => a.source.kind().as_str().cmp(b.source.kind().as_str()),
            SourceSortKey::AutoApprove => a.source.auto_approve().cmp(&b.source.auto_approve()),
        }
        .then_with(|| a.source.id().cmp(&b.source.id()));

        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::sources::models::{Feed, FeedStatus, SavedSearch, Source, SourceId};
    use chrono::Utc;
    use uuid::Uuid;

    fn feed(n: u128, name: &str, service: Option<&str>, auto: bool) -> SourceEntry {
        SourceEntry {
            source: Source::Feed(Feed {
                id: Uuid::from_u128(n),
                name: name.to_string(),
                feed_url: format!("http://example.com/{}.rss", n),
                webpage: String::new(),
                description: String::new(),
                status: FeedStatus::Active,
                auto_approve: auto,
                avoid_frontpage: false,
                video_service: service.map(str::to_string),
                last_updated: Utc::now(),
                created_at: Utc::now(),
            }),
            auto_categories: vec![],
            auto_authors: vec![],
        }
    }

    fn search(n: u128, query: &str) -> SourceEntry {
        SourceEntry {
            source: Source::Search(SavedSearch {
                id: Uuid::from_u128(n),
                query_string: query.to_string(),
                auto_approve: false,
                created_at: Utc::now(),
            }),
            auto_categories: vec![],
            auto_authors: vec![],
        }
    }

    fn sample() -> Vec<SourceEntry> {
        vec![
            feed(1, "beta", None, true),
            feed(2, "Alpha", Some("YouTube"), false),
            search(3, "alpha"),
            feed(4, "gamma", None, false),
            search(5, "Delta"),
        ]
    }

    fn ids(entries: &[SourceEntry]) -> Vec<SourceId> {
        entries.iter().map(|e| e.source.id()).collect()
    }

    #[test]
    fn test_filters_by_kind() {
        let feeds = filter_sources(sample(), Some(SourceFilter::Feed), None);
        assert_eq!(feeds.len(), 2);

        let users = filter_sources(sample(), Some(SourceFilter::User), None);
        assert_eq!(ids(&users), vec![SourceId::Feed(Uuid::from_u128(2))]);

        let searches = filter_sources(sample(), Some(SourceFilter::Search), None);
        assert_eq!(searches.len(), 2);
    }

    #[test]
    fn test_query_matches_name_url_or_search() {
        let hits = filter_sources(sample(), None, Some("ALPHA"));
        assert_eq!(hits.len(), 2);

        let by_url = filter_sources(sample(), None, Some("example.com/4"));
        assert_eq!(ids(&by_url), vec![SourceId::Feed(Uuid::from_u128(4))]);

        assert_eq!(filter_sources(sample(), None, Some("  ")).len(), 5);
    }

    #[test]
    fn test_unknown_filter_is_ignored() {
        assert_eq!(SourceFilter::parse(Some("bogus")), None);
        assert_eq!(SourceFilter::parse(Some("user")), Some(SourceFilter::User));
    }

    #[test]
    fn test_name_sort_is_case_insensitive_with_id_tie_break() {
        let mut entries = sample();
        sort_sources(&mut entries, SourceSortKey::NameLower, false);

        let names: Vec<&str> = entries.iter().map(|e| e.source.display_name()).collect();
        assert_eq!(names, vec!["Alpha", "alpha", "beta", "Delta", "gamma"]);
    }

    #[test]
    fn test_descending_is_exact_reverse() {
        for key in [
            SourceSortKey::NameLower,
            SourceSortKey::Type,
            SourceSortKey::AutoApprove,
        ] {
            let mut asc = sample();
            let mut desc = sample();
            sort_sources(&mut asc, key, false);
            sort_sources(&mut desc, key, true);

            let mut reversed = ids(&asc);
            reversed.reverse();
            assert_eq!(ids(&desc), reversed, "key {:?}", key);
        }
    }

    #[test]
    fn test_sort_key_from_headers() {
        let headers = SortHeaders::new(SOURCE_SORT_DEFS, Some("-type"), None);
        assert_eq!(SourceSortKey::from_headers(&headers), SourceSortKey::Type);
        assert!(headers.is_descending());

        let fallback = SortHeaders::new(SOURCE_SORT_DEFS, Some("categories"), None);
        assert_eq!(SourceSortKey::from_headers(&fallback), SourceSortKey::NameLower);
    }
}
