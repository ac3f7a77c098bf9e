use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::features::videos::models::{Video, VideoStatus};
use crate::shared::pagination::PageWindow;
use crate::shared::query::QueryParams;
use crate::shared::sorting::{SortDef, SortHeaders};

pub const VIDEO_SORT_DEFS: &[SortDef] = &[
    ("Video Title", Some("name")),
    ("Source", Some("source")),
    ("Categories", None),
    ("Date Published", Some("-when_published")),
    ("Date Imported", Some("-when_submitted")),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSortKey {
    /// Case-insensitive title
    NameLower,
    /// Source kind: feed, search, user
    Source,
    WhenPublished,
    WhenSubmitted,
}

impl VideoSortKey {
    pub fn from_headers(headers: &SortHeaders) -> Self {
        match headers.ordering() {
            "source" => VideoSortKey::Source,
            "when_published" => VideoSortKey::WhenPublished,
            "when_submitted" => VideoSortKey::WhenSubmitted,
            _ => VideoSortKey::NameLower,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            VideoSortKey::NameLower => "LOWER(v.name)",
            VideoSortKey::Source => {
                "CASE WHEN v.search_id IS NOT NULL THEN 'search' \
                 WHEN v.feed_id IS NOT NULL AND f.video_service IS NULL THEN 'feed' \
                 ELSE 'user' END"
            }
            VideoSortKey::WhenPublished => "v.when_published",
            VideoSortKey::WhenSubmitted => "v.when_submitted",
        }
    }
}

/// `ORDER BY` for a key, tie-broken by id in the same direction.
pub fn order_by_sql(key: VideoSortKey, descending: bool) -> String {
    let dir = if descending { "DESC" } else { "ASC" };
    format!(" ORDER BY {} {}, v.id {}", key.as_sql(), dir, dir)
}

/// The `filter` parameter of the bulk editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFlag {
    Featured,
    Rejected,
    NoAttribution,
    NoCategory,
}

impl VideoFlag {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "featured" => Some(VideoFlag::Featured),
            "rejected" => Some(VideoFlag::Rejected),
            "no-attribution" => Some(VideoFlag::NoAttribution),
            "no-category" => Some(VideoFlag::NoCategory),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoFlag::Featured => "featured",
            VideoFlag::Rejected => "rejected",
            VideoFlag::NoAttribution => "no-attribution",
            VideoFlag::NoCategory => "no-category",
        }
    }
}

/// Filters of the bulk editor. Each one narrows the set independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoFilter {
    pub category: Option<Uuid>,
    pub author: Option<Uuid>,
    pub flag: Option<VideoFlag>,
    pub q: Option<String>,
}

impl VideoFilter {
    /// Malformed ids and unknown flags are ignored.
    pub fn from_params(params: &QueryParams) -> Self {
        Self {
            category: params.get("category").and_then(|c| Uuid::parse_str(c).ok()),
            author: params.get("author").and_then(|a| Uuid::parse_str(a).ok()),
            flag: VideoFlag::parse(params.get("filter")),
            q: params
                .get("q")
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
        }
    }

    /// Active videos, or rejected ones under the `rejected` flag.
    pub fn status(&self) -> VideoStatus {
        if self.flag == Some(VideoFlag::Rejected) {
            VideoStatus::Rejected
        } else {
            VideoStatus::Active
        }
    }

    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE v.status = ");
        qb.push_bind(self.status());

        if let Some(category) = self.category {
            qb.push(
                " AND EXISTS (SELECT 1 FROM video_categories fc \
                 WHERE fc.video_id = v.id AND fc.category_id = ",
            );
            qb.push_bind(category);
            qb.push(")");
        }

        if let Some(author) = self.author {
            qb.push(
                " AND EXISTS (SELECT 1 FROM video_authors fa \
                 WHERE fa.video_id = v.id AND fa.author_id = ",
            );
            qb.push_bind(author);
            qb.push(")");
        }

        match self.flag {
            Some(VideoFlag::Featured) => {
                qb.push(" AND v.last_featured IS NOT NULL");
            }
            Some(VideoFlag::NoAttribution) => {
                qb.push(" AND NOT EXISTS (SELECT 1 FROM video_authors na WHERE na.video_id = v.id)");
            }
            Some(VideoFlag::NoCategory) => {
                qb.push(
                    " AND NOT EXISTS (SELECT 1 FROM video_categories nc WHERE nc.video_id = v.id)",
                );
            }
            Some(VideoFlag::Rejected) | None => {}
        }

        if let Some(q) = &self.q {
            let pattern = like_pattern(q);
            qb.push(" AND (v.name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR v.description ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR f.name ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
    }

    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(
            "SELECT COUNT(*) FROM videos v LEFT JOIN feeds f ON f.id = v.feed_id",
        );
        self.push_where(&mut qb);
        qb
    }

    pub fn page_query(
        &self,
        key: VideoSortKey,
        descending: bool,
        window: &PageWindow,
    ) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(Video::SELECT);
        self.push_where(&mut qb);
        qb.push(order_by_sql(key, descending));
        qb.push(" LIMIT ");
        qb.push_bind(window.limit());
        qb.push(" OFFSET ");
        qb.push_bind(window.sql_offset());
        qb
    }

    /// Active filter parameters, for echoing back to the client.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(author) = self.author {
            pairs.push(("author", author.to_string()));
        }
        if let Some(flag) = self.flag {
            pairs.push(("filter", flag.as_str().to_string()));
        }
        if let Some(q) = &self.q {
            pairs.push(("q", q.clone()));
        }
        pairs
    }
}

/// `%q%` with LIKE wildcards in `q` escaped.
fn like_pattern(q: &str) -> String {
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
