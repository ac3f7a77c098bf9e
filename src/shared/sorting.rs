//! Sort-header resolution for admin listings.
//!
//! A listing declares its sortable columns as `(label, Option<key>)` pairs;
//! a `-` prefix on a key means the column sorts descending by default.
//! The requested `sort` parameter is honoured only when it names one of the
//! declared keys, otherwise the listing's default ordering applies.

use serde::Serialize;
use utoipa::ToSchema;

use super::query::QueryParams;

/// Column declaration: display label and, for sortable columns, its key.
pub type SortDef = (&'static str, Option<&'static str>);

pub const CLASS_SORT_UP: &str = "sortup";
pub const CLASS_SORT_DOWN: &str = "sortdown";

/// One rendered column header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SortHeader {
    pub label: String,
    /// Sort key this header's link requests, `None` for unsortable columns
    pub sort: Option<String>,
    pub link: Option<String>,
    /// `sortup`/`sortdown` on the active column, empty otherwise
    pub class: String,
}

#[derive(Debug, Clone)]
pub struct SortHeaders {
    defs: &'static [SortDef],
    default_order: String,
    ordering: String,
    desc: bool,
}

impl SortHeaders {
    /// Resolve `requested` against `defs`.
    ///
    /// `default` overrides the first sortable column as the fallback ordering.
    pub fn new(defs: &'static [SortDef], requested: Option<&str>, default: Option<&str>) -> Self {
        let default_order = default
            .map(str::to_string)
            .or_else(|| defs.iter().find_map(|(_, key)| key.map(str::to_string)))
            .unwrap_or_default();

        let (mut ordering, mut desc) = split_direction(&default_order);

        let (sort, sort_desc) = split_direction(requested.unwrap_or(""));
        if !sort.is_empty()
            && defs
                .iter()
                .filter_map(|(_, key)| *key)
                .any(|key| key.trim_start_matches('-') == sort)
        {
            ordering = sort;
            desc = sort_desc;
        }

        Self {
            defs,
            default_order,
            ordering,
            desc,
        }
    }

    /// Active key without direction prefix.
    pub fn ordering(&self) -> &str {
        &self.ordering
    }

    pub fn is_descending(&self) -> bool {
        self.desc
    }

    /// Active ordering as `key` or `-key`.
    pub fn order_by(&self) -> String {
        if self.desc {
            format!("-{}", self.ordering)
        } else {
            self.ordering.clone()
        }
    }

    pub fn headers(&self, params: &QueryParams) -> Vec<SortHeader> {
        self.defs
            .iter()
            .map(|(label, key)| {
                let active = key.is_some_and(|k| k.trim_start_matches('-') == self.ordering);

                let (sort, class) = if active {
                    if self.desc {
                        (Some(self.ordering.clone()), CLASS_SORT_UP)
                    } else {
                        (Some(format!("-{}", self.ordering)), CLASS_SORT_DOWN)
                    }
                } else {
                    (key.map(str::to_string), "")
                };

                SortHeader {
                    label: label.to_string(),
                    link: sort.as_deref().map(|s| self.link_for(params, s)),
                    sort,
                    class: class.to_string(),
                }
            })
            .collect()
    }

    fn link_for(&self, params: &QueryParams, sort: &str) -> String {
        let mut params = params.clone();
        params.remove("sort");
        params.remove("page");
        if sort != self.default_order {
            params.set("sort", sort);
        }
        params.to_link()
    }
}

fn split_direction(key: &str) -> (String, bool) {
    match key.strip_prefix('-') {
        Some(rest) => (rest.to_string(), true),
        None => (key.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VIDEO_DEFS: &[SortDef] = &[
        ("Video Title", Some("name")),
        ("Source", Some("source")),
        ("Categories", None),
        ("Date Published", Some("-when_published")),
        ("Date Imported", Some("-when_submitted")),
    ];

    fn params(raw: &str) -> QueryParams {
        QueryParams::parse("/api/admin/bulk-edit", Some(raw))
    }

    #[test]
    fn test_default_is_first_sortable_column() {
        let sort = SortHeaders::new(VIDEO_DEFS, None, None);
        assert_eq!(sort.ordering(), "name");
        assert!(!sort.is_descending());
        assert_eq!(sort.order_by(), "name");
    }

    #[test]
    fn test_descending_default() {
        let sort = SortHeaders::new(VIDEO_DEFS, None, Some("-when_published"));
        assert_eq!(sort.order_by(), "-when_published");
    }

    #[test]
    fn test_requested_key_matches_without_prefix() {
        let sort = SortHeaders::new(VIDEO_DEFS, Some("when_published"), None);
        assert_eq!(sort.order_by(), "when_published");

        let sort = SortHeaders::new(VIDEO_DEFS, Some("-source"), None);
        assert_eq!(sort.order_by(), "-source");
    }

    #[test]
    fn test_unknown_key_falls_back_to_default() {
        for requested in ["bogus", "-bogus", "categories", "-", ""] {
            let sort = SortHeaders::new(VIDEO_DEFS, Some(requested), None);
            assert_eq!(sort.order_by(), "name", "requested {:?}", requested);
        }
    }

    #[test]
    fn test_active_ascending_header_toggles_down() {
        let sort = SortHeaders::new(VIDEO_DEFS, None, None);
        let headers = sort.headers(&params(""));

        assert_eq!(headers[0].sort.as_deref(), Some("-name"));
        assert_eq!(headers[0].class, CLASS_SORT_DOWN);
        assert_eq!(headers[0].link.as_deref(), Some("?sort=-name"));

        // inactive columns keep their declared direction
        assert_eq!(headers[3].sort.as_deref(), Some("-when_published"));
        assert_eq!(headers[3].class, "");

        // unsortable
        assert_eq!(headers[2].sort, None);
        assert_eq!(headers[2].link, None);
    }

    #[test]
    fn test_active_descending_header_toggles_up() {
        let sort = SortHeaders::new(VIDEO_DEFS, Some("-name"), None);
        let headers = sort.headers(&params("sort=-name&page=3"));

        assert_eq!(headers[0].sort.as_deref(), Some("name"));
        assert_eq!(headers[0].class, CLASS_SORT_UP);
        // back to the default ordering: no sort param, path only
        assert_eq!(headers[0].link.as_deref(), Some("/api/admin/bulk-edit"));
    }

    #[test]
    fn test_links_keep_filters_and_drop_page() {
        let sort = SortHeaders::new(VIDEO_DEFS, Some("source"), None);
        let headers = sort.headers(&params("filter=featured&page=2&sort=source&q=cat"));

        assert_eq!(
            headers[1].link.as_deref(),
            Some("?filter=featured&q=cat&sort=-source")
        );
        assert_eq!(headers[0].link.as_deref(), Some("?filter=featured&q=cat"));
    }
}
