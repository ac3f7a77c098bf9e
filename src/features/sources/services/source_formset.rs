use std::collections::{BTreeSet, HashMap, HashSet};

use uuid::Uuid;

use super::attribution::union;
use crate::features::feeds::services::{canonical_feed_key, validate_feed_url};
use crate::features::sources::dtos::{FeedEditDto, SourceFormsetDto};
use crate::features::sources::models::{Source, SourceEntry, SourceId};
use crate::shared::constants::MAX_NAME_LENGTH;
use crate::shared::types::FormErrors;
use crate::shared::validation::is_web_url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUpdate {
    pub id: Uuid,
    pub name: String,
    pub feed_url: String,
    pub webpage: String,
}

/// New auto sets of a source selected for the bulk form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionChange {
    pub source: SourceId,
    pub old_categories: BTreeSet<Uuid>,
    pub new_categories: Vec<Uuid>,
    pub old_authors: BTreeSet<Uuid>,
    pub new_authors: Vec<Uuid>,
    pub auto_approve: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePlan {
    pub feed_updates: Vec<FeedUpdate>,
    pub search_updates: Vec<(Uuid, String)>,
    pub removals: Vec<SourceId>,
    pub attribution: Vec<AttributionChange>,
    pub keep_videos: bool,
}

/// Validate a source formset against the current sources.
pub fn plan_formset(
    existing: &[SourceEntry],
    known_categories: &HashSet<Uuid>,
    known_authors: &HashSet<Uuid>,
    form: &SourceFormsetDto,
) -> Result<SourcePlan, FormErrors> {
    let mut errors = FormErrors::new();
    let by_id: HashMap<SourceId, &SourceEntry> =
        existing.iter().map(|e| (e.source.id(), e)).collect();

    for (field, ids, known) in [
        ("auto_categories", &form.bulk.auto_categories, known_categories),
        ("auto_authors", &form.bulk.auto_authors, known_authors),
    ] {
        if let Some(missing) = ids.iter().find(|id| !known.contains(*id)) {
            errors.field(field, format!("Select a valid choice. {} is not available.", missing));
        }
    }

    let mut plan = SourcePlan {
        keep_videos: form.keep_videos,
        ..SourcePlan::default()
    };
    let mut seen = HashSet::new();
    let mut moved_feeds = Vec::new();

    for (i, row) in form.rows.iter().enumerate() {
        let row_id = Some(row.id.to_string());

        let Some(entry) = by_id.get(&row.id) else {
            errors.add(Some(i), row_id, None, "Source does not exist.");
            continue;
        };
        if !seen.insert(row.id) {
            errors.add(Some(i), row_id, None, "Source appears more than once.");
            continue;
        }

        if form.is_deleted(row) {
            plan.removals.push(row.id);
            continue;
        }

        match &entry.source {
            Source::Feed(feed) => {
                let name = row.name.as_deref().unwrap_or(&feed.name).trim();
                let feed_url = row.feed_url.as_deref().unwrap_or(&feed.feed_url).trim();
                let webpage = row.webpage.as_deref().unwrap_or(&feed.webpage).trim();

                if let Some(message) = name_error(name) {
                    errors.add(Some(i), row_id.clone(), Some("name"), message);
                }
                let feed_url = if feed_url == feed.feed_url {
                    feed.feed_url.clone()
                } else {
                    match validate_feed_url(feed_url) {
                        Ok(url) => {
                            let url = url.to_string();
                            if url != feed.feed_url {
                                moved_feeds.push((i, row.id));
                            }
                            url
                        }
                        Err(e) => {
                            errors.add(
                                Some(i),
                                row_id.clone(),
                                Some("feed_url"),
                                format!("Enter a valid feed URL. {}", e),
                            );
                            feed_url.to_string()
                        }
                    }
                };
                if !webpage.is_empty() && !is_web_url(webpage) {
                    errors.add(Some(i), row_id.clone(), Some("webpage"), "Enter a valid URL.");
                }

                plan.feed_updates.push(FeedUpdate {
                    id: feed.id,
                    name: name.to_string(),
                    feed_url,
                    webpage: webpage.to_string(),
                });
            }
            Source::Search(search) => {
                let query = row
                    .query_string
                    .as_deref()
                    .unwrap_or(&search.query_string)
                    .trim();
                if query.is_empty() {
                    errors.add(
                        Some(i),
                        row_id.clone(),
                        Some("query_string"),
                        "This field is required.",
                    );
                }
                plan.search_updates.push((search.id, query.to_string()));
            }
        }

        if row.bulk {
            plan.attribution.push(AttributionChange {
                source: row.id,
                old_categories: entry.auto_categories.iter().copied().collect(),
                new_categories: union(&entry.auto_categories, &form.bulk.auto_categories),
                old_authors: entry.auto_authors.iter().copied().collect(),
                new_authors: union(&entry.auto_authors, &form.bulk.auto_authors),
                auto_approve: form.bulk.auto_approve,
            });
        }
    }

    check_feed_urls(existing, &plan, &moved_feeds, &mut errors);

    errors.into_result().map(|_| plan)
}

fn name_error(name: &str) -> Option<String> {
    if name.is_empty() {
        Some("This field is required.".to_string())
    } else if name.chars().count() > MAX_NAME_LENGTH {
        Some(format!("Ensure this value has at most {} characters.", MAX_NAME_LENGTH))
    } else {
        None
    }
}

/// Validate an inline edit of one feed. Given auto sets replace the current
/// ones and the feed's videos follow them the way a bulk form change does.
pub fn plan_feed_edit(
    entry: &SourceEntry,
    known_categories: &HashSet<Uuid>,
    known_authors: &HashSet<Uuid>,
    edit: &FeedEditDto,
) -> Result<SourcePlan, FormErrors> {
    let mut errors = FormErrors::new();
    let mut plan = SourcePlan::default();

    let Source::Feed(feed) = &entry.source else {
        errors.add(None, Some(entry.source.id().to_string()), None, "Source is not a feed.");
        return Err(errors);
    };

    if let Some(name) = edit.name.as_deref().map(str::trim) {
        if let Some(message) = name_error(name) {
            errors.field("name", message);
        }
        plan.feed_updates.push(FeedUpdate {
            id: feed.id,
            name: name.to_string(),
            feed_url: feed.feed_url.clone(),
            webpage: feed.webpage.clone(),
        });
    }

    for (field, ids, known) in [
        ("auto_categories", &edit.auto_categories, known_categories),
        ("auto_authors", &edit.auto_authors, known_authors),
    ] {
        let missing = ids.iter().flatten().find(|id| !known.contains(*id));
        if let Some(missing) = missing {
            errors.field(field, format!("Select a valid choice. {} is not available.", missing));
        }
    }

    if edit.auto_categories.is_some() || edit.auto_authors.is_some() {
        let replace = |given: &Option<Vec<Uuid>>, current: &[Uuid]| match given {
            Some(ids) => union(&[], ids),
            None => current.to_vec(),
        };
        plan.attribution.push(AttributionChange {
            source: entry.source.id(),
            old_categories: entry.auto_categories.iter().copied().collect(),
            new_categories: replace(&edit.auto_categories, &entry.auto_categories),
            old_authors: entry.auto_authors.iter().copied().collect(),
            new_authors: replace(&edit.auto_authors, &entry.auto_authors),
            auto_approve: None,
        });
    }

    errors.into_result().map(|_| plan)
}

/// Feed URLs must stay unique, whatever the shape of a service user URL, once
/// every edit and removal of the batch is applied.
fn check_feed_urls(
    existing: &[SourceEntry],
    plan: &SourcePlan,
    moved: &[(usize, SourceId)],
    errors: &mut FormErrors,
) {
    let edited: HashMap<Uuid, &str> = plan
        .feed_updates
        .iter()
        .map(|u| (u.id, u.feed_url.as_str()))
        .collect();

    let mut owners: HashMap<String, Vec<Uuid>> = HashMap::new();
    for entry in existing {
        let Source::Feed(feed) = &entry.source else {
            continue;
        };
        if plan.removals.contains(&entry.source.id()) {
            continue;
        }
        let url = edited
            .get(&feed.id)
            .copied()
            .unwrap_or(feed.feed_url.as_str());
        owners.entry(canonical_feed_key(url)).or_default().push(feed.id);
    }

    for &(i, source) in moved {
        let SourceId::Feed(id) = source else {
            continue;
        };
        let Some(url) = edited.get(&id) else {
            continue;
        };
        let other = owners
            .get(&canonical_feed_key(url))
            .and_then(|ids| ids.iter().find(|o| **o != id));
        if let Some(other) = other {
            errors.add(
                Some(i),
                Some(source.to_string()),
                Some("feed_url"),
                format!("Feed with this URL already exists ({}).", SourceId::Feed(*other)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::sources::dtos::{SourceBulkAction, SourceBulkFormDto, SourceRowDto};
    use crate::features::sources::models::{Feed, FeedStatus, SavedSearch};
    use chrono::Utc;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn feed(n: u128, name: &str, feed_url: &str) -> Feed {
        Feed {
            id: id(n),
            name: name.to_string(),
            feed_url: feed_url.to_string(),
            webpage: String::new(),
            description: String::new(),
            status: FeedStatus::Active,
            auto_approve: false,
            avoid_frontpage: false,
            video_service: None,
            last_updated: Utc::now(),
            created_at: Utc::now(),
        }
    }

    fn entries() -> Vec<SourceEntry> {
        vec![
            SourceEntry {
                source: Source::Feed(feed(1, "Blip", "http://blip.example/rss")),
                auto_categories: vec![id(10)],
                auto_authors: vec![],
            },
            SourceEntry {
                source: Source::Search(SavedSearch {
                    id: id(2),
                    query_string: "kittens".to_string(),
                    auto_approve: false,
                    created_at: Utc::now(),
                }),
                auto_categories: vec![],
                auto_authors: vec![id(20)],
            },
            SourceEntry {
                source: Source::Feed(feed(
                    3,
                    "foo",
                    "http://www.youtube.com/rss/user/foo/videos.rss",
                )),
                auto_categories: vec![],
                auto_authors: vec![],
            },
        ]
    }

    fn row(source: SourceId) -> SourceRowDto {
        SourceRowDto {
            id: source,
            name: None,
            feed_url: None,
            webpage: None,
            query_string: None,
            delete: false,
            bulk: false,
        }
    }

    fn form(rows: Vec<SourceRowDto>) -> SourceFormsetDto {
        SourceFormsetDto {
            rows,
            bulk: SourceBulkFormDto::default(),
            bulk_action: None,
            keep_videos: false,
        }
    }

    fn known() -> (HashSet<Uuid>, HashSet<Uuid>) {
        (HashSet::from([id(10), id(11)]), HashSet::from([id(20), id(21)]))
    }

    #[test]
    fn test_missing_fields_reject_whole_formset() {
        let (cats, authors) = known();
        let mut feed = row(SourceId::Feed(id(1)));
        feed.name = Some("  ".to_string());
        let mut search = row(SourceId::Search(id(2)));
        search.query_string = Some(String::new());

        let errors = plan_formset(&entries(), &cats, &authors, &form(vec![feed, search])).unwrap_err();

        assert!(errors.has_row(0));
        assert!(errors.has_row(1));
    }

    #[test]
    fn test_bulk_form_unions_auto_sets() {
        let (cats, authors) = known();
        let mut feed = row(SourceId::Feed(id(1)));
        feed.bulk = true;
        let mut search = row(SourceId::Search(id(2)));
        search.bulk = true;
        let mut submitted = form(vec![feed, search]);
        submitted.bulk = SourceBulkFormDto {
            auto_categories: vec![id(11)],
            auto_authors: vec![id(21)],
            auto_approve: Some(true),
        };

        let plan = plan_formset(&entries(), &cats, &authors, &submitted).unwrap();

        assert_eq!(plan.attribution.len(), 2);
        assert_eq!(plan.attribution[0].new_categories, vec![id(10), id(11)]);
        assert_eq!(plan.attribution[0].new_authors, vec![id(21)]);
        assert_eq!(plan.attribution[1].new_categories, vec![id(11)]);
        assert_eq!(plan.attribution[1].new_authors, vec![id(20), id(21)]);
        assert_eq!(plan.attribution[1].auto_approve, Some(true));
    }

    #[test]
    fn test_bulk_remove_and_keep_videos() {
        let (cats, authors) = known();
        let mut search = row(SourceId::Search(id(2)));
        search.bulk = true;
        let mut submitted = form(vec![row(SourceId::Feed(id(1))), search]);
        submitted.bulk_action = Some(SourceBulkAction::Remove);
        submitted.keep_videos = true;

        let plan = plan_formset(&entries(), &cats, &authors, &submitted).unwrap();

        assert_eq!(plan.removals, vec![SourceId::Search(id(2))]);
        assert_eq!(plan.feed_updates.len(), 1);
        assert!(plan.keep_videos);
        assert!(plan.attribution.is_empty());
    }

    #[test]
    fn test_unknown_auto_category_rejected() {
        let (cats, authors) = known();
        let mut submitted = form(vec![]);
        submitted.bulk.auto_categories = vec![id(99)];

        let errors = plan_formset(&entries(), &cats, &authors, &submitted).unwrap_err();
        assert_eq!(errors.errors[0].field.as_deref(), Some("auto_categories"));
    }

    #[test]
    fn test_unknown_source_row() {
        let (cats, authors) = known();
        let errors =
            plan_formset(&entries(), &cats, &authors, &form(vec![row(SourceId::Feed(id(7)))]))
                .unwrap_err();
        assert_eq!(errors.errors[0].row, Some(0));
    }

    #[test]
    fn test_feed_url_moved_to_private_address_rejected() {
        let (cats, authors) = known();
        let mut edited = row(SourceId::Feed(id(1)));
        edited.feed_url = Some("http://127.0.0.1:5432/admin".to_string());

        let errors = plan_formset(&entries(), &cats, &authors, &form(vec![edited])).unwrap_err();

        assert_eq!(errors.errors.len(), 1);
        assert_eq!(errors.errors[0].field.as_deref(), Some("feed_url"));
    }

    #[test]
    fn test_other_shape_of_service_user_url_is_duplicate() {
        let (cats, authors) = known();
        let mut edited = row(SourceId::Feed(id(1)));
        edited.feed_url = Some("http://gdata.youtube.com/feeds/base/users/foo/uploads".to_string());

        let errors = plan_formset(&entries(), &cats, &authors, &form(vec![edited])).unwrap_err();

        assert_eq!(errors.errors.len(), 1);
        assert_eq!(errors.errors[0].row, Some(0));
        assert!(errors.errors[0].message.contains("feed-"));
    }

    #[test]
    fn test_feeds_can_swap_urls() {
        let (cats, authors) = known();
        let mut first = row(SourceId::Feed(id(1)));
        first.feed_url = Some("http://www.youtube.com/rss/user/foo/videos.rss".to_string());
        let mut second = row(SourceId::Feed(id(3)));
        second.feed_url = Some("http://blip.example/rss".to_string());

        let plan = plan_formset(&entries(), &cats, &authors, &form(vec![first, second])).unwrap();

        assert_eq!(plan.feed_updates[0].feed_url, "http://www.youtube.com/rss/user/foo/videos.rss");
        assert_eq!(plan.feed_updates[1].feed_url, "http://blip.example/rss");
    }

    #[test]
    fn test_feed_can_take_url_of_removed_feed() {
        let (cats, authors) = known();
        let mut edited = row(SourceId::Feed(id(1)));
        edited.feed_url = Some("http://gdata.youtube.com/feeds/base/users/foo/uploads".to_string());
        let mut removed = row(SourceId::Feed(id(3)));
        removed.delete = true;

        let plan = plan_formset(&entries(), &cats, &authors, &form(vec![edited, removed])).unwrap();

        assert_eq!(plan.removals, vec![SourceId::Feed(id(3))]);
        assert_eq!(plan.feed_updates.len(), 1);
    }

    #[test]
    fn test_feed_edit_replaces_auto_sets() {
        let (cats, authors) = known();
        let edit = FeedEditDto {
            name: Some(" Blip TV ".to_string()),
            auto_categories: Some(vec![id(11), id(11)]),
            auto_authors: None,
        };

        let plan = plan_feed_edit(&entries()[0], &cats, &authors, &edit).unwrap();

        assert_eq!(plan.feed_updates[0].name, "Blip TV");
        assert_eq!(plan.feed_updates[0].feed_url, "http://blip.example/rss");
        let change = &plan.attribution[0];
        assert_eq!(change.old_categories, BTreeSet::from([id(10)]));
        assert_eq!(change.new_categories, vec![id(11)]);
        assert!(change.new_authors.is_empty());
        assert_eq!(change.auto_approve, None);
    }

    #[test]
    fn test_feed_edit_of_name_only_leaves_attribution() {
        let (cats, authors) = known();
        let edit = FeedEditDto {
            name: Some("Renamed".to_string()),
            ..FeedEditDto::default()
        };

        let plan = plan_feed_edit(&entries()[0], &cats, &authors, &edit).unwrap();

        assert_eq!(plan.feed_updates.len(), 1);
        assert!(plan.attribution.is_empty());
    }

    #[test]
    fn test_feed_edit_errors_are_form_level() {
        let (cats, authors) = known();
        let edit = FeedEditDto {
            name: Some("x".repeat(251)),
            auto_categories: None,
            auto_authors: Some(vec![id(99)]),
        };

        let errors = plan_feed_edit(&entries()[0], &cats, &authors, &edit).unwrap_err();

        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_deref()).collect();
        assert_eq!(fields, vec![Some("name"), Some("auto_authors")]);
        assert!(errors.errors.iter().all(|e| e.row.is_none()));
    }

    #[test]
    fn test_feed_edit_of_saved_search_rejected() {
        let (cats, authors) = known();
        let errors =
            plan_feed_edit(&entries()[1], &cats, &authors, &FeedEditDto::default()).unwrap_err();
        assert_eq!(errors.errors[0].message, "Source is not a feed.");
    }
}
