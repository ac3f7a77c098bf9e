use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::features::sources::services::union;
use crate::features::videos::dtos::{VideoBulkAction, VideoEditDto, VideoFormsetDto, VideoRowDto};
use crate::features::videos::models::Video;
use crate::shared::constants::MAX_TAG_LENGTH;
use crate::shared::types::FormErrors;
use crate::shared::validation::{collect_field_errors, is_web_url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUpdate {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub website_url: String,
    pub file_url: String,
    pub embed_code: String,
    pub thumbnail_url: String,
    pub when_published: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub categories: Vec<Uuid>,
    pub authors: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoPlan {
    pub updates: Vec<VideoUpdate>,
    /// Rows marked `delete`
    pub rejections: Vec<Uuid>,
    /// `bulk_action` and the rows it applies to
    pub action: Option<(VideoBulkAction, Vec<Uuid>)>,
}

/// Validate a bulk edit formset.
///
/// `existing` holds the ids of videos that can be edited; the catalog sets
/// hold every category and author id.
pub fn plan_bulk_edit(
    existing: &HashSet<Uuid>,
    categories: &HashSet<Uuid>,
    authors: &HashSet<Uuid>,
    form: &VideoFormsetDto,
) -> Result<VideoPlan, FormErrors> {
    let mut errors = FormErrors::new();
    let mut plan = VideoPlan::default();
    let mut selected = Vec::new();
    let mut seen = HashSet::new();

    check_bulk_form(form, categories, authors, &mut errors);

    for (i, row) in form.rows.iter().enumerate() {
        let id = Some(row.id.to_string());

        if !existing.contains(&row.id) {
            errors.add(Some(i), id, None, "Video does not exist.");
            continue;
        }
        if !seen.insert(row.id) {
            errors.add(Some(i), id, None, "Video appears more than once.");
            continue;
        }
        if row.delete {
            plan.rejections.push(row.id);
            continue;
        }

        check_row(Some(i), row, categories, authors, &mut errors);

        let update = if row.bulk {
            selected.push(row.id);
            merge_bulk(row, form)
        } else {
            update_from_row(row)
        };
        plan.updates.push(update);
    }

    if let Some(action) = form.bulk_action {
        plan.action = Some((action, selected));
    }

    errors.into_result().map(|_| plan)
}

/// Validate an edit of one video against its current state.
pub fn plan_video_edit(
    video: &Video,
    categories: &HashSet<Uuid>,
    authors: &HashSet<Uuid>,
    edit: &VideoEditDto,
) -> Result<VideoUpdate, FormErrors> {
    let or_current = |given: &Option<String>, current: &str| {
        given.clone().unwrap_or_else(|| current.to_string())
    };
    let row = VideoRowDto {
        id: video.id,
        name: or_current(&edit.name, &video.name),
        description: or_current(&edit.description, &video.description),
        website_url: or_current(&edit.website_url, &video.website_url),
        file_url: video.file_url.clone(),
        embed_code: video.embed_code.clone(),
        thumbnail_url: or_current(&edit.thumbnail_url, &video.thumbnail_url),
        when_published: edit.when_published.or(video.when_published),
        tags: edit.tags.clone().unwrap_or_else(|| video.tags.clone()),
        categories: edit.categories.clone().unwrap_or_else(|| video.categories.clone()),
        authors: edit.authors.clone().unwrap_or_else(|| video.authors.clone()),
        delete: false,
        bulk: false,
    };

    let mut errors = FormErrors::new();
    check_row(None, &row, categories, authors, &mut errors);
    errors.into_result().map(|_| update_from_row(&row))
}

fn check_bulk_form(
    form: &VideoFormsetDto,
    categories: &HashSet<Uuid>,
    authors: &HashSet<Uuid>,
    errors: &mut FormErrors,
) {
    if form.bulk.categories.iter().any(|c| !categories.contains(c)) {
        errors.field("categories", "Select a valid category.");
    }
    if let Some(bulk_authors) = &form.bulk.authors {
        if bulk_authors.iter().any(|a| !authors.contains(a)) {
            errors.field("authors", "Select a valid author.");
        }
    }
    if let Some(tags) = &form.bulk.tags {
        if tags.iter().any(|t| t.chars().count() > MAX_TAG_LENGTH) {
            errors.field(
                "tags",
                format!("Tags may be at most {} characters.", MAX_TAG_LENGTH),
            );
        }
    }
}

/// Field checks of one video; `at` is the formset row, `None` for a single edit.
fn check_row(
    at: Option<usize>,
    row: &VideoRowDto,
    categories: &HashSet<Uuid>,
    authors: &HashSet<Uuid>,
    errors: &mut FormErrors,
) {
    let id = Some(row.id.to_string());

    if let Err(e) = row.validate() {
        collect_field_errors(&e, at, id.clone(), errors);
    }

    for (field, value) in [
        ("website_url", &row.website_url),
        ("file_url", &row.file_url),
        ("thumbnail_url", &row.thumbnail_url),
    ] {
        if !value.is_empty() && !is_web_url(value) {
            errors.add(at, id.clone(), Some(field), "Enter a valid URL.");
        }
    }

    if row.tags.iter().any(|t| t.chars().count() > MAX_TAG_LENGTH) {
        errors.add(
            at,
            id.clone(),
            Some("tags"),
            format!("Tags may be at most {} characters.", MAX_TAG_LENGTH),
        );
    }
    if row.categories.iter().any(|c| !categories.contains(c)) {
        errors.add(at, id.clone(), Some("categories"), "Select a valid category.");
    }
    if row.authors.iter().any(|a| !authors.contains(a)) {
        errors.add(at, id, Some("authors"), "Select a valid author.");
    }
}

fn clean_tags(tags: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !cleaned.iter().any(|c| c == tag) {
            cleaned.push(tag.to_string());
        }
    }
    cleaned
}

fn update_from_row(row: &VideoRowDto) -> VideoUpdate {
    VideoUpdate {
        id: row.id,
        name: row.name.trim().to_string(),
        description: row.description.clone(),
        website_url: row.website_url.clone(),
        file_url: row.file_url.clone(),
        embed_code: row.embed_code.clone(),
        thumbnail_url: row.thumbnail_url.clone(),
        when_published: row.when_published,
        tags: clean_tags(&row.tags),
        categories: union(&[], &row.categories),
        authors: union(&[], &row.authors),
    }
}

/// A `bulk` row after the extra form: non-empty scalars overwrite, categories
/// are added, authors and tags are replaced when given.
fn merge_bulk(row: &VideoRowDto, form: &VideoFormsetDto) -> VideoUpdate {
    let bulk = &form.bulk;
    let mut update = update_from_row(row);

    if let Some(name) = bulk.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        update.name = name.to_string();
    }
    if let Some(description) = bulk.description.as_deref().filter(|d| !d.is_empty()) {
        update.description = description.to_string();
    }
    if bulk.when_published.is_some() {
        update.when_published = bulk.when_published;
    }
    update.categories = union(&update.categories, &bulk.categories);
    if let Some(authors) = bulk.authors.as_ref().filter(|a| !a.is_empty()) {
        update.authors = union(&[], authors);
    }
    if let Some(tags) = &bulk.tags {
        update.tags = clean_tags(tags);
    }

    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::videos::dtos::VideoBulkFormDto;
    use pretty_assertions::assert_eq;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn row(n: u128) -> VideoRowDto {
        VideoRowDto {
            id: id(n),
            name: format!("Video {}", n),
            description: String::new(),
            website_url: format!("http://example.com/{}", n),
            file_url: String::new(),
            embed_code: String::new(),
            thumbnail_url: String::new(),
            when_published: None,
            tags: vec![],
            categories: vec![id(10)],
            authors: vec![id(20)],
            delete: false,
            bulk: false,
        }
    }

    fn catalog() -> (HashSet<Uuid>, HashSet<Uuid>, HashSet<Uuid>) {
        (
            HashSet::from([id(1), id(2), id(3)]),
            HashSet::from([id(10), id(11)]),
            HashSet::from([id(20), id(21)]),
        )
    }

    fn form(rows: Vec<VideoRowDto>) -> VideoFormsetDto {
        VideoFormsetDto {
            rows,
            bulk: VideoBulkFormDto::default(),
            bulk_action: None,
        }
    }

    #[test]
    fn test_plain_rows_become_updates() {
        let (videos, cats, authors) = catalog();
        let plan = plan_bulk_edit(&videos, &cats, &authors, &form(vec![row(1), row(2)])).unwrap();

        assert_eq!(plan.updates.len(), 2);
        assert!(plan.rejections.is_empty());
        assert_eq!(plan.action, None);
    }

    #[test]
    fn test_invalid_row_rejects_everything() {
        let (videos, cats, authors) = catalog();
        let mut bad = row(2);
        bad.name = String::new();
        bad.file_url = "not a url".to_string();

        let errors = plan_bulk_edit(&videos, &cats, &authors, &form(vec![row(1), bad])).unwrap_err();

        assert!(!errors.has_row(0));
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.clone()).collect();
        assert_eq!(fields, vec![Some("name".to_string()), Some("file_url".to_string())]);
    }

    #[test]
    fn test_bulk_form_merge_rules() {
        let (videos, cats, authors) = catalog();
        let mut selected = row(1);
        selected.bulk = true;
        selected.tags = vec!["old".to_string()];
        let untouched = row(2);

        let mut submitted = form(vec![selected, untouched]);
        submitted.bulk = VideoBulkFormDto {
            name: Some(String::new()),
            description: Some("Shared description".to_string()),
            when_published: None,
            categories: vec![id(11)],
            authors: Some(vec![id(21)]),
            tags: Some(vec!["new".to_string(), " new ".to_string()]),
        };
        submitted.bulk_action = Some(VideoBulkAction::Feature);

        let plan = plan_bulk_edit(&videos, &cats, &authors, &submitted).unwrap();

        let merged = &plan.updates[0];
        assert_eq!(merged.name, "Video 1");
        assert_eq!(merged.description, "Shared description");
        assert_eq!(merged.categories, vec![id(10), id(11)]);
        assert_eq!(merged.authors, vec![id(21)]);
        assert_eq!(merged.tags, vec!["new".to_string()]);

        assert_eq!(plan.updates[1].categories, vec![id(10)]);
        assert_eq!(plan.action, Some((VideoBulkAction::Feature, vec![id(1)])));
    }

    #[test]
    fn test_delete_rows_are_rejected_without_validation() {
        let (videos, cats, authors) = catalog();
        let mut doomed = row(3);
        doomed.name = String::new();
        doomed.delete = true;

        let plan = plan_bulk_edit(&videos, &cats, &authors, &form(vec![doomed])).unwrap();

        assert_eq!(plan.rejections, vec![id(3)]);
        assert!(plan.updates.is_empty());
    }

    #[test]
    fn test_overlong_tag_and_unknown_category() {
        let (videos, cats, authors) = catalog();
        let mut bad = row(1);
        bad.tags = vec!["x".repeat(51)];
        bad.categories = vec![id(99)];

        let errors = plan_bulk_edit(&videos, &cats, &authors, &form(vec![bad])).unwrap_err();
        assert_eq!(errors.errors.len(), 2);
    }

    #[test]
    fn test_repeated_links_in_a_row_are_collapsed() {
        let (videos, cats, authors) = catalog();
        let mut repeated = row(1);
        repeated.categories = vec![id(10), id(11), id(10)];
        repeated.authors = vec![id(20), id(20)];

        let plan = plan_bulk_edit(&videos, &cats, &authors, &form(vec![repeated])).unwrap();

        assert_eq!(plan.updates[0].categories, vec![id(10), id(11)]);
        assert_eq!(plan.updates[0].authors, vec![id(20)]);
    }

    #[test]
    fn test_repeated_bulk_authors_are_collapsed() {
        let (videos, cats, authors) = catalog();
        let mut selected = row(1);
        selected.bulk = true;
        let mut submitted = form(vec![selected]);
        submitted.bulk.authors = Some(vec![id(21), id(21)]);

        let plan = plan_bulk_edit(&videos, &cats, &authors, &submitted).unwrap();

        assert_eq!(plan.updates[0].authors, vec![id(21)]);
    }

    fn stored(n: u128) -> Video {
        Video {
            id: id(n),
            name: format!("Video {}", n),
            description: "Original".to_string(),
            website_url: String::new(),
            file_url: "http://example.com/v.ogv".to_string(),
            embed_code: String::new(),
            thumbnail_url: String::new(),
            status: crate::features::videos::models::VideoStatus::Active,
            feed_id: None,
            search_id: None,
            tags: vec!["old".to_string()],
            when_submitted: Utc::now(),
            when_published: None,
            when_approved: None,
            last_featured: None,
            feed_name: None,
            feed_video_service: None,
            search_query: None,
            categories: vec![id(10)],
            authors: vec![id(20)],
        }
    }

    #[test]
    fn test_video_edit_keeps_absent_fields() {
        let (_, cats, authors) = catalog();
        let edit = VideoEditDto {
            name: Some(" Renamed ".to_string()),
            categories: Some(vec![id(11), id(11)]),
            ..VideoEditDto::default()
        };

        let update = plan_video_edit(&stored(1), &cats, &authors, &edit).unwrap();

        assert_eq!(update.name, "Renamed");
        assert_eq!(update.description, "Original");
        assert_eq!(update.file_url, "http://example.com/v.ogv");
        assert_eq!(update.tags, vec!["old".to_string()]);
        assert_eq!(update.categories, vec![id(11)]);
        assert_eq!(update.authors, vec![id(20)]);
    }

    #[test]
    fn test_video_edit_errors_are_form_level() {
        let (_, cats, authors) = catalog();
        let edit = VideoEditDto {
            website_url: Some("javascript:alert(1)".to_string()),
            authors: Some(vec![id(99)]),
            ..VideoEditDto::default()
        };

        let errors = plan_video_edit(&stored(1), &cats, &authors, &edit).unwrap_err();

        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_deref()).collect();
        assert_eq!(fields, vec![Some("website_url"), Some("authors")]);
        assert!(errors.errors.iter().all(|e| e.row.is_none()));
    }
}
