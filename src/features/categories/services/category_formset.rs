use std::collections::{HashMap, HashSet};

use uuid::Uuid;
use validator::Validate;

use crate::features::categories::dtos::CategoryFormsetDto;
use crate::features::categories::hierarchy::{validate_reassignments, CategoryForest};
use crate::features::categories::models::Category;
use crate::shared::types::FormErrors;
use crate::shared::validation::collect_field_errors;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub logo: Option<String>,
    pub parent_id: Option<Uuid>,
}

/// Validated changes of a category formset, ready to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPlan {
    pub updates: Vec<CategoryUpdate>,
    pub deletions: Vec<Uuid>,
}

/// Validate a formset against the current categories.
///
/// Checks run in order: row fields, batch-wide name/slug uniqueness, then the
/// parent graph after every edit and deletion is applied. Any failure returns
/// all errors found so far and nothing is planned.
pub fn plan_formset(
    existing: &[Category],
    form: &CategoryFormsetDto,
) -> Result<CategoryPlan, FormErrors> {
    let mut errors = FormErrors::new();
    let known: HashMap<Uuid, &Category> = existing.iter().map(|c| (c.id, c)).collect();
    let row_of: HashMap<Uuid, usize> = form
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| (row.id, i))
        .collect();

    let mut deleted = HashSet::new();
    for (i, row) in form.rows.iter().enumerate() {
        let id = Some(row.id.to_string());

        if !known.contains_key(&row.id) {
            errors.add(Some(i), id, None, "Category does not exist.");
            continue;
        }
        if row_of.get(&row.id) != Some(&i) {
            errors.add(Some(i), id, None, "Category appears more than once.");
            continue;
        }
        if form.is_deleted(row) {
            deleted.insert(row.id);
            continue;
        }
        if let Err(e) = row.validate() {
            collect_field_errors(&e, Some(i), id, &mut errors);
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    check_unique(existing, form, &deleted, &mut errors);
    if !errors.is_empty() {
        return Err(errors);
    }

    let proposed: HashMap<Uuid, Option<Uuid>> = form
        .rows
        .iter()
        .filter(|row| !deleted.contains(&row.id))
        .map(|row| (row.id, row.parent_id))
        .collect();

    let forest = CategoryForest::from_links(existing.iter().map(|c| (c.id, c.parent_id)));
    let candidate = match validate_reassignments(&forest, &proposed, &deleted) {
        Ok(candidate) => candidate,
        Err(violations) => {
            for v in violations {
                let row = row_of.get(&v.category_id).copied();
                errors.add(
                    row,
                    Some(v.category_id.to_string()),
                    row.map(|_| "parent_id"),
                    v.kind.message(),
                );
            }
            return Err(errors);
        }
    };

    let updates = form
        .rows
        .iter()
        .filter(|row| !deleted.contains(&row.id))
        .map(|row| CategoryUpdate {
            id: row.id,
            name: row.name.trim().to_string(),
            slug: row.slug.clone(),
            description: row.description.clone(),
            logo: row.logo.clone().filter(|l| !l.is_empty()),
            parent_id: candidate.parent(row.id),
        })
        .collect();

    let mut deletions: Vec<Uuid> = deleted.into_iter().collect();
    deletions.sort();

    Ok(CategoryPlan { updates, deletions })
}

/// Names and slugs must stay unique across the post-edit set.
fn check_unique(
    existing: &[Category],
    form: &CategoryFormsetDto,
    deleted: &HashSet<Uuid>,
    errors: &mut FormErrors,
) {
    let edited: HashMap<Uuid, (usize, &str, &str)> = form
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| !deleted.contains(&row.id))
        .map(|(i, row)| (row.id, (i, row.name.trim(), row.slug.as_str())))
        .collect();

    let mut names: HashMap<&str, Vec<Uuid>> = HashMap::new();
    let mut slugs: HashMap<&str, Vec<Uuid>> = HashMap::new();
    for category in existing.iter().filter(|c| !deleted.contains(&c.id)) {
        let (name, slug) = match edited.get(&category.id) {
            Some(&(_, name, slug)) => (name, slug),
            None => (category.name.as_str(), category.slug.as_str()),
        };
        names.entry(name).or_default().push(category.id);
        slugs.entry(slug).or_default().push(category.id);
    }

    let mut rows: Vec<_> = edited.iter().collect();
    rows.sort_by_key(|(_, (i, _, _))| *i);
    for (id, &(i, name, slug)) in rows {
        if names.get(name).is_some_and(|ids| ids.len() > 1) {
            errors.add(
                Some(i),
                Some(id.to_string()),
                Some("name"),
                "Category with this name already exists.",
            );
        }
        if slugs.get(slug).is_some_and(|ids| ids.len() > 1) {
            errors.add(
                Some(i),
                Some(id.to_string()),
                Some("slug"),
                "Category with this slug already exists.",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::categories::dtos::{CategoryBulkAction, CategoryRowDto};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn category(n: u128, parent: Option<u128>, name: &str) -> Category {
        Category {
            id: id(n),
            parent_id: parent.map(id),
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: String::new(),
            logo: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn existing() -> Vec<Category> {
        vec![
            category(1, None, "Music"),
            category(2, Some(1), "Jazz"),
            category(3, Some(2), "Bebop"),
        ]
    }

    fn row(c: &Category) -> CategoryRowDto {
        CategoryRowDto {
            id: c.id,
            name: c.name.clone(),
            slug: c.slug.clone(),
            description: c.description.clone(),
            logo: c.logo.clone(),
            parent_id: c.parent_id,
            delete: false,
            bulk: false,
        }
    }

    fn formset(rows: Vec<CategoryRowDto>) -> CategoryFormsetDto {
        CategoryFormsetDto {
            rows,
            bulk_action: None,
        }
    }

    #[test]
    fn test_unchanged_formset_plans_same_rows() {
        let cats = existing();
        let plan = plan_formset(&cats, &formset(cats.iter().map(row).collect())).unwrap();

        assert_eq!(plan.updates.len(), 3);
        assert!(plan.deletions.is_empty());
        assert_eq!(plan.updates[2].parent_id, Some(id(2)));
    }

    #[test]
    fn test_cycle_marks_rows_and_plans_nothing() {
        let cats = existing();
        let mut rows: Vec<_> = cats.iter().map(row).collect();
        rows[0].parent_id = Some(id(3));

        let errors = plan_formset(&cats, &formset(rows)).unwrap_err();

        assert!(errors.has_row(0));
        assert!(errors.has_row(1));
        assert!(errors.has_row(2));
        assert!(errors
            .errors
            .iter()
            .all(|e| e.field.as_deref() == Some("parent_id")));
    }

    #[test]
    fn test_self_parent_reported_on_its_row() {
        let cats = existing();
        let mut rows = vec![row(&cats[1])];
        rows[0].parent_id = Some(id(2));

        let errors = plan_formset(&cats, &formset(rows)).unwrap_err();

        assert_eq!(errors.errors.len(), 1);
        assert_eq!(errors.errors[0].row, Some(0));
        assert_eq!(errors.errors[0].message, "A category cannot be its own parent.");
    }

    #[test]
    fn test_bulk_delete_orphans_children() {
        let cats = existing();
        let mut rows: Vec<_> = cats.iter().map(row).collect();
        rows[1].bulk = true;
        let form = CategoryFormsetDto {
            rows,
            bulk_action: Some(CategoryBulkAction::Delete),
        };

        let plan = plan_formset(&cats, &form).unwrap();

        assert_eq!(plan.deletions, vec![id(2)]);
        let bebop = plan.updates.iter().find(|u| u.id == id(3)).unwrap();
        assert_eq!(bebop.parent_id, None);
    }

    #[test]
    fn test_deleted_rows_skip_field_validation() {
        let cats = existing();
        let mut rows = vec![row(&cats[2])];
        rows[0].name = String::new();
        rows[0].delete = true;

        let plan = plan_formset(&cats, &formset(rows)).unwrap();
        assert_eq!(plan.deletions, vec![id(3)]);
    }

    #[test]
    fn test_duplicate_name_in_batch() {
        let cats = existing();
        let mut rows = vec![row(&cats[2])];
        rows[0].name = "Jazz".to_string();

        let errors = plan_formset(&cats, &formset(rows)).unwrap_err();

        assert_eq!(errors.errors.len(), 1);
        assert_eq!(errors.errors[0].field.as_deref(), Some("name"));
    }

    #[test]
    fn test_renames_can_swap() {
        let cats = existing();
        let mut rows = vec![row(&cats[1]), row(&cats[2])];
        rows[0].name = "Bebop".to_string();
        rows[0].slug = "bebop".to_string();
        rows[1].name = "Jazz".to_string();
        rows[1].slug = "jazz".to_string();

        assert!(plan_formset(&cats, &formset(rows)).is_ok());
    }

    #[test]
    fn test_invalid_slug_and_unknown_row() {
        let cats = existing();
        let mut bad = row(&cats[0]);
        bad.slug = "Not Valid".to_string();
        let mut ghost = row(&cats[1]);
        ghost.id = id(42);

        let errors = plan_formset(&cats, &formset(vec![bad, ghost])).unwrap_err();

        assert!(errors.errors.iter().any(|e| e.row == Some(0) && e.field.as_deref() == Some("slug")));
        assert!(errors.errors.iter().any(|e| e.row == Some(1) && e.field.is_none()));
    }

    #[test]
    fn test_reverse_reassignment_planned_on_committed_rows_is_rejected() {
        let cats = vec![category(1, None, "Music"), category(2, None, "Film")];
        let mut first = row(&cats[0]);
        first.parent_id = Some(id(2));
        let plan = plan_formset(&cats, &formset(vec![first])).unwrap();

        let mut committed = cats.clone();
        committed[0].parent_id = plan.updates[0].parent_id;
        let mut second = row(&committed[1]);
        second.parent_id = Some(id(1));

        let errors = plan_formset(&committed, &formset(vec![second])).unwrap_err();

        assert!(errors
            .errors
            .iter()
            .any(|e| e.row == Some(0) && e.field.as_deref() == Some("parent_id")));
    }
}
