use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::categories::models::Category;
use crate::shared::validation::SLUG_REGEX;

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub logo: Option<String>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            parent_id: c.parent_id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            logo: c.logo,
        }
    }
}

/// Response DTO for category tree (hierarchical structure)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(no_recursion)]
pub struct CategoryTreeDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub children: Vec<CategoryTreeDto>,
}

impl CategoryTreeDto {
    /// Build tree from a flat list; siblings keep the list's order.
    pub fn build_tree(categories: &[Category]) -> Vec<CategoryTreeDto> {
        categories
            .iter()
            .filter(|c| c.parent_id.is_none())
            .map(|root| Self::build_node(root, categories, 0))
            .collect()
    }

    fn build_node(category: &Category, all: &[Category], depth: usize) -> CategoryTreeDto {
        // the parent graph is acyclic, the depth bound only guards bad rows
        let children = if depth < all.len() {
            all.iter()
                .filter(|c| c.parent_id == Some(category.id))
                .map(|child| Self::build_node(child, all, depth + 1))
                .collect()
        } else {
            Vec::new()
        };

        CategoryTreeDto {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            children,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryListDto {
    /// Every category ordered by name
    pub categories: Vec<CategoryResponseDto>,
    pub tree: Vec<CategoryTreeDto>,
}

/// Add-category form
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: String,

    #[validate(
        length(min = 1, max = 80, message = "Slug must be 1-80 characters"),
        regex(
            path = *SLUG_REGEX,
            message = "Slug may only contain lowercase letters, numbers, underscores or hyphens"
        )
    )]
    pub slug: String,

    #[serde(default)]
    pub description: String,

    #[validate(url(message = "Logo must be a valid URL"))]
    pub logo: Option<String>,

    pub parent_id: Option<Uuid>,
}

/// One row of the category formset
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CategoryRowDto {
    pub id: Uuid,

    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: String,

    #[validate(
        length(min = 1, max = 80, message = "Slug must be 1-80 characters"),
        regex(
            path = *SLUG_REGEX,
            message = "Slug may only contain lowercase letters, numbers, underscores or hyphens"
        )
    )]
    pub slug: String,

    #[serde(default)]
    pub description: String,

    #[validate(url(message = "Logo must be a valid URL"))]
    pub logo: Option<String>,

    pub parent_id: Option<Uuid>,

    #[serde(default)]
    pub delete: bool,

    /// Selected for `bulk_action`
    #[serde(default)]
    pub bulk: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CategoryBulkAction {
    Delete,
}

/// Category formset submission
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CategoryFormsetDto {
    pub rows: Vec<CategoryRowDto>,
    pub bulk_action: Option<CategoryBulkAction>,
}

impl CategoryFormsetDto {
    pub fn is_deleted(&self, row: &CategoryRowDto) -> bool {
        row.delete || (row.bulk && self.bulk_action == Some(CategoryBulkAction::Delete))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryFormsetResultDto {
    pub updated: usize,
    pub deleted: usize,
    pub categories: Vec<CategoryResponseDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn category(n: u128, parent: Option<u128>, name: &str) -> Category {
        Category {
            id: Uuid::from_u128(n),
            parent_id: parent.map(Uuid::from_u128),
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: String::new(),
            logo: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_tree_nests_children() {
        let categories = vec![
            category(1, None, "Music"),
            category(2, Some(1), "Jazz"),
            category(3, Some(2), "Bebop"),
            category(4, None, "News"),
        ];

        let tree = CategoryTreeDto::build_tree(&categories);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "Music");
        assert_eq!(tree[0].children[0].name, "Jazz");
        assert_eq!(tree[0].children[0].children[0].name, "Bebop");
        assert!(tree[1].children.is_empty());
    }
}
