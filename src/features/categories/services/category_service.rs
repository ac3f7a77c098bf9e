use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use validator::Validate;

use super::category_formset::{plan_formset, CategoryPlan};
use crate::core::error::{map_db_error, AppError, Result};
use crate::features::categories::dtos::{
    CategoryFormsetDto, CategoryFormsetResultDto, CategoryListDto, CategoryResponseDto,
    CategoryTreeDto, CreateCategoryDto,
};
use crate::features::categories::models::Category;
use crate::shared::types::{FormErrors, FormOutcome};
use crate::shared::validation::collect_field_errors;

/// Taken by every category writer before it reads the rows it validates
/// against, so the parent graph a formset is checked on is the one it
/// commits over.
const LOCK_CATEGORIES: &str = "LOCK TABLE categories IN SHARE ROW EXCLUSIVE MODE";

async fn fetch_all<'c>(executor: impl PgExecutor<'c>) -> Result<Vec<Category>> {
    let sql = format!("SELECT {} FROM categories ORDER BY name, id", Category::COLUMNS);

    sqlx::query_as::<_, Category>(&sql)
        .fetch_all(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list categories: {:?}", e);
            AppError::Database(e)
        })
}

async fn lock_categories(tx: &mut Transaction<'_, Postgres>) -> Result<()> {
    sqlx::query(LOCK_CATEGORIES)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to lock categories: {:?}", e);
            AppError::Database(e)
        })?;
    Ok(())
}

/// Service for category operations
pub struct CategoryService {
    pool: PgPool,
}

impl CategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All categories, flat and as a tree
    pub async fn list(&self) -> Result<CategoryListDto> {
        let categories = fetch_all(&self.pool).await?;
        let tree = CategoryTreeDto::build_tree(&categories);

        Ok(CategoryListDto {
            categories: categories.into_iter().map(Into::into).collect(),
            tree,
        })
    }

    pub async fn create(&self, dto: CreateCategoryDto) -> Result<FormOutcome<CategoryResponseDto>> {
        let mut errors = FormErrors::new();
        if let Err(e) = dto.validate() {
            collect_field_errors(&e, None, None, &mut errors);
            return Ok(FormOutcome::Invalid(errors));
        }

        let name = dto.name.trim();
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        lock_categories(&mut tx).await?;

        let (name_taken, slug_taken, parent_missing): (bool, bool, bool) = sqlx::query_as(
            r#"
            SELECT
                EXISTS(SELECT 1 FROM categories WHERE name = $1),
                EXISTS(SELECT 1 FROM categories WHERE slug = $2),
                $3::uuid IS NOT NULL AND NOT EXISTS(SELECT 1 FROM categories WHERE id = $3)
            "#,
        )
        .bind(name)
        .bind(&dto.slug)
        .bind(dto.parent_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check category uniqueness: {:?}", e);
            AppError::Database(e)
        })?;

        if name_taken {
            errors.field("name", "Category with this name already exists.");
        }
        if slug_taken {
            errors.field("slug", "Category with this slug already exists.");
        }
        if parent_missing {
            errors.field("parent_id", "Select a valid parent category.");
        }
        if !errors.is_empty() {
            return Ok(FormOutcome::Invalid(errors));
        }

        let sql = format!(
            r#"
            INSERT INTO categories (name, slug, description, logo, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            Category::COLUMNS
        );
        let inserted = sqlx::query_as::<_, Category>(&sql)
            .bind(name)
            .bind(&dto.slug)
            .bind(&dto.description)
            .bind(dto.logo.as_deref().filter(|l| !l.is_empty()))
            .bind(dto.parent_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create category: {:?}", e);
                map_db_error(e)
            });
        let category = match inserted {
            Ok(category) => category,
            Err(e) => return FormOutcome::unique_violation(&e).ok_or(e),
        };
        if let Err(e) = tx.commit().await.map_err(map_db_error) {
            return FormOutcome::unique_violation(&e).ok_or(e);
        }

        tracing::info!("Created category {} ({})", category.name, category.id);
        Ok(FormOutcome::saved(category.into(), "Category created"))
    }

    /// Validate and apply a category formset as one unit
    pub async fn save_formset(
        &self,
        form: CategoryFormsetDto,
    ) -> Result<FormOutcome<CategoryFormsetResultDto>> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        lock_categories(&mut tx).await?;

        let existing = fetch_all(&mut *tx).await?;

        let plan = match plan_formset(&existing, &form) {
            Ok(plan) => plan,
            Err(errors) => {
                tracing::debug!("Category formset rejected: {:?}", errors.messages());
                return Ok(FormOutcome::Invalid(errors));
            }
        };

        let applied = match Self::apply(&mut tx, &plan).await {
            Ok(()) => tx.commit().await.map_err(map_db_error),
            Err(e) => Err(e),
        };
        if let Err(e) = applied {
            tracing::debug!("Category formset lost a uniqueness race: {}", e);
            return FormOutcome::unique_violation(&e).ok_or(e);
        }

        tracing::info!(
            "Category formset saved: {} updated, {} deleted",
            plan.updates.len(),
            plan.deletions.len()
        );

        let categories = fetch_all(&self.pool).await?;
        Ok(FormOutcome::saved(
            CategoryFormsetResultDto {
                updated: plan.updates.len(),
                deleted: plan.deletions.len(),
                categories: categories.into_iter().map(Into::into).collect(),
            },
            "Categories saved",
        ))
    }

    async fn apply(tx: &mut Transaction<'_, Postgres>, plan: &CategoryPlan) -> Result<()> {
        // renames may swap names/slugs between rows
        sqlx::query("SET CONSTRAINTS categories_name_unique, categories_slug_unique DEFERRED")
            .execute(&mut **tx)
            .await
            .map_err(AppError::Database)?;

        if !plan.deletions.is_empty() {
            sqlx::query("DELETE FROM categories WHERE id = ANY($1)")
                .bind(&plan.deletions)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to delete categories: {:?}", e);
                    AppError::Database(e)
                })?;
        }

        for update in &plan.updates {
            sqlx::query(
                r#"
                UPDATE categories
                SET name = $2, slug = $3, description = $4, logo = $5, parent_id = $6,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(update.id)
            .bind(&update.name)
            .bind(&update.slug)
            .bind(&update.description)
            .bind(&update.logo)
            .bind(update.parent_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update category {}: {:?}", update.id, e);
                map_db_error(e)
            })?;
        }

        Ok(())
    }
}
