use std::collections::HashSet;

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::video_formset::{plan_bulk_edit, plan_video_edit, VideoPlan, VideoUpdate};
use super::video_links::{replace_video_links, VideoRelation};
use super::video_listing::{VideoFilter, VideoSortKey, VIDEO_SORT_DEFS};
use crate::core::error::{map_db_error, AppError, Result};
use crate::features::videos::dtos::{
    ApproveQueueDto, VideoBulkAction, VideoEditDto, VideoFormsetDto, VideoFormsetResultDto,
    VideoResponseDto,
};
use crate::features::videos::models::{Video, VideoStatus};
use crate::shared::constants::{APPROVE_QUEUE_PAGE_SIZE, BULK_EDIT_PAGE_SIZE};
use crate::shared::pagination::{PageLinks, PageWindow, Paginator};
use crate::shared::query::QueryParams;
use crate::shared::sorting::SortHeaders;
use crate::shared::types::{FormOutcome, Listing};

const QUEUE_ORDER: &str = " ORDER BY v.when_submitted, v.when_published NULLS LAST, v.id";

/// Moderation state changes applied to one or many videos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moderation {
    Approve,
    /// Approve and feature in one step
    ApproveFeatured,
    Reject,
    Unapprove,
    Feature,
    Unfeature,
}

impl Moderation {
    fn update_sql(&self) -> &'static str {
        match self {
            Moderation::Approve => {
                "UPDATE videos SET status = 'active', when_approved = NOW() WHERE id = ANY($1)"
            }
            Moderation::ApproveFeatured => {
                "UPDATE videos SET status = 'active', when_approved = NOW(), last_featured = NOW() \
                 WHERE id = ANY($1)"
            }
            Moderation::Reject => "UPDATE videos SET status = 'rejected' WHERE id = ANY($1)",
            Moderation::Unapprove => "UPDATE videos SET status = 'unapproved' WHERE id = ANY($1)",
            Moderation::Feature => {
                "UPDATE videos SET status = 'active', \
                 when_approved = COALESCE(when_approved, NOW()), last_featured = NOW() \
                 WHERE id = ANY($1)"
            }
            Moderation::Unfeature => "UPDATE videos SET last_featured = NULL WHERE id = ANY($1)",
        }
    }
}

impl From<VideoBulkAction> for Moderation {
    fn from(action: VideoBulkAction) -> Self {
        match action {
            VideoBulkAction::Delete => Moderation::Reject,
            VideoBulkAction::Approve => Moderation::Approve,
            VideoBulkAction::Unapprove => Moderation::Unapprove,
            VideoBulkAction::Feature => Moderation::Feature,
            VideoBulkAction::Unfeature => Moderation::Unfeature,
        }
    }
}

/// Service for video moderation and bulk editing
pub struct VideoService {
    pool: PgPool,
}

impl VideoService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Video> {
        let sql = format!("{} WHERE v.id = $1", Video::SELECT);
        sqlx::query_as::<_, Video>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch video {}: {:?}", id, e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }

    async fn count_unapproved(&self) -> Result<usize> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE status = $1")
            .bind(VideoStatus::Unapproved)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(total as usize)
    }

    async fn queue_window(&self, page: Option<&str>) -> Result<PageWindow> {
        let total = self.count_unapproved().await?;
        Ok(Paginator::new(total, APPROVE_QUEUE_PAGE_SIZE).page(page))
    }

    async fn queue_page(&self, window: &PageWindow) -> Result<Vec<Video>> {
        let sql = format!(
            "{} WHERE v.status = $1{} LIMIT $2 OFFSET $3",
            Video::SELECT,
            QUEUE_ORDER
        );
        sqlx::query_as::<_, Video>(&sql)
            .bind(VideoStatus::Unapproved)
            .bind(window.limit())
            .bind(window.sql_offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load approve queue: {:?}", e);
                AppError::Database(e)
            })
    }

    /// One page of unapproved videos, oldest submission first
    pub async fn approve_queue(&self, params: &QueryParams) -> Result<ApproveQueueDto> {
        let window = self.queue_window(params.get("page")).await?;
        let videos = self.queue_page(&window).await?;

        let items: Vec<VideoResponseDto> = videos.into_iter().map(Into::into).collect();
        Ok(ApproveQueueDto {
            current_video: items.first().cloned(),
            items,
            links: PageLinks::for_window(params, &window),
            page: window,
        })
    }

    /// Every unapproved video, for the clear-all confirmation
    pub async fn unapproved(&self) -> Result<Vec<Video>> {
        let sql = format!("{} WHERE v.status = $1{}", Video::SELECT, QUEUE_ORDER);
        sqlx::query_as::<_, Video>(&sql)
            .bind(VideoStatus::Unapproved)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list unapproved videos: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn moderate_many(&self, ids: &[Uuid], action: Moderation) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(action.update_sql())
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to apply {:?} to {} videos: {:?}", action, ids.len(), e);
                AppError::Database(e)
            })?;
        Ok(result.rows_affected())
    }

    /// Apply `action` to one video and return its new state
    pub async fn moderate(&self, id: Uuid, action: Moderation) -> Result<Video> {
        if self.moderate_many(&[id], action).await? == 0 {
            return Err(AppError::NotFound(format!("Video {} not found", id)));
        }
        tracing::info!("Video {} moderated: {:?}", id, action);
        self.get(id).await
    }

    /// Apply `action` to the videos shown on one page of the queue
    pub async fn moderate_queue_page(&self, page: Option<&str>, action: Moderation) -> Result<u64> {
        let window = self.queue_window(page).await?;
        let ids: Vec<Uuid> = self.queue_page(&window).await?.iter().map(|v| v.id).collect();

        let affected = self.moderate_many(&ids, action).await?;
        tracing::info!(
            "Queue page {} moderated: {:?} on {} videos",
            window.number,
            action,
            affected
        );
        Ok(affected)
    }

    /// Reject every unapproved video
    pub async fn clear_queue(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE videos SET status = 'rejected' WHERE status = 'unapproved'")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to clear approve queue: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!("Approve queue cleared: {} videos rejected", result.rows_affected());
        Ok(result.rows_affected())
    }

    /// Sorted, filtered, paginated bulk edit listing
    pub async fn bulk_edit_listing(&self, params: &QueryParams) -> Result<Listing<VideoResponseDto>> {
        let sort = SortHeaders::new(VIDEO_SORT_DEFS, params.get("sort"), None);
        let key = VideoSortKey::from_headers(&sort);
        let filter = VideoFilter::from_params(params);

        let total: i64 = filter
            .count_query()
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count bulk edit videos: {:?}", e);
                AppError::Database(e)
            })?;

        let window = Paginator::new(total as usize, BULK_EDIT_PAGE_SIZE).page(params.get("page"));
        let videos: Vec<Video> = filter
            .page_query(key, sort.is_descending(), &window)
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list bulk edit videos: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(Listing {
            items: videos.into_iter().map(Into::into).collect(),
            links: PageLinks::for_window(params, &window),
            page: window,
            headers: sort.headers(params),
            sort: sort.order_by(),
            filters: filter
                .to_pairs()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        })
    }

    async fn ids_of(&self, sql: &str, ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        let found: Vec<Uuid> = sqlx::query_scalar(sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(found.into_iter().collect())
    }

    /// Validate and apply the bulk edit formset as one unit
    pub async fn save_formset(
        &self,
        form: VideoFormsetDto,
    ) -> Result<FormOutcome<VideoFormsetResultDto>> {
        let row_ids: Vec<Uuid> = form.rows.iter().map(|r| r.id).collect();
        let mut category_ids: Vec<Uuid> = form.bulk.categories.clone();
        let mut author_ids: Vec<Uuid> = form.bulk.authors.clone().unwrap_or_default();
        for row in &form.rows {
            category_ids.extend(&row.categories);
            author_ids.extend(&row.authors);
        }

        let existing = self.ids_of("SELECT id FROM videos WHERE id = ANY($1)", &row_ids).await?;
        let categories = self
            .ids_of("SELECT id FROM categories WHERE id = ANY($1)", &category_ids)
            .await?;
        let authors = self
            .ids_of("SELECT id FROM authors WHERE id = ANY($1)", &author_ids)
            .await?;

        let plan = match plan_bulk_edit(&existing, &categories, &authors, &form) {
            Ok(plan) => plan,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };

        let result = self.apply(&plan).await?;
        tracing::info!(
            "Bulk edit saved: {} updated, {} rejected, {:?} on {}",
            result.updated,
            result.rejected,
            result.bulk_action,
            result.bulk_affected
        );

        Ok(FormOutcome::saved(result, "Videos saved"))
    }

    /// Edit one video's fields and attribution
    pub async fn edit(&self, id: Uuid, edit: VideoEditDto) -> Result<FormOutcome<VideoResponseDto>> {
        let video = self.get(id).await?;
        let category_ids = edit.categories.as_ref().unwrap_or(&video.categories);
        let author_ids = edit.authors.as_ref().unwrap_or(&video.authors);

        let categories = self
            .ids_of("SELECT id FROM categories WHERE id = ANY($1)", category_ids)
            .await?;
        let authors = self
            .ids_of("SELECT id FROM authors WHERE id = ANY($1)", author_ids)
            .await?;

        let update = match plan_video_edit(&video, &categories, &authors, &edit) {
            Ok(update) => update,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        Self::update_video(&mut tx, &update).await?;
        tx.commit().await.map_err(map_db_error)?;

        tracing::info!("Video {} edited", id);
        let video = self.get(id).await?;
        Ok(FormOutcome::saved(video.into(), "Video saved"))
    }

    async fn apply(&self, plan: &VideoPlan) -> Result<VideoFormsetResultDto> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        if !plan.rejections.is_empty() {
            sqlx::query(Moderation::Reject.update_sql())
                .bind(&plan.rejections)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }

        for update in &plan.updates {
            Self::update_video(&mut tx, update).await?;
        }

        let mut bulk_affected = 0;
        if let Some((action, ids)) = &plan.action {
            if !ids.is_empty() {
                sqlx::query(Moderation::from(*action).update_sql())
                    .bind(ids)
                    .execute(&mut *tx)
                    .await
                    .map_err(AppError::Database)?;
                bulk_affected = ids.len();
            }
        }

        tx.commit().await.map_err(AppError::Database)?;

        Ok(VideoFormsetResultDto {
            updated: plan.updates.len(),
            rejected: plan.rejections.len(),
            bulk_action: plan.action.as_ref().map(|(action, _)| *action),
            bulk_affected,
        })
    }

    async fn update_video(
        tx: &mut Transaction<'_, Postgres>,
        update: &VideoUpdate,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE videos
            SET name = $2, description = $3, website_url = $4, file_url = $5,
                embed_code = $6, thumbnail_url = $7, when_published = $8, tags = $9
            WHERE id = $1
            "#,
        )
        .bind(update.id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.website_url)
        .bind(&update.file_url)
        .bind(&update.embed_code)
        .bind(&update.thumbnail_url)
        .bind(update.when_published)
        .bind(&update.tags)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update video {}: {:?}", update.id, e);
            AppError::Database(e)
        })?;

        replace_video_links(tx, VideoRelation::Categories, &[update.id], &update.categories).await?;
        replace_video_links(tx, VideoRelation::Authors, &[update.id], &update.authors).await?;
        Ok(())
    }
}
