use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::core::error::{map_db_error, AppError, Result};

/// A many-to-many relation between videos and categories or authors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoRelation {
    Categories,
    Authors,
}

impl VideoRelation {
    pub fn table(&self) -> &'static str {
        match self {
            VideoRelation::Categories => "video_categories",
            VideoRelation::Authors => "video_authors",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            VideoRelation::Categories => "category_id",
            VideoRelation::Authors => "author_id",
        }
    }
}

/// Give every video in `videos` exactly the links `ids`.
pub async fn replace_video_links(
    tx: &mut Transaction<'_, Postgres>,
    relation: VideoRelation,
    videos: &[Uuid],
    ids: &[Uuid],
) -> Result<()> {
    if videos.is_empty() {
        return Ok(());
    }

    let sql = format!("DELETE FROM {} WHERE video_id = ANY($1)", relation.table());
    sqlx::query(&sql)
        .bind(videos)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

    let sql = format!(
        "INSERT INTO {} (video_id, {}) \
         SELECT DISTINCT v, x FROM UNNEST($1::uuid[]) AS v CROSS JOIN UNNEST($2::uuid[]) AS x",
        relation.table(),
        relation.column()
    );
    sqlx::query(&sql)
        .bind(videos)
        .bind(ids)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to link videos in {}: {:?}", relation.table(), e);
            map_db_error(e)
        })?;

    Ok(())
}
