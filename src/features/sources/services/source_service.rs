use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use super::attribution::videos_to_reattribute;
use super::source_formset::{plan_feed_edit, plan_formset, AttributionChange, SourcePlan};
use super::source_listing::{
    filter_sources, sort_sources, SourceFilter, SourceSortKey, SOURCE_SORT_DEFS,
};
use crate::core::error::{map_db_error, AppError, Result};
use crate::features::sources::dtos::{
    CreateSavedSearchDto, FeedEditDto, SourceFormsetDto, SourceFormsetResultDto, SourceResponseDto,
};
use crate::features::sources::models::{Feed, SavedSearch, Source, SourceEntry, SourceId};
use crate::shared::constants::SOURCES_PAGE_SIZE;
use crate::shared::pagination::{paginate_slice, PageLinks, Paginator};
use crate::shared::query::QueryParams;
use crate::shared::sorting::SortHeaders;
use crate::shared::types::{FormErrors, FormOutcome, Listing};
use crate::features::videos::services::{replace_video_links, VideoRelation};
use crate::shared::validation::collect_field_errors;

/// Tables holding one source kind and its auto-attribution
struct SourceTables {
    table: &'static str,
    auto_categories: &'static str,
    auto_authors: &'static str,
    /// Column naming the source in the auto tables and on `videos`
    column: &'static str,
}

const FEED_TABLES: SourceTables = SourceTables {
    table: "feeds",
    auto_categories: "feed_auto_categories",
    auto_authors: "feed_auto_authors",
    column: "feed_id",
};

const SEARCH_TABLES: SourceTables = SourceTables {
    table: "saved_searches",
    auto_categories: "saved_search_auto_categories",
    auto_authors: "saved_search_auto_authors",
    column: "search_id",
};

fn tables(id: SourceId) -> &'static SourceTables {
    match id {
        SourceId::Feed(_) => &FEED_TABLES,
        SourceId::Search(_) => &SEARCH_TABLES,
    }
}

/// Taken by formset saves before reading the sources they validate against
const LOCK_SOURCES: &str = "LOCK TABLE feeds, saved_searches IN SHARE ROW EXCLUSIVE MODE";

/// Service for feeds and saved searches as video sources
pub struct SourceService {
    pool: PgPool,
}

impl SourceService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn links(
        conn: &mut PgConnection,
        table: &str,
        column: &str,
        target: &str,
    ) -> Result<HashMap<Uuid, Vec<Uuid>>> {
        let sql = format!("SELECT {}, {} FROM {} ORDER BY 1, 2", column, target, table);
        let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load {}: {:?}", table, e);
                AppError::Database(e)
            })?;

        let mut grouped: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (source, target) in rows {
            grouped.entry(source).or_default().push(target);
        }
        Ok(grouped)
    }

    /// Every feed and saved search with its auto sets
    async fn load_entries(conn: &mut PgConnection) -> Result<Vec<SourceEntry>> {
        let feeds = sqlx::query_as::<_, Feed>(&format!("SELECT {} FROM feeds", Feed::COLUMNS))
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list feeds: {:?}", e);
                AppError::Database(e)
            })?;

        let searches = sqlx::query_as::<_, SavedSearch>(
            "SELECT id, query_string, auto_approve, created_at FROM saved_searches",
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list saved searches: {:?}", e);
            AppError::Database(e)
        })?;

        let mut feed_categories =
            Self::links(conn, "feed_auto_categories", "feed_id", "category_id").await?;
        let mut feed_authors =
            Self::links(conn, "feed_auto_authors", "feed_id", "author_id").await?;
        let mut search_categories =
            Self::links(conn, "saved_search_auto_categories", "search_id", "category_id").await?;
        let mut search_authors =
            Self::links(conn, "saved_search_auto_authors", "search_id", "author_id").await?;

        let feeds = feeds.into_iter().map(|feed| SourceEntry {
            auto_categories: feed_categories.remove(&feed.id).unwrap_or_default(),
            auto_authors: feed_authors.remove(&feed.id).unwrap_or_default(),
            source: Source::Feed(feed),
        });
        let searches = searches.into_iter().map(|search| SourceEntry {
            auto_categories: search_categories.remove(&search.id).unwrap_or_default(),
            auto_authors: search_authors.remove(&search.id).unwrap_or_default(),
            source: Source::Search(search),
        });

        Ok(feeds.chain(searches).collect())
    }

    /// Sorted, filtered, paginated source manager listing
    pub async fn list(&self, params: &QueryParams) -> Result<Listing<SourceResponseDto>> {
        let sort = SortHeaders::new(SOURCE_SORT_DEFS, params.get("sort"), None);
        let filter = SourceFilter::parse(params.get("filter"));
        let q = params.get_non_empty("q");

        let mut conn = self.pool.acquire().await.map_err(AppError::Database)?;
        let mut entries = filter_sources(Self::load_entries(&mut conn).await?, filter, q);
        sort_sources(
            &mut entries,
            SourceSortKey::from_headers(&sort),
            sort.is_descending(),
        );

        let window = Paginator::new(entries.len(), SOURCES_PAGE_SIZE).page(params.get("page"));
        let items = paginate_slice(entries, &window)
            .into_iter()
            .map(Into::into)
            .collect();

        let mut filters = BTreeMap::new();
        if let Some(filter) = filter {
            filters.insert("filter".to_string(), filter.as_str().to_string());
        }
        if let Some(q) = q {
            filters.insert("q".to_string(), q.to_string());
        }

        Ok(Listing {
            items,
            links: PageLinks::for_window(params, &window),
            page: window,
            headers: sort.headers(params),
            sort: sort.order_by(),
            filters,
        })
    }

    async fn ids_of(conn: &mut PgConnection, table: &str) -> Result<HashSet<Uuid>> {
        let sql = format!("SELECT id FROM {}", table);
        let ids: Vec<Uuid> = sqlx::query_scalar(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(AppError::Database)?;
        Ok(ids.into_iter().collect())
    }

    /// Validate and apply the source formset as one unit
    pub async fn save_formset(
        &self,
        form: SourceFormsetDto,
    ) -> Result<FormOutcome<SourceFormsetResultDto>> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query(LOCK_SOURCES)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to lock sources: {:?}", e);
                AppError::Database(e)
            })?;

        let entries = Self::load_entries(&mut tx).await?;
        let categories = Self::ids_of(&mut tx, "categories").await?;
        let authors = Self::ids_of(&mut tx, "authors").await?;

        let plan = match plan_formset(&entries, &categories, &authors, &form) {
            Ok(plan) => plan,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };

        let applied = match Self::apply(&mut tx, &plan).await {
            Ok(result) => tx.commit().await.map_err(map_db_error).map(|_| result),
            Err(e) => Err(e),
        };
        let result = match applied {
            Ok(result) => result,
            Err(e) => return FormOutcome::unique_violation(&e).ok_or(e),
        };

        tracing::info!(
            "Source formset saved: {} updated, {} removed, {} videos deleted, {} re-attributed",
            result.updated,
            result.removed,
            result.videos_deleted,
            result.videos_reattributed
        );

        Ok(FormOutcome::saved(result, "Sources saved"))
    }

    /// Inline edit of one feed's name or auto sets
    pub async fn edit_feed(
        &self,
        id: Uuid,
        edit: FeedEditDto,
    ) -> Result<FormOutcome<SourceResponseDto>> {
        let source = SourceId::Feed(id);
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query(LOCK_SOURCES)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let entries = Self::load_entries(&mut tx).await?;
        let entry = entries
            .iter()
            .find(|e| e.source.id() == source)
            .ok_or_else(|| AppError::NotFound(format!("Feed {} not found", id)))?;
        let categories = Self::ids_of(&mut tx, "categories").await?;
        let authors = Self::ids_of(&mut tx, "authors").await?;

        let plan = match plan_feed_edit(entry, &categories, &authors, &edit) {
            Ok(plan) => plan,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };

        let result = Self::apply(&mut tx, &plan).await?;
        let edited = Self::load_entries(&mut tx)
            .await?
            .into_iter()
            .find(|e| e.source.id() == source)
            .ok_or_else(|| AppError::NotFound(format!("Feed {} not found", id)))?;
        tx.commit().await.map_err(map_db_error)?;

        tracing::info!(
            "Feed {} edited: {} videos re-attributed",
            id,
            result.videos_reattributed
        );
        Ok(FormOutcome::saved(edited.into(), "Feed saved"))
    }

    async fn apply(
        tx: &mut Transaction<'_, Postgres>,
        plan: &SourcePlan,
    ) -> Result<SourceFormsetResultDto> {
        let mut videos_deleted = 0;
        let mut videos_reattributed = 0;

        // feeds may swap URLs between rows
        sqlx::query("SET CONSTRAINTS feeds_feed_url_unique DEFERRED")
            .execute(&mut **tx)
            .await
            .map_err(AppError::Database)?;

        for &source in &plan.removals {
            let t = tables(source);
            if !plan.keep_videos {
                let sql = format!("DELETE FROM videos WHERE {} = $1", t.column);
                videos_deleted += sqlx::query(&sql)
                    .bind(source.uuid())
                    .execute(&mut **tx)
                    .await
                    .map_err(AppError::Database)?
                    .rows_affected();
            }
            // remaining videos are detached by ON DELETE SET NULL
            let sql = format!("DELETE FROM {} WHERE id = $1", t.table);
            sqlx::query(&sql)
                .bind(source.uuid())
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to remove source {}: {:?}", source, e);
                    AppError::Database(e)
                })?;
        }

        for update in &plan.feed_updates {
            sqlx::query(
                r#"
                UPDATE feeds SET name = $2, feed_url = $3, webpage = $4
                WHERE id = $1
                "#,
            )
            .bind(update.id)
            .bind(&update.name)
            .bind(&update.feed_url)
            .bind(&update.webpage)
            .execute(&mut **tx)
            .await
            .map_err(map_db_error)?;
        }

        for (id, query_string) in &plan.search_updates {
            sqlx::query("UPDATE saved_searches SET query_string = $2 WHERE id = $1")
                .bind(id)
                .bind(query_string)
                .execute(&mut **tx)
                .await
                .map_err(AppError::Database)?;
        }

        for change in &plan.attribution {
            videos_reattributed += Self::apply_attribution(tx, change).await?;
        }

        Ok(SourceFormsetResultDto {
            updated: plan.feed_updates.len() + plan.search_updates.len(),
            removed: plan.removals.len(),
            videos_deleted,
            videos_reattributed,
        })
    }

    async fn apply_attribution(
        tx: &mut Transaction<'_, Postgres>,
        change: &AttributionChange,
    ) -> Result<u64> {
        let t = tables(change.source);
        let id = change.source.uuid();

        if let Some(auto_approve) = change.auto_approve {
            let sql = format!("UPDATE {} SET auto_approve = $2 WHERE id = $1", t.table);
            sqlx::query(&sql)
                .bind(id)
                .bind(auto_approve)
                .execute(&mut **tx)
                .await
                .map_err(AppError::Database)?;
        }

        let mut touched = 0;
        for (relation, auto_table, old, new) in [
            (
                VideoRelation::Categories,
                t.auto_categories,
                &change.old_categories,
                &change.new_categories,
            ),
            (
                VideoRelation::Authors,
                t.auto_authors,
                &change.old_authors,
                &change.new_authors,
            ),
        ] {
            let new_set: BTreeSet<Uuid> = new.iter().copied().collect();
            if *old == new_set {
                continue;
            }

            let sql = format!(
                r#"
                SELECT v.id, COALESCE(array_agg(r.{col}) FILTER (WHERE r.{col} IS NOT NULL), '{{}}')
                FROM videos v
                LEFT JOIN {rel} r ON r.video_id = v.id
                WHERE v.{source} = $1
                GROUP BY v.id
                "#,
                col = relation.column(),
                rel = relation.table(),
                source = t.column,
            );
            let videos: Vec<(Uuid, Vec<Uuid>)> = sqlx::query_as(&sql)
                .bind(id)
                .fetch_all(&mut **tx)
                .await
                .map_err(AppError::Database)?;

            let follow = videos_to_reattribute(&videos, old, &new_set);
            if !follow.is_empty() {
                replace_video_links(tx, relation, &follow, new).await?;
                touched += follow.len() as u64;
            }

            let sql = format!("DELETE FROM {} WHERE {} = $1", auto_table, t.column);
            sqlx::query(&sql)
                .bind(id)
                .execute(&mut **tx)
                .await
                .map_err(AppError::Database)?;

            let sql = format!(
                "INSERT INTO {} ({}, {}) SELECT $1, x FROM UNNEST($2::uuid[]) AS x",
                auto_table, t.column, relation.column()
            );
            sqlx::query(&sql)
                .bind(id)
                .bind(new)
                .execute(&mut **tx)
                .await
                .map_err(map_db_error)?;
        }

        Ok(touched)
    }

    /// Toggle `auto_approve` on one source
    pub async fn set_auto_approve(&self, source: SourceId, enabled: bool) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET auto_approve = $2 WHERE id = $1",
            tables(source).table
        );
        let result = sqlx::query(&sql)
            .bind(source.uuid())
            .bind(enabled)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to set auto approve on {}: {:?}", source, e);
                AppError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Source {} not found", source)));
        }

        tracing::info!("Auto approve {} for {}", if enabled { "enabled" } else { "disabled" }, source);
        Ok(())
    }

    pub async fn create_search(
        &self,
        dto: CreateSavedSearchDto,
    ) -> Result<FormOutcome<SourceResponseDto>> {
        if let Err(e) = dto.validate() {
            let mut errors = FormErrors::new();
            collect_field_errors(&e, None, None, &mut errors);
            return Ok(FormOutcome::Invalid(errors));
        }

        let search = sqlx::query_as::<_, SavedSearch>(
            r#"
            INSERT INTO saved_searches (query_string, auto_approve)
            VALUES ($1, $2)
            RETURNING id, query_string, auto_approve, created_at
            "#,
        )
        .bind(dto.query_string.trim())
        .bind(dto.auto_approve)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create saved search: {:?}", e);
            AppError::Database(e)
        })?;

        let entry = SourceEntry {
            source: Source::Search(search),
            auto_categories: Vec::new(),
            auto_authors: Vec::new(),
        };
        Ok(FormOutcome::saved(entry.into(), "Saved search added"))
    }
}
