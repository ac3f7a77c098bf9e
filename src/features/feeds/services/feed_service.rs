use std::collections::HashSet;
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::entry::{feed_info, video_from_entry, ImportedVideo};
use super::feed_url::{canonical_feed_key, validate_feed_url, video_service_user};
use super::fetcher::{FeedFetcher, FetchError};
use super::import_job_service::ImportJobService;
use crate::core::error::{map_db_error, AppError, Result};
use crate::features::authors::AuthorService;
use crate::features::feeds::dtos::{CreateFeedDto, FeedRegistrationDto, ImportJobResponseDto};
use crate::features::sources::models::{Feed, Source, SourceEntry};
use crate::features::sources::services::union;
use crate::features::videos::models::VideoStatus;
use crate::features::videos::services::{replace_video_links, VideoRelation};

/// Service for feed registration and import
pub struct FeedService {
    pool: PgPool,
    fetcher: Arc<dyn FeedFetcher>,
    jobs: Arc<ImportJobService>,
}

impl FeedService {
    pub fn new(pool: PgPool, fetcher: Arc<dyn FeedFetcher>, jobs: Arc<ImportJobService>) -> Self {
        Self {
            pool,
            fetcher,
            jobs,
        }
    }

    pub async fn import_job(&self, id: Uuid) -> Result<ImportJobResponseDto> {
        Ok(self.jobs.get(id).await?.into())
    }

    async fn known_feed_urls(&self) -> Result<Vec<String>> {
        sqlx::query_scalar("SELECT feed_url FROM feeds")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load feed urls: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Register a feed and queue its first import
    pub async fn register(&self, dto: CreateFeedDto) -> Result<FeedRegistrationDto> {
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let known = self.known_feed_urls().await?;
        let draft = draft_feed(self.fetcher.as_ref(), &known, &dto.feed_url).await?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let sql = format!(
            r#"
            INSERT INTO feeds (name, feed_url, webpage, description, auto_approve,
                               avoid_frontpage, video_service)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            Feed::COLUMNS
        );
        let feed = sqlx::query_as::<_, Feed>(&sql)
            .bind(&draft.name)
            .bind(&draft.feed_url)
            .bind(&draft.webpage)
            .bind(&draft.description)
            .bind(dto.auto_approve)
            .bind(dto.avoid_frontpage)
            .bind(draft.video_service)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create feed: {:?}", e);
                map_db_error(e)
            })?;

        let mut auto_authors = union(&[], &dto.auto_authors);
        if let Some(username) = &draft.service_author {
            let author = AuthorService::get_or_create_in(&mut tx, username).await?;
            auto_authors = union(&auto_authors, &[author]);
        }
        let auto_categories = union(&[], &dto.auto_categories);

        for (table, column, ids) in [
            ("feed_auto_categories", "category_id", &auto_categories),
            ("feed_auto_authors", "author_id", &auto_authors),
        ] {
            let sql = format!(
                "INSERT INTO {} (feed_id, {}) SELECT $1, x FROM UNNEST($2::uuid[]) AS x \
                 ON CONFLICT DO NOTHING",
                table, column
            );
            sqlx::query(&sql)
                .bind(feed.id)
                .bind(ids)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
        }

        let job = ImportJobService::create_in(&mut tx, feed.id).await?;
        tx.commit().await.map_err(map_db_error)?;

        tracing::info!("Feed {} registered ({}), import job {}", feed.id, feed.name, job.id);

        let entry = SourceEntry {
            source: Source::Feed(feed),
            auto_categories,
            auto_authors,
        };
        Ok(FeedRegistrationDto {
            feed: entry.into(),
            import_job: job.into(),
        })
    }

    async fn auto_links(&self, table: &str, column: &str, feed_id: Uuid) -> Result<Vec<Uuid>> {
        let sql = format!("SELECT {} FROM {} WHERE feed_id = $1", column, table);
        sqlx::query_scalar(&sql)
            .bind(feed_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    /// Import the entries of a feed, returning how many videos were created
    pub async fn import_feed(&self, feed_id: Uuid) -> Result<i32> {
        let sql = format!("SELECT {} FROM feeds WHERE id = $1", Feed::COLUMNS);
        let feed = sqlx::query_as::<_, Feed>(&sql)
            .bind(feed_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Feed {} not found", feed_id)))?;

        validate_feed_url(&feed.feed_url).map_err(|e| AppError::BadRequest(e.to_string()))?;
        let parsed = self
            .fetcher
            .fetch(&feed.feed_url)
            .await
            .map_err(|e| AppError::ExternalServiceError(e.to_string()))?;

        let known: Vec<(String, String)> =
            sqlx::query_as("SELECT website_url, file_url FROM videos WHERE feed_id = $1")
                .bind(feed.id)
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::Database)?;
        let known: HashSet<String> = known
            .into_iter()
            .flat_map(|(website, file)| [website, file])
            .filter(|u| !u.is_empty())
            .collect();

        let videos = importable_videos(&parsed, known);

        let categories = self
            .auto_links("feed_auto_categories", "category_id", feed.id)
            .await?;
        let authors = self
            .auto_links("feed_auto_authors", "author_id", feed.id)
            .await?;

        let status = import_status(feed.auto_approve);

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut created = Vec::with_capacity(videos.len());

        for video in &videos {
            let id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO videos (name, description, website_url, file_url, thumbnail_url,
                                    status, feed_id, tags, when_published, when_approved)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9,
                        CASE WHEN $6 = 'active'::video_status THEN NOW() END)
                RETURNING id
                "#,
            )
            .bind(&video.name)
            .bind(&video.description)
            .bind(&video.website_url)
            .bind(&video.file_url)
            .bind(&video.thumbnail_url)
            .bind(status)
            .bind(feed.id)
            .bind(&video.tags)
            .bind(video.when_published)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to store imported video: {:?}", e);
                AppError::Database(e)
            })?;
            created.push(id);
        }

        replace_video_links(&mut tx, VideoRelation::Categories, &created, &categories).await?;
        replace_video_links(&mut tx, VideoRelation::Authors, &created, &authors).await?;

        sqlx::query("UPDATE feeds SET status = 'active', last_updated = NOW() WHERE id = $1")
            .bind(feed.id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!("Imported {} videos from feed {}", created.len(), feed.id);
        Ok(created.len() as i32)
    }
}

/// Feed row to insert for a registered URL
#[derive(Debug, Clone, PartialEq, Eq)]
struct FeedDraft {
    name: String,
    feed_url: String,
    webpage: String,
    description: String,
    video_service: Option<&'static str>,
    /// Username of the service account whose uploads the feed lists
    service_author: Option<String>,
}

/// Check, dedupe against `known_urls`, fetch and describe a feed URL.
async fn draft_feed(
    fetcher: &dyn FeedFetcher,
    known_urls: &[String],
    raw_url: &str,
) -> Result<FeedDraft> {
    let url = validate_feed_url(raw_url).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let feed_url = url.to_string();

    let key = canonical_feed_key(&feed_url);
    if known_urls.iter().any(|known| canonical_feed_key(known) == key) {
        return Err(AppError::BadRequest(
            "A feed with this URL already exists".to_string(),
        ));
    }

    let parsed = fetcher
        .fetch(&feed_url)
        .await
        .map_err(|e| fetch_error(&feed_url, e))?;
    let info = feed_info(&parsed);
    let service_user = video_service_user(&feed_url);

    let name = match &service_user {
        Some(user) => user.username.clone(),
        None => info.title.clone().unwrap_or_else(|| feed_url.clone()),
    };

    Ok(FeedDraft {
        name: name.chars().take(250).collect(),
        webpage: info.webpage,
        description: info.description,
        video_service: service_user.as_ref().map(|u| u.service),
        service_author: service_user.map(|u| u.username),
        feed_url,
    })
}

fn fetch_error(url: &str, e: FetchError) -> AppError {
    match e {
        FetchError::Parse(_) => {
            AppError::BadRequest("URL does not point to an RSS or Atom feed".to_string())
        }
        other => {
            tracing::warn!("Failed to fetch feed {}: {}", url, other);
            AppError::ExternalServiceError(format!("Could not fetch feed: {}", other))
        }
    }
}

fn import_status(auto_approve: bool) -> VideoStatus {
    if auto_approve {
        VideoStatus::Active
    } else {
        VideoStatus::Unapproved
    }
}

/// Videos of `feed` not yet imported, in entry order.
fn importable_videos(feed: &feed_rs::model::Feed, known: HashSet<String>) -> Vec<ImportedVideo> {
    new_videos(feed.entries.iter().filter_map(video_from_entry), known)
}

/// Videos whose website or file URL is not yet known, first occurrence wins.
fn new_videos(
    candidates: impl IntoIterator<Item = ImportedVideo>,
    mut known: HashSet<String>,
) -> Vec<ImportedVideo> {
    let mut fresh = Vec::new();
    for video in candidates {
        let urls = [&video.website_url, &video.file_url];
        if urls.iter().any(|u| !u.is_empty() && known.contains(*u)) {
            continue;
        }
        for url in urls.into_iter().filter(|u| !u.is_empty()) {
            known.insert(url.clone());
        }
        fresh.push(video);
    }
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    use crate::features::feeds::services::fetcher::parse_feed_body;

    const CHANNEL: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Open Video Weekly</title>
    <link>http://example.com/</link>
    <description>Videos about video</description>
    <item>
      <title>Episode 1</title>
      <link>http://example.com/ep1</link>
      <enclosure url="http://example.com/ep1.ogv" length="100" type="video/ogg"/>
    </item>
    <item>
      <title>Episode 2</title>
      <link>http://example.com/ep2</link>
    </item>
    <item>
      <title>No links at all</title>
    </item>
  </channel>
</rss>"#;

    const UNTITLED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><link>http://example.com/</link></channel></rss>"#;

    /// Serves canned bodies by URL, 404 for anything else
    #[derive(Default)]
    struct StaticFetcher {
        bodies: HashMap<String, &'static str>,
    }

    impl StaticFetcher {
        fn serving(url: &str, body: &'static str) -> Self {
            let mut fetcher = Self::default();
            fetcher.bodies.insert(url.to_string(), body);
            fetcher
        }
    }

    #[async_trait]
    impl FeedFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<feed_rs::model::Feed, FetchError> {
            match self.bodies.get(url) {
                Some(body) => parse_feed_body(body.as_bytes()),
                None => Err(FetchError::HttpStatus(404)),
            }
        }
    }

    fn video(website: &str, file: &str) -> ImportedVideo {
        ImportedVideo {
            name: website.to_string(),
            description: String::new(),
            website_url: website.to_string(),
            file_url: file.to_string(),
            thumbnail_url: String::new(),
            when_published: None,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_feed_named_after_its_title() {
        let fetcher = StaticFetcher::serving("http://example.com/feed.rss", CHANNEL);

        let draft = draft_feed(&fetcher, &[], "http://example.com/feed.rss")
            .await
            .unwrap();

        assert_eq!(draft.name, "Open Video Weekly");
        assert_eq!(draft.webpage, "http://example.com/");
        assert_eq!(draft.description, "Videos about video");
        assert_eq!(draft.video_service, None);
        assert_eq!(draft.service_author, None);
    }

    #[tokio::test]
    async fn test_untitled_feed_named_after_url() {
        let fetcher = StaticFetcher::serving("http://example.com/feed.rss", UNTITLED);

        let draft = draft_feed(&fetcher, &[], "http://example.com/feed.rss")
            .await
            .unwrap();

        assert_eq!(draft.name, "http://example.com/feed.rss");
    }

    #[tokio::test]
    async fn test_service_user_feed_named_after_account() {
        let url = "http://www.youtube.com/rss/user/clpprj/videos.rss";
        let fetcher = StaticFetcher::serving(url, CHANNEL);

        let draft = draft_feed(&fetcher, &[], url).await.unwrap();

        assert_eq!(draft.name, "clpprj");
        assert_eq!(draft.video_service, Some("YouTube"));
        assert_eq!(draft.service_author.as_deref(), Some("clpprj"));
    }

    #[tokio::test]
    async fn test_other_shape_of_known_user_feed_is_duplicate() {
        let url = "http://www.youtube.com/rss/user/clpprj/videos.rss";
        let fetcher = StaticFetcher::serving(url, CHANNEL);
        let known = vec!["http://gdata.youtube.com/feeds/base/users/CLPPRJ/uploads".to_string()];

        let err = draft_feed(&fetcher, &known, url).await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("already exists")));
    }

    #[tokio::test]
    async fn test_html_page_is_bad_request() {
        let fetcher = StaticFetcher::serving("http://example.com/", "<html><body>hi</body></html>");

        let err = draft_feed(&fetcher, &[], "http://example.com/").await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("RSS or Atom")));
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_gateway_error() {
        let fetcher = StaticFetcher::default();

        let err = draft_feed(&fetcher, &[], "http://example.com/gone.rss")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ExternalServiceError(_)));
    }

    #[tokio::test]
    async fn test_private_address_never_fetched() {
        let fetcher = StaticFetcher::serving("http://10.0.0.5/feed.rss", CHANNEL);

        let err = draft_feed(&fetcher, &[], "http://10.0.0.5/feed.rss")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_import_status_follows_auto_approve() {
        assert_eq!(import_status(true), VideoStatus::Active);
        assert_eq!(import_status(false), VideoStatus::Unapproved);
    }

    #[test]
    fn test_importable_videos_skip_known_and_linkless_entries() {
        let feed = parse_feed_body(CHANNEL.as_bytes()).unwrap();
        let known = HashSet::from(["http://example.com/ep1.ogv".to_string()]);

        let videos = importable_videos(&feed, known);

        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].name, "Episode 2");
        assert_eq!(videos[0].website_url, "http://example.com/ep2");
    }

    #[test]
    fn test_known_urls_are_skipped() {
        let known = HashSet::from(["http://a/1".to_string(), "http://a/2.mp4".to_string()]);
        let candidates = vec![
            video("http://a/1", ""),
            video("http://a/new", "http://a/2.mp4"),
            video("http://a/3", "http://a/3.mp4"),
        ];

        let fresh = new_videos(candidates, known);
        assert_eq!(fresh, vec![video("http://a/3", "http://a/3.mp4")]);
    }

    #[test]
    fn test_repeated_entries_import_once() {
        let candidates = vec![
            video("http://a/1", ""),
            video("http://a/1", ""),
            video("", "http://a/1.ogv"),
        ];

        let fresh = new_videos(candidates, HashSet::new());
        assert_eq!(fresh.len(), 2);
    }
}
