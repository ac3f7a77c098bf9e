mod entry;
mod feed_service;
mod feed_url;
mod fetcher;
mod import_job_service;

pub use feed_service::FeedService;
pub use feed_url::{canonical_feed_key, validate_feed_url};
pub use fetcher::HttpFeedFetcher;
pub use import_job_service::ImportJobService;
