use async_trait::async_trait;
use feed_rs::model::Feed;
use thiserror::Error;

use crate::core::config::ImportConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large")]
    ResponseTooLarge,
    #[error("Not a valid RSS or Atom feed: {0}")]
    Parse(String),
}

/// Downloads and parses feeds
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Feed, FetchError>;
}

pub fn parse_feed_body(body: &[u8]) -> Result<Feed, FetchError> {
    feed_rs::parser::parse(body).map_err(|e| FetchError::Parse(e.to_string()))
}

/// `reqwest` backed fetcher honouring the import timeout and size limit
pub struct HttpFeedFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFeedFetcher {
    pub fn new(config: &ImportConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_bytes: config.max_feed_bytes,
        })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Feed, FetchError> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(FetchError::ResponseTooLarge);
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::ResponseTooLarge);
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!("Fetched {} bytes from {}", body.len(), url);
        parse_feed_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_is_not_a_feed() {
        let result = parse_feed_body(b"<html><body>hello</body></html>");
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_atom_body_parses() {
        let feed = parse_feed_body(
            br#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom feed</title>
  <id>urn:example</id>
  <updated>2024-01-01T00:00:00Z</updated>
</feed>"#,
        )
        .unwrap();

        assert_eq!(feed.title.unwrap().content, "Atom feed");
    }
}
