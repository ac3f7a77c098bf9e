use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Feed};

const VIDEO_EXTENSIONS: &[&str] = &[
    ".mov", ".wmv", ".mp4", ".m4v", ".ogg", ".ogv", ".anx", ".mpg", ".avi", ".flv", ".mpeg",
    ".divx", ".xvid", ".rmvb", ".mkv", ".m2v", ".ogm",
];

const APPLICATION_VIDEO_TYPES: &[&str] = &[
    "application/ogg",
    "application/x-annodex",
    "application/x-bittorrent",
    "application/x-shockwave-flash",
];

pub fn is_video_type(mime: &str) -> bool {
    let mime = mime.trim().to_ascii_lowercase();
    mime.starts_with("video/")
        || mime.starts_with("audio/")
        || APPLICATION_VIDEO_TYPES.contains(&mime.as_str())
}

pub fn is_video_filename(name: &str) -> bool {
    // query strings don't count towards the extension
    let lower = name.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// A video ready to be stored from one feed entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedVideo {
    pub name: String,
    pub description: String,
    pub website_url: String,
    pub file_url: String,
    pub thumbnail_url: String,
    pub when_published: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

/// Feed-level metadata used when registering a feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedInfo {
    pub title: Option<String>,
    pub webpage: String,
    pub description: String,
}

pub fn feed_info(feed: &Feed) -> FeedInfo {
    FeedInfo {
        title: feed
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty()),
        webpage: feed
            .links
            .iter()
            .find(|l| l.rel.as_deref() != Some("self"))
            .map(|l| l.href.clone())
            .unwrap_or_default(),
        description: feed
            .description
            .as_ref()
            .map(|d| d.content.clone())
            .unwrap_or_default(),
    }
}

/// First video enclosure of `entry`, media content before enclosure links.
pub fn video_enclosure(entry: &Entry) -> Option<String> {
    let media = entry.media.iter().flat_map(|m| m.content.iter()).find_map(|c| {
        let url = c.url.as_ref()?.to_string();
        let typed = c
            .content_type
            .as_ref()
            .is_some_and(|t| is_video_type(&t.to_string()));
        (typed || is_video_filename(&url)).then_some(url)
    });

    media.or_else(|| {
        entry
            .links
            .iter()
            .filter(|l| l.rel.as_deref() == Some("enclosure"))
            .find(|l| {
                l.media_type.as_deref().is_some_and(is_video_type) || is_video_filename(&l.href)
            })
            .map(|l| l.href.clone())
    })
}

/// The video an entry describes, `None` when it has neither a video
/// enclosure nor a link.
pub fn video_from_entry(entry: &Entry) -> Option<ImportedVideo> {
    let file_url = video_enclosure(entry).unwrap_or_default();
    let website_url = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
        .map(|l| l.href.clone())
        .unwrap_or_default();

    if file_url.is_empty() && website_url.is_empty() {
        return None;
    }

    let name = entry
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    let description = entry
        .summary
        .as_ref()
        .map(|s| s.content.clone())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
        .or_else(|| {
            entry
                .media
                .iter()
                .find_map(|m| m.description.as_ref().map(|d| d.content.clone()))
        })
        .unwrap_or_default();

    let thumbnail_url = entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.clone())
        .next()
        .unwrap_or_default();

    let mut tags: Vec<String> = Vec::new();
    for term in entry.categories.iter().map(|c| c.term.trim()) {
        if !term.is_empty() && !tags.iter().any(|t| t == term) {
            tags.push(term.to_string());
        }
    }

    Some(ImportedVideo {
        name: name.chars().take(250).collect(),
        description,
        website_url,
        file_url,
        thumbnail_url,
        when_published: entry.published.or(entry.updated),
        tags,
    })
}
