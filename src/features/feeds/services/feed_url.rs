//! Feed URL rules: what may be registered, which URLs name the same feed,
//! and which ones are a video service user's uploads.

use std::net::IpAddr;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FeedUrlError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("Private IP address not allowed: {0}")]
    PrivateIp(String),
    #[error("Localhost not allowed")]
    Localhost,
}

/// Parse a feed URL, refusing anything that is not public http(s).
pub fn validate_feed_url(raw: &str) -> Result<Url, FeedUrlError> {
    let url = Url::parse(raw.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(FeedUrlError::UnsupportedScheme(scheme.to_owned())),
    }

    if let Some(host) = url.host_str() {
        if host.eq_ignore_ascii_case("localhost") {
            return Err(FeedUrlError::Localhost);
        }

        let bare = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        if let Ok(ip) = bare.parse::<IpAddr>() {
            if ip.is_loopback() {
                return Err(FeedUrlError::Localhost);
            }
            if is_private_ip(&ip) {
                return Err(FeedUrlError::PrivateIp(ip.to_string()));
            }
        }
    }

    Ok(url)
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            if v6.is_loopback() || v6.is_unspecified() {
                return true;
            }
            let first = v6.segments()[0];
            // fc00::/7 unique local, fe80::/10 link local
            (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
        }
    }
}

/// A feed that is one account's uploads on a video service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUser {
    pub service: &'static str,
    pub username: String,
}

lazy_static! {
    static ref SERVICE_USER_PATTERNS: Vec<(&'static str, Regex)> = vec![
        (
            "YouTube",
            Regex::new(r"(?i)^https?://gdata\.youtube\.com/feeds/(?:base|api)/users/([^/?#]+)/uploads")
                .unwrap(),
        ),
        (
            "YouTube",
            Regex::new(r"(?i)^https?://(?:www\.)?youtube\.com/rss/user/([^/?#]+)/videos\.rss").unwrap(),
        ),
        (
            "Vimeo",
            Regex::new(r"(?i)^https?://(?:www\.)?vimeo\.com/([^/?#]+)/videos/rss").unwrap(),
        ),
    ];
}

pub fn video_service_user(url: &str) -> Option<ServiceUser> {
    let url = url.trim();
    SERVICE_USER_PATTERNS.iter().find_map(|(service, pattern)| {
        pattern.captures(url).map(|caps| ServiceUser {
            service: *service,
            username: caps[1].to_string(),
        })
    })
}

/// Key under which two URLs are the same feed.
///
/// Service user feeds reduce to service and lowercased username whatever the
/// URL shape; other URLs drop the fragment and a trailing slash.
pub fn canonical_feed_key(url: &str) -> String {
    if let Some(user) = video_service_user(url) {
        return format!(
            "{}:user:{}",
            user.service.to_lowercase(),
            user.username.to_lowercase()
        );
    }

    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.as_str().trim_end_matches('/').to_string()
        }
        Err(_) => url.trim().to_string(),
    }
}
