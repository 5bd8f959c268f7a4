//! Normalized results returned by the facade.
//!
//! Every field is always present. Optional upstream values serialize as `null`;
//! missing text that callers display gets an explicit placeholder instead.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Album placeholder when a provider does not report one.
pub const UNKNOWN_ALBUM: &str = "Unknown album";

/// Artist placeholder when a provider does not report one.
pub const UNKNOWN_ARTIST: &str = "Unknown artist";

/// Reply text when a generative provider answered without usable content.
pub const NO_RESPONSE: &str = "No response";

/// Media platforms supported by the download capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Tiktok,
    Instagram,
}

static YOUTUBE_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|\.)(youtube\.com|youtu\.be)$").expect("valid regex"));
static TIKTOK_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|\.)tiktok\.com$").expect("valid regex"));
static INSTAGRAM_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|\.)(instagram\.com|instagr\.am)$").expect("valid regex"));

/// `link` as an absolute web URL. Links pasted without a scheme get `https://`.
pub fn media_link(link: &str) -> Option<String> {
    let link = link.trim();
    let is_web = |u: &url::Url| matches!(u.scheme(), "http" | "https") && u.has_host();
    if url::Url::parse(link).ok().filter(is_web).is_some() {
        return Some(link.to_string());
    }
    let prefixed = format!("https://{}", link.trim_start_matches('/'));
    url::Url::parse(&prefixed).ok().filter(is_web).map(|_| prefixed)
}

impl Platform {
    /// Platform for a media URL, judged by its host.
    pub fn detect(url: &str) -> Option<Platform> {
        let parsed = url::Url::parse(&media_link(url)?).ok()?;
        let host = parsed.host_str()?;
        if YOUTUBE_HOST.is_match(host) {
            Some(Platform::Youtube)
        } else if TIKTOK_HOST.is_match(host) {
            Some(Platform::Tiktok)
        } else if INSTAGRAM_HOST.is_match(host) {
            Some(Platform::Instagram)
        } else {
            None
        }
    }

    /// Output format used when the caller gives none.
    pub fn default_format(&self) -> &'static str {
        match self {
            Platform::Youtube | Platform::Tiktok => "mp4",
            Platform::Instagram => "auto",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDownload {
    pub platform: Platform,
    pub download_url: String,
    pub title: String,
    pub duration_secs: Option<u64>,
    pub thumbnail: Option<String>,
    pub format: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSearchResult {
    pub title: String,
    pub url: String,
    pub duration_secs: Option<u64>,
    pub author: String,
    pub thumbnail: Option<String>,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_secs: u64,
    pub thumbnail: Option<String>,
    pub preview_url: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub image_url: String,
    pub prompt: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedImage {
    pub source_url: String,
    /// Hosted URL, or a `data:` URL when the provider returns the image inline.
    pub image_url: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub translated_text: String,
    /// Detected source language, `"auto"` when the provider does not say.
    pub source_language: String,
    pub target_language: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortUrl {
    pub original_url: String,
    pub short_url: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    pub temperature: f64,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub description: String,
    /// Wind speed in the provider's unit (m/s for OpenWeatherMap metric, km/h for wttr.in).
    pub wind_speed: Option<f64>,
    /// Upstream payload as received.
    pub raw: Value,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sticker {
    pub url: String,
    pub animated: bool,
}
