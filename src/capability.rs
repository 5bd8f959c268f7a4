//! Capabilities and the per-call request handed to provider chains.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One user-facing function offered by the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    YoutubeDownload,
    TiktokDownload,
    InstagramDownload,
    VideoSearch,
    MusicSearch,
    Chat,
    TextToImage,
    RemoveBackground,
    UpscaleImage,
    Translate,
    ShortenUrl,
    Weather,
    TextSticker,
}

impl Capability {
    pub const ALL: [Capability; 13] = [
        Capability::YoutubeDownload,
        Capability::TiktokDownload,
        Capability::InstagramDownload,
        Capability::VideoSearch,
        Capability::MusicSearch,
        Capability::Chat,
        Capability::TextToImage,
        Capability::RemoveBackground,
        Capability::UpscaleImage,
        Capability::Translate,
        Capability::ShortenUrl,
        Capability::Weather,
        Capability::TextSticker,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Capability::YoutubeDownload => "youtube-download",
            Capability::TiktokDownload => "tiktok-download",
            Capability::InstagramDownload => "instagram-download",
            Capability::VideoSearch => "video-search",
            Capability::MusicSearch => "music-search",
            Capability::Chat => "chat",
            Capability::TextToImage => "text-to-image",
            Capability::RemoveBackground => "remove-background",
            Capability::UpscaleImage => "upscale-image",
            Capability::Translate => "translate",
            Capability::ShortenUrl => "shorten-url",
            Capability::Weather => "weather",
            Capability::TextSticker => "text-sticker",
        }
    }

    /// Parameters that must be present and non-empty before any network call.
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            Capability::YoutubeDownload
            | Capability::TiktokDownload
            | Capability::InstagramDownload
            | Capability::ShortenUrl => &["url"],
            Capability::VideoSearch | Capability::MusicSearch => &["query"],
            Capability::Chat | Capability::TextToImage => &["prompt"],
            Capability::RemoveBackground | Capability::UpscaleImage => &["image_url"],
            Capability::Translate | Capability::TextSticker => &["text"],
            Capability::Weather => &["city"],
        }
    }

    fn missing_message(&self, param: &str) -> String {
        match (self, param) {
            (Capability::YoutubeDownload, "url") => "You need to provide a YouTube URL!".into(),
            (Capability::TiktokDownload, "url") => "You need to provide a TikTok URL!".into(),
            (Capability::InstagramDownload, "url") => "You need to provide an Instagram URL!".into(),
            (Capability::VideoSearch | Capability::MusicSearch, "query") => {
                "You need to provide a search term!".into()
            }
            (Capability::TextToImage, "prompt") => "You need to provide a description!".into(),
            (Capability::Chat, "prompt") | (Capability::TextSticker, "text") => {
                "You need to provide a text!".into()
            }
            (Capability::Translate, "text") => "You need to provide a text to translate!".into(),
            (Capability::RemoveBackground | Capability::UpscaleImage, "image_url") => {
                "You need to provide an image URL!".into()
            }
            (Capability::ShortenUrl, "url") => "You need to provide a URL!".into(),
            (Capability::Weather, "city") => "You need to provide a city name!".into(),
            _ => format!("'{}' is required for {}", param, self.name()),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named string parameters for one capability call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityRequest {
    pub capability: Capability,
    params: BTreeMap<String, String>,
    /// Format, quality or language hint; meaning depends on the capability.
    pub hint: Option<String>,
}

impl CapabilityRequest {
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            params: BTreeMap::new(),
            hint: None,
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_hint(mut self, hint: Option<impl Into<String>>) -> Self {
        self.hint = hint.map(Into::into).filter(|h: &String| !h.trim().is_empty());
        self
    }

    /// Trimmed parameter value; blank values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Trimmed parameter value or an `InvalidArgument` naming it.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| Error::invalid_argument(name, self.capability.missing_message(name)))
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref().map(str::trim)
    }

    /// Check every required parameter of the capability.
    pub fn validate(&self) -> Result<()> {
        for name in self.capability.required_params() {
            self.require(name)?;
        }
        Ok(())
    }
}
