//! 服务门面：每个能力一个稳定入口，内部按顺序回退。
//!
//! The service facade: one async function per capability, each backed by an ordered
//! provider chain. Construct it with [`FacadeBuilder`]; the facade is cheap to clone
//! and safe to share between tasks.

mod probe;
mod sticker;

pub use probe::{ProbeEntry, ProbeReport};

use crate::capability::{Capability, CapabilityRequest};
use crate::config::FacadeConfig;
use crate::drivers::{chat, image, media, search, shorten, translate, weather, ApiKeys};
use crate::provider::ProviderChain;
use crate::transport::{HttpTransport, Transport};
use crate::types::{
    media_link, ChatReply, GeneratedImage, MediaDownload, Platform, ProcessedImage, ShortUrl, Sticker, Track,
    Translation, VideoSearchResult, WeatherReport,
};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`ServiceFacade`].
///
/// Without an explicit [`FacadeBuilder::config`], configuration is loaded from the
/// environment via [`FacadeConfig::load`]. Builder calls take precedence over both.
#[derive(Default)]
pub struct FacadeBuilder {
    config: Option<FacadeConfig>,
    timeout: Option<Duration>,
    base_url_override: Option<String>,
    endpoints: HashMap<String, String>,
    api_keys: HashMap<String, String>,
    transport: Option<Arc<dyn Transport>>,
}

impl FacadeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: FacadeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Per-HTTP-call timeout, rounded up to whole seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the aggregator base URL.
    ///
    /// This is primarily for testing with mock servers.
    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    /// Point one provider (by id, e.g. `music.itunes`) at another URL.
    pub fn endpoint(mut self, provider_id: impl Into<String>, url: impl Into<String>) -> Self {
        self.endpoints.insert(provider_id.into(), url.into());
        self
    }

    pub fn api_key(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_keys.insert(name.into(), key.into());
        self
    }

    /// Replace the HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<ServiceFacade> {
        let mut config = match self.config {
            Some(config) => config,
            None => FacadeConfig::load()?,
        };

        if let Some(timeout) = self.timeout {
            let millis = timeout.as_millis() as u64;
            config.timeout_secs = millis.div_ceil(1000).max(1);
        }
        if let Some(url) = self.base_url_override {
            config.aggregator_base_url = url;
        }
        config.endpoints.extend(self.endpoints);
        config.api_keys.extend(self.api_keys);
        config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&config)?),
        };

        Ok(ServiceFacade {
            inner: Arc::new(Inner::new(config, transport)),
        })
    }
}

struct Inner {
    config: FacadeConfig,
    transport: Arc<dyn Transport>,
    youtube: ProviderChain<MediaDownload>,
    tiktok: ProviderChain<MediaDownload>,
    instagram: ProviderChain<MediaDownload>,
    video_search: ProviderChain<Vec<VideoSearchResult>>,
    music_search: ProviderChain<Track>,
    chat: ProviderChain<ChatReply>,
    text_to_image: ProviderChain<GeneratedImage>,
    remove_background: ProviderChain<ProcessedImage>,
    upscale: ProviderChain<ProcessedImage>,
    translate: ProviderChain<Translation>,
    shorten: ProviderChain<ShortUrl>,
    weather: ProviderChain<WeatherReport>,
}

impl Inner {
    fn new(config: FacadeConfig, transport: Arc<dyn Transport>) -> Self {
        let api_keys = ApiKeys::resolve(&config);
        Self {
            youtube: media::youtube_chain(&config),
            tiktok: media::tiktok_chain(&config, &api_keys),
            instagram: media::instagram_chain(&config, &api_keys),
            video_search: search::video_search_chain(&config, &api_keys),
            music_search: search::music_search_chain(&config),
            chat: chat::chat_chain(&config, &api_keys),
            text_to_image: image::text_to_image_chain(&config),
            remove_background: image::remove_background_chain(&config, &api_keys),
            upscale: image::upscale_chain(&config),
            translate: translate::translate_chain(&config),
            shorten: shorten::shorten_chain(&config),
            weather: weather::weather_chain(&config, &api_keys),
            config,
            transport,
        }
    }
}

/// Multi-provider facade over the bot's third-party services.
#[derive(Clone)]
pub struct ServiceFacade {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ServiceFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceFacade")
            .field("timeout_secs", &self.inner.config.timeout_secs)
            .field("aggregator_base_url", &self.inner.config.aggregator_base_url)
            .finish()
    }
}

impl ServiceFacade {
    pub fn builder() -> FacadeBuilder {
        FacadeBuilder::new()
    }

    pub fn config(&self) -> &FacadeConfig {
        &self.inner.config
    }

    /// Provider ids of a capability, in the order they are tried.
    pub fn providers(&self, capability: Capability) -> Vec<&str> {
        let inner = &self.inner;
        match capability {
            Capability::YoutubeDownload => inner.youtube.provider_ids(),
            Capability::TiktokDownload => inner.tiktok.provider_ids(),
            Capability::InstagramDownload => inner.instagram.provider_ids(),
            Capability::VideoSearch => inner.video_search.provider_ids(),
            Capability::MusicSearch => inner.music_search.provider_ids(),
            Capability::Chat => inner.chat.provider_ids(),
            Capability::TextToImage => inner.text_to_image.provider_ids(),
            Capability::RemoveBackground => inner.remove_background.provider_ids(),
            Capability::UpscaleImage => inner.upscale.provider_ids(),
            Capability::Translate => inner.translate.provider_ids(),
            Capability::ShortenUrl => inner.shorten.provider_ids(),
            Capability::Weather => inner.weather.provider_ids(),
            Capability::TextSticker => Vec::new(),
        }
    }

    async fn run<T>(&self, chain: &ProviderChain<T>, request: CapabilityRequest) -> Result<T> {
        chain.execute(self.inner.transport.as_ref(), &request).await
    }

    /// Download media from `platform`. `format` is `mp4`/`mp3` for YouTube; other
    /// platforms ignore it and report their default format.
    pub async fn download_media(
        &self,
        platform: Platform,
        url: &str,
        format: Option<&str>,
    ) -> Result<MediaDownload> {
        let (capability, chain) = match platform {
            Platform::Youtube => (Capability::YoutubeDownload, &self.inner.youtube),
            Platform::Tiktok => (Capability::TiktokDownload, &self.inner.tiktok),
            Platform::Instagram => (Capability::InstagramDownload, &self.inner.instagram),
        };
        let request = CapabilityRequest::new(capability)
            .param("url", url)
            .with_hint(format);
        self.run(chain, request).await
    }

    pub async fn youtube_download(&self, url: &str, format: Option<&str>) -> Result<MediaDownload> {
        self.download_media(Platform::Youtube, url, format).await
    }

    pub async fn tiktok_download(&self, url: &str) -> Result<MediaDownload> {
        self.download_media(Platform::Tiktok, url, None).await
    }

    pub async fn instagram_download(&self, url: &str) -> Result<MediaDownload> {
        self.download_media(Platform::Instagram, url, None).await
    }

    /// Download from whichever supported platform hosts `url`.
    pub async fn download_auto(&self, url: &str, format: Option<&str>) -> Result<MediaDownload> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::invalid_argument("url", "You need to provide a URL!"));
        }
        let unsupported = || {
            Error::invalid_argument(
                "url",
                "Unsupported link, send a YouTube, TikTok or Instagram URL!",
            )
        };
        let link = media_link(url).ok_or_else(unsupported)?;
        let platform = Platform::detect(&link).ok_or_else(unsupported)?;
        self.download_media(platform, &link, format).await
    }

    /// Search videos; `count` defaults to 1 and is clamped to 1..=50.
    pub async fn search_video(&self, query: &str, count: Option<usize>) -> Result<Vec<VideoSearchResult>> {
        let count = count.unwrap_or(1).clamp(1, search::MAX_SEARCH_RESULTS);
        let request = CapabilityRequest::new(Capability::VideoSearch)
            .param("query", query)
            .param("count", count.to_string());
        self.run(&self.inner.video_search, request).await
    }

    pub async fn search_music(&self, query: &str) -> Result<Track> {
        let request = CapabilityRequest::new(Capability::MusicSearch).param("query", query);
        self.run(&self.inner.music_search, request).await
    }

    pub async fn chat(&self, prompt: &str) -> Result<ChatReply> {
        let request = CapabilityRequest::new(Capability::Chat).param("prompt", prompt);
        self.run(&self.inner.chat, request).await
    }

    pub async fn text_to_image(&self, prompt: &str) -> Result<GeneratedImage> {
        let request = CapabilityRequest::new(Capability::TextToImage).param("prompt", prompt);
        self.run(&self.inner.text_to_image, request).await
    }

    pub async fn remove_background(&self, image_url: &str) -> Result<ProcessedImage> {
        let request = CapabilityRequest::new(Capability::RemoveBackground).param("image_url", image_url);
        self.run(&self.inner.remove_background, request).await
    }

    pub async fn upscale_image(&self, image_url: &str) -> Result<ProcessedImage> {
        let request = CapabilityRequest::new(Capability::UpscaleImage).param("image_url", image_url);
        self.run(&self.inner.upscale, request).await
    }

    /// Translate `text`; a missing or blank `target` uses the configured default language.
    pub async fn translate(&self, text: &str, target: Option<&str>) -> Result<Translation> {
        let request = CapabilityRequest::new(Capability::Translate)
            .param("text", text)
            .param("target_language", target.unwrap_or_default());
        self.run(&self.inner.translate, request).await
    }

    pub async fn shorten_url(&self, url: &str) -> Result<ShortUrl> {
        let request = CapabilityRequest::new(Capability::ShortenUrl).param("url", url);
        self.run(&self.inner.shorten, request).await
    }

    /// Current weather in `city`, in the configured language and units.
    pub async fn weather(&self, city: &str) -> Result<WeatherReport> {
        let request = CapabilityRequest::new(Capability::Weather).param("city", city);
        self.run(&self.inner.weather, request).await
    }

    /// Sticker URL rendering `text`; `animated` picks `attp` over `ttp`. No network.
    pub fn text_sticker(&self, text: &str, animated: bool) -> Result<Sticker> {
        let request = CapabilityRequest::new(Capability::TextSticker).param("text", text);
        request.validate()?;
        let base = self
            .inner
            .config
            .endpoint(sticker::PROVIDER_ID, sticker::ERDWPE_MAKER_URL);
        sticker::build(&base, request.require("text")?, animated)
    }

    /// Exercise a sample of capabilities concurrently and report each outcome.
    pub async fn probe(&self) -> ProbeReport {
        probe::run(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::keys;
    use crate::transport::scripted::ScriptedTransport;
    use crate::transport::{RawResponse, TransportError};
    use serde_json::json;

    fn config() -> FacadeConfig {
        FacadeConfig {
            use_env_keys: false,
            use_keyring: false,
            ..FacadeConfig::default()
        }
    }

    fn facade(transport: Arc<ScriptedTransport>) -> ServiceFacade {
        ServiceFacade::builder()
            .config(config())
            .transport(transport)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_blank_argument_makes_no_calls() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let facade = facade(transport.clone());

        let err = facade.chat("   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { ref argument, .. } if argument == "prompt"));
        assert!(facade.youtube_download("", None).await.unwrap_err().is_invalid_argument());
        assert!(facade.weather("").await.unwrap_err().is_invalid_argument());
        assert!(facade.download_auto("https://example.com/v", None).await.unwrap_err().is_invalid_argument());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_identical_calls_are_not_cached() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(RawResponse::json(json!({"choices": [{"message": {"content": "uno"}}]}))),
            Ok(RawResponse::json(json!({"choices": [{"message": {"content": "dos"}}]}))),
        ]));
        let facade = facade(transport.clone());

        let first = facade.chat("cuenta").await.unwrap();
        let second = facade.chat("cuenta").await.unwrap();
        assert_eq!(first.text, "uno");
        assert_eq!(second.text, "dos");
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_translate_blank_target_uses_default_language() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::json(json!([
            [["Hola", "Hello"]],
            null,
            "en"
        ])))]));
        let facade = facade(transport.clone());

        let out = facade.translate("Hello", Some("  ")).await.unwrap();
        assert_eq!(out.target_language, "es");
        assert_eq!(transport.calls()[0].query_value("tl"), Some("es"));
    }

    #[tokio::test]
    async fn test_search_count_is_clamped() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(TransportError::Other("down".into())),
            Err(TransportError::Other("down".into())),
        ]));
        let facade = ServiceFacade::builder()
            .config(config())
            .api_key(keys::YOUTUBE, "yt")
            .transport(transport.clone())
            .build()
            .unwrap();

        let err = facade.search_video("lofi", Some(500)).await.unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable { attempts: 2, .. }));
        assert_eq!(transport.calls()[0].query_value("maxResults"), Some("50"));
    }

    #[tokio::test]
    async fn test_download_auto_routes_by_host() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::json(json!({
            "data": {"play": "https://cdn.test/t.mp4", "title": "clip"}
        })))]));
        let facade = facade(transport.clone());

        let out = facade
            .download_auto("https://www.tiktok.com/@user/video/1", None)
            .await
            .unwrap();
        assert_eq!(out.platform, Platform::Tiktok);
        assert_eq!(out.provider, "tiktok.ssstik");
    }

    #[tokio::test]
    async fn test_download_auto_completes_links_without_scheme() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::json(json!({
            "data": {"play": "https://cdn.test/t.mp4"}
        })))]));
        let facade = facade(transport.clone());

        let out = facade
            .download_auto("www.tiktok.com/@user/video/1", Some("mp3"))
            .await
            .unwrap();
        assert_eq!(out.platform, Platform::Tiktok);
        assert_eq!(out.format, "mp4");
        assert_eq!(
            transport.calls()[0].query_value("url"),
            Some("https://www.tiktok.com/@user/video/1")
        );
    }

    #[tokio::test]
    async fn test_weather_injects_language_and_units() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::json(json!({
            "name": "Porto",
            "main": {"temp": 17.0}
        })))]));
        let facade = ServiceFacade::builder()
            .config(FacadeConfig {
                default_language: "pt".into(),
                ..config()
            })
            .api_key(keys::OPENWEATHERMAP, "owm")
            .transport(transport.clone())
            .build()
            .unwrap();

        let report = facade.weather("Porto").await.unwrap();
        assert_eq!(report.temperature, 17.0);
        let call = &transport.calls()[0];
        assert_eq!(call.query_value("lang"), Some("pt"));
        assert_eq!(call.query_value("units"), Some("metric"));
    }

    #[test]
    fn test_builder_overrides() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let facade = ServiceFacade::builder()
            .config(config())
            .timeout(Duration::from_millis(1500))
            .base_url_override("http://127.0.0.1:9999")
            .endpoint("music.itunes", "http://127.0.0.1:9999/search")
            .transport(transport)
            .build()
            .unwrap();
        assert_eq!(facade.config().timeout_secs, 2);
        assert_eq!(facade.config().aggregator_base_url, "http://127.0.0.1:9999");
        assert_eq!(
            facade.providers(Capability::MusicSearch),
            vec!["music.deezer", "music.itunes"]
        );
        assert_eq!(
            facade.providers(Capability::Chat),
            vec!["chat.pawan", "chat.chatanywhere", "chat.churchless"]
        );
    }

    #[test]
    fn test_invalid_base_url_fails_build() {
        let err = ServiceFacade::builder()
            .config(config())
            .base_url_override("not a url")
            .transport(Arc::new(ScriptedTransport::new(vec![])))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_text_sticker() {
        let facade = facade(Arc::new(ScriptedTransport::new(vec![])));
        let animated = facade.text_sticker("hola mundo", true).unwrap();
        assert!(animated.animated);
        assert_eq!(
            animated.url,
            "https://api.erdwpe.com/api/maker/attp?text=hola+mundo&apikey=erdwpe"
        );
        let plain = facade.text_sticker("hola", false).unwrap();
        assert!(plain.url.contains("/maker/ttp?"));
        let err = tokio_test::assert_err!(facade.text_sticker(" ", false));
        assert!(err.is_invalid_argument());
    }
}
