//! Media download drivers (YouTube, TikTok, Instagram).

use super::{http_url, keys, push_segment, upstream_error, with_rapidapi_auth, ApiKeys};
use crate::capability::{Capability, CapabilityRequest};
use crate::config::FacadeConfig;
use crate::provider::{Endpoint, Provider, ProviderChain, ShapeError};
use crate::transport::{ProviderRequest, RawResponse};
use crate::types::{MediaDownload, Platform};
use crate::utils::duration::first_secs;
use crate::utils::PathMapper;
use crate::Result;
use serde_json::{json, Value};

pub const Y2MATE_URL: &str = "https://y2mate.nu/api/json/convert";
pub const COBALT_URL: &str = "https://api.cobalt.tools/api/json";
pub const SSSTIK_URL: &str = "https://api.ssstik.io/tiktok";
pub const TIKTOK_RAPIDAPI_URL: &str = "https://tiktok-scraper7.p.rapidapi.com/tiktok";
pub const INSTAGRAM_RAPIDAPI_URL: &str =
    "https://instagram-downloader-download-instagram-videos-stories.p.rapidapi.com";
pub const INSTAGRAM_SCRAPER_URL: &str = "https://api.instagram-scraper.com/v1.0/media";

/// y2mate, then cobalt, then the aggregator's ytmp4/ytmp3 endpoints.
pub fn youtube_chain(config: &FacadeConfig) -> ProviderChain<MediaDownload> {
    ProviderChain::new(
        Capability::YoutubeDownload,
        vec![
            Provider::new(
                "youtube.y2mate",
                config.endpoint("youtube.y2mate", Y2MATE_URL),
                build_y2mate,
                normalize_y2mate,
            ),
            Provider::new(
                "youtube.cobalt",
                config.endpoint("youtube.cobalt", COBALT_URL),
                build_cobalt,
                normalize_cobalt,
            ),
            Provider::new(
                "youtube.aggregator",
                config.endpoint("youtube.aggregator", &config.aggregator_url("api")),
                build_aggregator,
                normalize_aggregator,
            ),
        ],
    )
}

/// ssstik, then the RapidAPI TikTok scraper.
pub fn tiktok_chain(config: &FacadeConfig, api_keys: &ApiKeys) -> ProviderChain<MediaDownload> {
    ProviderChain::new(
        Capability::TiktokDownload,
        vec![
            Provider::new(
                "tiktok.ssstik",
                config.endpoint("tiktok.ssstik", SSSTIK_URL),
                build_ssstik,
                normalize_tiktok,
            ),
            Provider::new(
                "tiktok.rapidapi",
                config.endpoint("tiktok.rapidapi", TIKTOK_RAPIDAPI_URL),
                build_tiktok_rapidapi,
                normalize_tiktok,
            )
            .with_api_key(keys::RAPIDAPI, api_keys.get(keys::RAPIDAPI)),
        ],
    )
}

/// RapidAPI Instagram downloader, then instagram-scraper.
pub fn instagram_chain(config: &FacadeConfig, api_keys: &ApiKeys) -> ProviderChain<MediaDownload> {
    ProviderChain::new(
        Capability::InstagramDownload,
        vec![
            Provider::new(
                "instagram.rapidapi",
                config.endpoint("instagram.rapidapi", INSTAGRAM_RAPIDAPI_URL),
                build_instagram_rapidapi,
                normalize_instagram_rapidapi,
            )
            .with_api_key(keys::RAPIDAPI, api_keys.get(keys::RAPIDAPI)),
            Provider::new(
                "instagram.scraper",
                config.endpoint("instagram.scraper", INSTAGRAM_SCRAPER_URL),
                build_instagram_scraper,
                normalize_instagram_scraper,
            ),
        ],
    )
}

fn wants_audio(req: &CapabilityRequest) -> bool {
    req.hint().map(|h| h.eq_ignore_ascii_case("mp3")).unwrap_or(false)
}

/// Only YouTube honours a format hint; other platforms always report their default.
fn output_format(platform: Platform, req: &CapabilityRequest) -> String {
    match platform {
        Platform::Youtube if wants_audio(req) => "mp3".to_string(),
        _ => platform.default_format().to_string(),
    }
}

/// Field paths where a provider keeps each part of a media result.
struct MediaPaths<'a> {
    url: &'a [&'a str],
    title: &'a [&'a str],
    duration: &'a [&'a str],
    thumbnail: &'a [&'a str],
}

fn media_from(
    platform: Platform,
    endpoint: &Endpoint,
    body: &Value,
    req: &CapabilityRequest,
    paths: MediaPaths<'_>,
) -> std::result::Result<MediaDownload, ShapeError> {
    if let Some(message) = upstream_error(body) {
        return Err(ShapeError::new(message));
    }
    let download_url = http_url(PathMapper::first_string(body, paths.url), paths.url[0])?;

    Ok(MediaDownload {
        platform,
        download_url,
        title: PathMapper::first_string(body, paths.title).unwrap_or_default(),
        duration_secs: first_secs(body, paths.duration),
        thumbnail: PathMapper::first_string(body, paths.thumbnail),
        format: output_format(platform, req),
        provider: endpoint.provider_id.clone(),
    })
}

fn build_y2mate(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    let format = if wants_audio(req) { "mp3" } else { "mp4" };
    Ok(ProviderRequest::post(endpoint.url.clone()).json(json!({
        "url": req.require("url")?,
        "format": format,
        "quality": "720",
    })))
}

fn normalize_y2mate(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<MediaDownload, ShapeError> {
    media_from(
        Platform::Youtube,
        endpoint,
        &raw.body,
        req,
        MediaPaths {
            url: &["url", "dlink", "download", "link"],
            title: &["title"],
            duration: &["duration", "seconds"],
            thumbnail: &["thumbnail", "thumb"],
        },
    )
}

fn build_cobalt(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    Ok(ProviderRequest::post(endpoint.url.clone())
        .header("Accept", "application/json")
        .json(json!({
            "url": req.require("url")?,
            "isAudioOnly": wants_audio(req),
            "vQuality": "720",
        })))
}

fn normalize_cobalt(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<MediaDownload, ShapeError> {
    media_from(
        Platform::Youtube,
        endpoint,
        &raw.body,
        req,
        MediaPaths {
            url: &["url"],
            title: &["filename"],
            duration: &[],
            thumbnail: &[],
        },
    )
}

fn build_aggregator(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    let route = if wants_audio(req) { "ytmp3" } else { "ytmp4" };
    let url = push_segment(endpoint, route)?;
    Ok(ProviderRequest::get(url.to_string()).query("url", req.require("url")?))
}

fn normalize_aggregator(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<MediaDownload, ShapeError> {
    if raw.body.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(ShapeError::new("success flag not set"));
    }
    media_from(
        Platform::Youtube,
        endpoint,
        &raw.body,
        req,
        MediaPaths {
            url: &["data.download", "data.dl", "data.url"],
            title: &["data.title"],
            duration: &["data.duration", "data.seconds", "data.timestamp"],
            thumbnail: &["data.thumbnail", "data.image"],
        },
    )
}

fn build_ssstik(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    Ok(ProviderRequest::get(endpoint.url.clone()).query("url", req.require("url")?))
}

fn build_tiktok_rapidapi(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    let request = ProviderRequest::get(endpoint.url.clone()).query("url", req.require("url")?);
    with_rapidapi_auth(request, endpoint)
}

fn normalize_tiktok(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<MediaDownload, ShapeError> {
    media_from(
        Platform::Tiktok,
        endpoint,
        &raw.body,
        req,
        MediaPaths {
            url: &["data.play", "data.hdplay", "play", "video", "url"],
            title: &["data.title", "title"],
            duration: &["data.duration", "duration"],
            thumbnail: &["data.cover", "data.origin_cover", "cover", "thumbnail"],
        },
    )
}

fn build_instagram_rapidapi(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    let url = push_segment(endpoint, "index")?;
    let request = ProviderRequest::get(url.to_string()).query("url", req.require("url")?);
    with_rapidapi_auth(request, endpoint)
}

fn normalize_instagram_rapidapi(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<MediaDownload, ShapeError> {
    media_from(
        Platform::Instagram,
        endpoint,
        &raw.body,
        req,
        MediaPaths {
            url: &["media", "media[0].url", "download_url", "video_url", "url"],
            title: &["title", "caption"],
            duration: &["video_duration", "duration"],
            thumbnail: &["thumbnail", "thumbnail_url"],
        },
    )
}

fn build_instagram_scraper(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    Ok(ProviderRequest::get(endpoint.url.clone()).query("url", req.require("url")?))
}

fn normalize_instagram_scraper(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<MediaDownload, ShapeError> {
    media_from(
        Platform::Instagram,
        endpoint,
        &raw.body,
        req,
        MediaPaths {
            url: &["data.video_url", "data.display_url", "video_url", "display_url", "url"],
            title: &["data.caption", "caption", "title"],
            duration: &["data.video_duration", "video_duration"],
            thumbnail: &["data.thumbnail_src", "data.display_url", "thumbnail_src"],
        },
    )
}
