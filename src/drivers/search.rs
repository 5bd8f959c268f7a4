//! Video and music search drivers.

use super::{http_url, keys, push_segment, ApiKeys};
use crate::capability::{Capability, CapabilityRequest};
use crate::config::FacadeConfig;
use crate::provider::{Endpoint, Provider, ProviderChain, ShapeError};
use crate::transport::{ProviderRequest, RawResponse};
use crate::types::{Track, VideoSearchResult, UNKNOWN_ALBUM, UNKNOWN_ARTIST};
use crate::utils::duration::{first_secs, millis_to_secs};
use crate::utils::PathMapper;
use crate::Result;
use serde_json::Value;

pub const YOUTUBE_SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
pub const DEEZER_SEARCH_URL: &str = "https://api.deezer.com/search";
pub const ITUNES_SEARCH_URL: &str = "https://itunes.apple.com/search";

pub const MAX_SEARCH_RESULTS: usize = 50;

/// YouTube Data API search, then the aggregator's yt-search endpoint.
pub fn video_search_chain(config: &FacadeConfig, api_keys: &ApiKeys) -> ProviderChain<Vec<VideoSearchResult>> {
    ProviderChain::new(
        Capability::VideoSearch,
        vec![
            Provider::new(
                "search.youtube-api",
                config.endpoint("search.youtube-api", YOUTUBE_SEARCH_URL),
                build_youtube_api,
                normalize_youtube_api,
            )
            .with_api_key(keys::YOUTUBE, api_keys.get(keys::YOUTUBE)),
            Provider::new(
                "search.aggregator",
                config.endpoint("search.aggregator", &config.aggregator_url("api")),
                build_aggregator_search,
                normalize_aggregator_search,
            ),
        ],
    )
}

/// Deezer, then iTunes.
pub fn music_search_chain(config: &FacadeConfig) -> ProviderChain<Track> {
    ProviderChain::new(
        Capability::MusicSearch,
        vec![
            Provider::new(
                "music.deezer",
                config.endpoint("music.deezer", DEEZER_SEARCH_URL),
                build_deezer,
                normalize_deezer,
            ),
            Provider::new(
                "music.itunes",
                config.endpoint("music.itunes", ITUNES_SEARCH_URL),
                build_itunes,
                normalize_itunes,
            ),
        ],
    )
}

/// Requested result count, clamped to `1..=MAX_SEARCH_RESULTS`.
pub(crate) fn result_count(req: &CapabilityRequest) -> usize {
    req.get("count")
        .and_then(|c| c.parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SEARCH_RESULTS)
}

fn build_youtube_api(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    let key = endpoint.require_key()?;
    Ok(ProviderRequest::get(endpoint.url.clone())
        .query("part", "snippet")
        .query("q", req.require("query")?)
        .query("type", "video")
        .query("key", key)
        .query("maxResults", result_count(req).to_string()))
}

fn normalize_youtube_api(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<Vec<VideoSearchResult>, ShapeError> {
    let items = PathMapper::get_non_empty_array(&raw.body, "items")
        .ok_or_else(|| ShapeError::new("no search results in 'items'"))?;

    let results: Vec<VideoSearchResult> = items
        .iter()
        .filter_map(|item| {
            let id = PathMapper::get_string(item, "id.videoId")?;
            Some(VideoSearchResult {
                title: PathMapper::get_string(item, "snippet.title").unwrap_or_default(),
                url: format!("https://www.youtube.com/watch?v={}", id),
                duration_secs: None,
                author: PathMapper::get_string(item, "snippet.channelTitle").unwrap_or_default(),
                thumbnail: PathMapper::first_string(
                    item,
                    &[
                        "snippet.thumbnails.high.url",
                        "snippet.thumbnails.medium.url",
                        "snippet.thumbnails.default.url",
                    ],
                ),
                provider: endpoint.provider_id.clone(),
            })
        })
        .take(result_count(req))
        .collect();

    if results.is_empty() {
        return Err(ShapeError::missing("items[].id.videoId"));
    }
    Ok(results)
}

fn build_aggregator_search(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    let url = push_segment(endpoint, "ytsearch")?;
    Ok(ProviderRequest::get(url.to_string()).query("q", req.require("query")?))
}

fn normalize_aggregator_search(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<Vec<VideoSearchResult>, ShapeError> {
    let videos = ["videos", "data", "result"]
        .iter()
        .find_map(|p| PathMapper::get_non_empty_array(&raw.body, p))
        .ok_or_else(|| ShapeError::new("no search results in 'videos'"))?;

    let results: Vec<VideoSearchResult> = videos
        .iter()
        .filter_map(|v| aggregator_video(endpoint, v))
        .take(result_count(req))
        .collect();

    if results.is_empty() {
        return Err(ShapeError::missing("videos[].url"));
    }
    Ok(results)
}

fn aggregator_video(endpoint: &Endpoint, v: &Value) -> Option<VideoSearchResult> {
    let url = PathMapper::get_string(v, "url").or_else(|| {
        PathMapper::get_string(v, "videoId").map(|id| format!("https://www.youtube.com/watch?v={}", id))
    })?;
    Some(VideoSearchResult {
        title: PathMapper::get_string(v, "title").unwrap_or_default(),
        url,
        duration_secs: first_secs(v, &["seconds", "duration.seconds", "timestamp"]),
        author: PathMapper::first_string(v, &["author.name", "author", "channel"]).unwrap_or_default(),
        thumbnail: PathMapper::first_string(v, &["thumbnail", "image"]),
        provider: endpoint.provider_id.clone(),
    })
}

fn build_deezer(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    Ok(ProviderRequest::get(endpoint.url.clone())
        .query("q", req.require("query")?)
        .query("limit", "1"))
}

fn normalize_deezer(
    endpoint: &Endpoint,
    raw: &RawResponse,
    _req: &CapabilityRequest,
) -> std::result::Result<Track, ShapeError> {
    let track = PathMapper::get_non_empty_array(&raw.body, "data")
        .and_then(|d| d.first())
        .ok_or_else(|| ShapeError::new("no tracks in 'data'"))?;

    Ok(Track {
        title: PathMapper::get_string(track, "title").unwrap_or_default(),
        artist: PathMapper::get_string(track, "artist.name").unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        album: PathMapper::get_string(track, "album.title").unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
        duration_secs: PathMapper::get_u64(track, "duration").unwrap_or(0),
        thumbnail: PathMapper::first_string(track, &["album.cover_medium", "album.cover"]),
        preview_url: http_url(PathMapper::get_string(track, "preview"), "preview")?,
        provider: endpoint.provider_id.clone(),
    })
}

fn build_itunes(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    Ok(ProviderRequest::get(endpoint.url.clone())
        .query("term", req.require("query")?)
        .query("media", "music")
        .query("limit", "1"))
}

fn normalize_itunes(
    endpoint: &Endpoint,
    raw: &RawResponse,
    _req: &CapabilityRequest,
) -> std::result::Result<Track, ShapeError> {
    let track = PathMapper::get_non_empty_array(&raw.body, "results")
        .and_then(|d| d.first())
        .ok_or_else(|| ShapeError::new("no tracks in 'results'"))?;

    Ok(Track {
        title: PathMapper::get_string(track, "trackName").unwrap_or_default(),
        artist: PathMapper::get_string(track, "artistName").unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        album: PathMapper::get_string(track, "collectionName")
            .unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
        duration_secs: PathMapper::get_u64(track, "trackTimeMillis")
            .map(millis_to_secs)
            .unwrap_or(0),
        thumbnail: PathMapper::get_string(track, "artworkUrl100"),
        preview_url: http_url(PathMapper::get_string(track, "previewUrl"), "previewUrl")?,
        provider: endpoint.provider_id.clone(),
    })
}
