//! Provider 驱动：每个上游 API 的请求构建与响应归一化
//!
//! Provider drivers: for every upstream API, a request builder and a normalizer that turns
//! its raw payload into the capability's result type. Each submodule exposes one
//! `*_chain` constructor per capability listing its providers in priority order.

pub mod chat;
pub mod image;
pub mod media;
pub mod search;
pub mod shorten;
pub mod translate;
pub mod weather;

use crate::config::FacadeConfig;
use crate::provider::{Endpoint, ShapeError};
use crate::transport::ProviderRequest;
use crate::{Error, ErrorContext, Result};
use std::collections::HashMap;
use std::fmt;

/// API key names looked up through [`crate::config::FacadeConfig::api_key`].
pub mod keys {
    pub const RAPIDAPI: &str = "rapidapi";
    pub const YOUTUBE: &str = "youtube";
    pub const CHAT: &str = "chat";
    pub const REMOVE_BG: &str = "removebg";
    pub const OPENWEATHERMAP: &str = "openweathermap";

    pub const ALL: &[&str] = &[RAPIDAPI, YOUTUBE, CHAT, REMOVE_BG, OPENWEATHERMAP];
}

/// API keys resolved once per facade and shared by every chain that needs them.
#[derive(Clone, Default)]
pub struct ApiKeys(HashMap<&'static str, String>);

impl ApiKeys {
    pub fn resolve(config: &FacadeConfig) -> Self {
        Self::resolve_with(config, |var| std::env::var(var).ok())
    }

    pub(crate) fn resolve_with(
        config: &FacadeConfig,
        env_lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        Self(
            keys::ALL
                .iter()
                .filter_map(|&name| config.api_key_with(name, &env_lookup).map(|k| (name, k)))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.0.keys().copied().collect();
        names.sort_unstable();
        f.debug_tuple("ApiKeys").field(&names).finish()
    }
}

/// `base` with `segment` appended as one percent-encoded path segment.
pub(crate) fn push_segment(endpoint: &Endpoint, segment: &str) -> Result<url::Url> {
    let mut url = parse_endpoint(endpoint)?;
    url.path_segments_mut()
        .map_err(|_| invalid_endpoint(endpoint, "URL cannot take path segments"))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

pub(crate) fn parse_endpoint(endpoint: &Endpoint) -> Result<url::Url> {
    url::Url::parse(&endpoint.url).map_err(|e| invalid_endpoint(endpoint, &e.to_string()))
}

fn invalid_endpoint(endpoint: &Endpoint, details: &str) -> Error {
    Error::configuration_with_context(
        format!("invalid endpoint for provider '{}'", endpoint.provider_id),
        ErrorContext::new()
            .with_field_path(format!("endpoints.{}", endpoint.provider_id))
            .with_details(details.to_string())
            .with_source(endpoint.provider_id.clone()),
    )
}

/// RapidAPI-hosted providers authenticate with a key header plus the target host.
pub(crate) fn with_rapidapi_auth(
    request: ProviderRequest,
    endpoint: &Endpoint,
) -> Result<ProviderRequest> {
    let key = endpoint.require_key()?.to_string();
    let host = parse_endpoint(endpoint)?
        .host_str()
        .unwrap_or_default()
        .to_string();
    Ok(request
        .header("X-RapidAPI-Key", key)
        .header("X-RapidAPI-Host", host))
}

/// Accept only absolute http(s) URLs from a payload.
pub(crate) fn http_url(value: Option<String>, field: &str) -> std::result::Result<String, ShapeError> {
    match value {
        Some(v) if v.starts_with("http://") || v.starts_with("https://") => Ok(v),
        Some(v) => Err(ShapeError::new(format!(
            "field '{}' is not a URL: {}",
            field,
            crate::error::truncate(&v, 80)
        ))),
        None => Err(ShapeError::missing(field)),
    }
}

/// Surface an explicit upstream error flag (`{"status":"error"}`, `{"code":-1}`, `{"success":false}`).
pub(crate) fn upstream_error(body: &serde_json::Value) -> Option<String> {
    use crate::utils::PathMapper;

    let message = || {
        PathMapper::first_string(body, &["msg", "message", "text", "error.message", "error"])
            .unwrap_or_else(|| "provider reported an error".to_string())
    };

    if body.get("status").and_then(|s| s.as_str()) == Some("error") {
        return Some(message());
    }
    if body.get("success").and_then(|s| s.as_bool()) == Some(false) {
        return Some(message());
    }
    if let Some(code) = body.get("code").and_then(|c| c.as_i64()) {
        if code != 0 && code != 200 {
            return Some(message());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint(url: &str) -> Endpoint {
        Endpoint {
            provider_id: "test.provider".into(),
            url: url.into(),
            key_name: Some(keys::RAPIDAPI),
            api_key: Some("secret".into()),
        }
    }

    #[test]
    fn test_api_keys_look_up_each_name_once() {
        let lookups = std::cell::RefCell::new(Vec::new());
        let config = FacadeConfig {
            use_keyring: false,
            api_keys: [(keys::CHAT.to_string(), "mine".to_string())].into(),
            ..FacadeConfig::default()
        };
        let resolved = ApiKeys::resolve_with(&config, |var| {
            lookups.borrow_mut().push(var.to_string());
            (var == "RAPIDAPI_API_KEY").then(|| "rk".to_string())
        });

        assert_eq!(resolved.get(keys::RAPIDAPI).as_deref(), Some("rk"));
        assert_eq!(resolved.get(keys::CHAT).as_deref(), Some("mine"));
        assert_eq!(resolved.get(keys::YOUTUBE), None);
        // The config map answers for `chat`; every other name hits the env exactly once.
        assert_eq!(lookups.borrow().len(), keys::ALL.len() - 1);
        assert!(!format!("{resolved:?}").contains("rk"));
    }

    #[test]
    fn test_push_segment_encodes() {
        let url = push_segment(&endpoint("https://image.test/prompt"), "a cat / dog").unwrap();
        assert_eq!(url.as_str(), "https://image.test/prompt/a%20cat%20%2F%20dog");
    }

    #[test]
    fn test_push_segment_on_trailing_slash() {
        let url = push_segment(&endpoint("https://wttr.test/"), "Madrid").unwrap();
        assert_eq!(url.as_str(), "https://wttr.test/Madrid");
    }

    #[test]
    fn test_rapidapi_headers() {
        let req = with_rapidapi_auth(
            ProviderRequest::get("https://x.p.rapidapi.com/tiktok"),
            &endpoint("https://x.p.rapidapi.com/tiktok"),
        )
        .unwrap();
        assert_eq!(req.header_value("X-RapidAPI-Key"), Some("secret"));
        assert_eq!(req.header_value("X-RapidAPI-Host"), Some("x.p.rapidapi.com"));
    }

    #[test]
    fn test_upstream_error_flags() {
        assert_eq!(
            upstream_error(&json!({"status": "error", "text": "bad link"})).as_deref(),
            Some("bad link")
        );
        assert!(upstream_error(&json!({"code": -1, "msg": "nope"})).is_some());
        assert!(upstream_error(&json!({"success": false})).is_some());
        assert!(upstream_error(&json!({"code": 0, "data": {}})).is_none());
        assert!(upstream_error(&json!({"status": "stream"})).is_none());
    }

    #[test]
    fn test_http_url() {
        assert!(http_url(Some("https://cdn.test/v.mp4".into()), "url").is_ok());
        assert!(http_url(Some("javascript:alert(1)".into()), "url").is_err());
        assert_eq!(http_url(None, "url").unwrap_err(), ShapeError::missing("url"));
    }
}
