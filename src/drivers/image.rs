//! Image drivers: generation, background removal and upscaling.

use super::{http_url, keys, push_segment, upstream_error, with_rapidapi_auth, ApiKeys};
use crate::capability::{Capability, CapabilityRequest};
use crate::config::FacadeConfig;
use crate::provider::{Endpoint, Provider, ProviderChain, ShapeError};
use crate::transport::{ProviderRequest, RawResponse};
use crate::types::{GeneratedImage, ProcessedImage};
use crate::utils::PathMapper;
use crate::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

pub const POLLINATIONS_URL: &str = "https://pollinations.ai/p";
pub const POLLINATIONS_IMAGE_URL: &str = "https://image.pollinations.ai/prompt";
pub const REMOVE_BG_URL: &str = "https://api.remove.bg/v1.0/removebg";
pub const BACKGROUND_REMOVAL_RAPIDAPI_URL: &str = "https://background-removal.p.rapidapi.com/remove";

pub const IMAGE_SIZE: u32 = 512;

/// Both Pollinations hosts render on GET; a HEAD confirms the image URL resolves.
pub fn text_to_image_chain(config: &FacadeConfig) -> ProviderChain<GeneratedImage> {
    ProviderChain::new(
        Capability::TextToImage,
        vec![
            Provider::new(
                "image.pollinations",
                config.endpoint("image.pollinations", POLLINATIONS_URL),
                build_pollinations,
                normalize_pollinations,
            ),
            Provider::new(
                "image.pollinations-image",
                config.endpoint("image.pollinations-image", POLLINATIONS_IMAGE_URL),
                build_pollinations,
                normalize_pollinations,
            ),
        ],
    )
}

pub fn remove_background_chain(config: &FacadeConfig, api_keys: &ApiKeys) -> ProviderChain<ProcessedImage> {
    ProviderChain::new(
        Capability::RemoveBackground,
        vec![
            Provider::new(
                "removebg.remove-bg",
                config.endpoint("removebg.remove-bg", REMOVE_BG_URL),
                build_remove_bg,
                normalize_remove_bg,
            )
            .with_api_key(keys::REMOVE_BG, api_keys.get(keys::REMOVE_BG)),
            Provider::new(
                "removebg.rapidapi",
                config.endpoint("removebg.rapidapi", BACKGROUND_REMOVAL_RAPIDAPI_URL),
                build_removal_rapidapi,
                normalize_hosted_image,
            )
            .with_api_key(keys::RAPIDAPI, api_keys.get(keys::RAPIDAPI)),
        ],
    )
}

pub fn upscale_chain(config: &FacadeConfig) -> ProviderChain<ProcessedImage> {
    ProviderChain::new(
        Capability::UpscaleImage,
        vec![Provider::new(
            "upscale.aggregator",
            config.endpoint("upscale.aggregator", &config.aggregator_url("api")),
            build_upscale,
            normalize_hosted_image,
        )],
    )
}

/// Only the primary Pollinations host understands `nologo`.
fn pollinations_url(endpoint: &Endpoint, prompt: &str) -> Result<url::Url> {
    let mut url = push_segment(endpoint, prompt)?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("width", &IMAGE_SIZE.to_string())
            .append_pair("height", &IMAGE_SIZE.to_string());
        if endpoint.provider_id == "image.pollinations" {
            query.append_pair("nologo", "true");
        }
    }
    Ok(url)
}

fn build_pollinations(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    let url = pollinations_url(endpoint, req.require("prompt")?)?;
    Ok(ProviderRequest::head(url.to_string()))
}

fn normalize_pollinations(
    endpoint: &Endpoint,
    _raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<GeneratedImage, ShapeError> {
    let prompt = req.get("prompt").ok_or_else(|| ShapeError::missing("prompt"))?;
    let url = pollinations_url(endpoint, prompt).map_err(|e| ShapeError::new(e.to_string()))?;
    Ok(GeneratedImage {
        image_url: url.to_string(),
        prompt: prompt.to_string(),
        provider: endpoint.provider_id.clone(),
    })
}

fn build_remove_bg(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    let key = endpoint.require_key()?;
    Ok(ProviderRequest::post(endpoint.url.clone())
        .header("X-Api-Key", key)
        .header("Accept", "application/json")
        .form(vec![
            ("image_url".to_string(), req.require("image_url")?.to_string()),
            ("size".to_string(), "auto".to_string()),
        ]))
}

/// remove.bg answers `{"data":{"result_b64":"..."}}` when asked for JSON.
fn normalize_remove_bg(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<ProcessedImage, ShapeError> {
    if let Some(errors) = PathMapper::get_string(&raw.body, "errors[0].title") {
        return Err(ShapeError::new(errors));
    }
    let encoded = PathMapper::get_string(&raw.body, "data.result_b64")
        .ok_or_else(|| ShapeError::missing("data.result_b64"))?;
    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| ShapeError::new(format!("invalid base64 image: {}", e)))?;
    if bytes.is_empty() {
        return Err(ShapeError::new("empty image"));
    }

    Ok(ProcessedImage {
        source_url: req.get("image_url").unwrap_or_default().to_string(),
        image_url: format!("data:image/png;base64,{}", STANDARD.encode(&bytes)),
        provider: endpoint.provider_id.clone(),
    })
}

fn build_removal_rapidapi(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    let request = ProviderRequest::post(endpoint.url.clone()).form(vec![(
        "image_url".to_string(),
        req.require("image_url")?.to_string(),
    )]);
    with_rapidapi_auth(request, endpoint)
}

fn build_upscale(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    let url = push_segment(endpoint, "upscale")?;
    Ok(ProviderRequest::get(url.to_string()).query("url", req.require("image_url")?))
}

fn normalize_hosted_image(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<ProcessedImage, ShapeError> {
    if let Some(msg) = upstream_error(&raw.body) {
        return Err(ShapeError::new(msg));
    }
    let image_url = http_url(
        PathMapper::first_string(
            &raw.body,
            &["response.image_url", "image_url", "data.url", "data.image", "result", "url"],
        ),
        "image_url",
    )?;

    Ok(ProcessedImage {
        source_url: req.get("image_url").unwrap_or_default().to_string(),
        image_url,
        provider: endpoint.provider_id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, RequestBody, ResponseFormat};
    use serde_json::json;

    fn endpoint(id: &str, url: &str) -> Endpoint {
        Endpoint {
            provider_id: id.into(),
            url: url.into(),
            key_name: None,
            api_key: None,
        }
    }

    fn image(url: &str) -> CapabilityRequest {
        CapabilityRequest::new(Capability::RemoveBackground).param("image_url", url)
    }

    #[test]
    fn test_pollinations_head_with_encoded_prompt() {
        let req = CapabilityRequest::new(Capability::TextToImage).param("prompt", "un gato azul");
        let primary = build_pollinations(&endpoint("image.pollinations", POLLINATIONS_URL), &req).unwrap();
        assert_eq!(primary.method, Method::Head);
        assert_eq!(primary.expect, ResponseFormat::Empty);
        assert_eq!(
            primary.url,
            "https://pollinations.ai/p/un%20gato%20azul?width=512&height=512&nologo=true"
        );

        let backup = build_pollinations(
            &endpoint("image.pollinations-image", POLLINATIONS_IMAGE_URL),
            &req,
        )
        .unwrap();
        assert_eq!(
            backup.url,
            "https://image.pollinations.ai/prompt/un%20gato%20azul?width=512&height=512"
        );

        let out = normalize_pollinations(
            &endpoint("image.pollinations", POLLINATIONS_URL),
            &RawResponse::json(serde_json::Value::Null),
            &req,
        )
        .unwrap();
        assert_eq!(out.image_url, primary.url);
        assert_eq!(out.prompt, "un gato azul");
    }

    #[test]
    fn test_remove_bg_form_and_data_url() {
        let mut ep = endpoint("removebg.remove-bg", REMOVE_BG_URL);
        ep.key_name = Some(keys::REMOVE_BG);
        ep.api_key = Some("rb-key".into());

        let req = build_remove_bg(&ep, &image("https://img.test/a.jpg")).unwrap();
        assert_eq!(req.header_value("x-api-key"), Some("rb-key"));
        assert_eq!(
            req.body,
            Some(RequestBody::Form(vec![
                ("image_url".into(), "https://img.test/a.jpg".into()),
                ("size".into(), "auto".into()),
            ]))
        );

        let raw = RawResponse::json(json!({"data": {"result_b64": STANDARD.encode(b"\x89PNG")}}));
        let out = normalize_remove_bg(&ep, &raw, &image("https://img.test/a.jpg")).unwrap();
        assert!(out.image_url.starts_with("data:image/png;base64,"));
        assert_eq!(out.source_url, "https://img.test/a.jpg");
    }

    #[test]
    fn test_remove_bg_rejects_bad_payloads() {
        let ep = endpoint("removebg.remove-bg", REMOVE_BG_URL);
        let errors = RawResponse::json(json!({"errors": [{"title": "Insufficient credits"}]}));
        assert_eq!(
            normalize_remove_bg(&ep, &errors, &image("https://x")).unwrap_err(),
            ShapeError::new("Insufficient credits")
        );
        let junk = RawResponse::json(json!({"data": {"result_b64": "%%%"}}));
        assert!(normalize_remove_bg(&ep, &junk, &image("https://x")).is_err());
    }

    #[test]
    fn test_upscale_route_and_hosted_result() {
        let ep = endpoint("upscale.aggregator", "https://agg.test/api");
        let req = CapabilityRequest::new(Capability::UpscaleImage).param("image_url", "https://img.test/a.jpg");
        let http = build_upscale(&ep, &req).unwrap();
        assert_eq!(http.url, "https://agg.test/api/upscale");
        assert_eq!(http.query_value("url"), Some("https://img.test/a.jpg"));

        let ok = RawResponse::json(json!({"success": true, "data": {"url": "https://cdn.test/up.png"}}));
        assert_eq!(
            normalize_hosted_image(&ep, &ok, &req).unwrap().image_url,
            "https://cdn.test/up.png"
        );
        let failed = RawResponse::json(json!({"success": false, "message": "too large"}));
        assert_eq!(
            normalize_hosted_image(&ep, &failed, &req).unwrap_err(),
            ShapeError::new("too large")
        );
    }
}
