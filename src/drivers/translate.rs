//! Translation drivers: Google's free `gtx` endpoint, then MyMemory.

use crate::capability::{Capability, CapabilityRequest};
use crate::config::FacadeConfig;
use crate::provider::{Endpoint, Provider, ProviderChain, ShapeError};
use crate::transport::{ProviderRequest, RawResponse};
use crate::types::Translation;
use crate::utils::PathMapper;
use crate::Result;

pub const GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";
pub const MYMEMORY_URL: &str = "https://api.mymemory.translated.net/get";

/// Source language reported when the provider does not detect one.
const AUTO: &str = "auto";

pub fn translate_chain(config: &FacadeConfig) -> ProviderChain<Translation> {
    ProviderChain::new(
        Capability::Translate,
        vec![
            Provider::new(
                "translate.google",
                config.endpoint("translate.google", GOOGLE_TRANSLATE_URL),
                build_google,
                normalize_google,
            ),
            Provider::new(
                "translate.mymemory",
                config.endpoint("translate.mymemory", MYMEMORY_URL),
                build_mymemory,
                normalize_mymemory,
            ),
        ],
    )
    .with_default("target_language", config.default_language.as_str())
}

fn target(req: &CapabilityRequest) -> Result<&str> {
    req.require("target_language")
}

fn build_google(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    Ok(ProviderRequest::get(endpoint.url.clone())
        .query("client", "gtx")
        .query("sl", AUTO)
        .query("tl", target(req)?)
        .query("dt", "t")
        .query("q", req.require("text")?))
}

/// `[[["Hola","Hello",..], ["mundo","world",..]], null, "en", ...]`: one entry per sentence.
fn normalize_google(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<Translation, ShapeError> {
    let segments = PathMapper::get_non_empty_array(&raw.body, "[0]")
        .ok_or_else(|| ShapeError::missing("[0]"))?;

    let translated: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|s| s.as_str()))
        .collect();
    if translated.trim().is_empty() {
        return Err(ShapeError::missing("[0][0][0]"));
    }

    Ok(Translation {
        translated_text: translated,
        source_language: PathMapper::get_string(&raw.body, "[2]").unwrap_or_else(|| AUTO.to_string()),
        target_language: req.get("target_language").unwrap_or_default().to_string(),
        provider: endpoint.provider_id.clone(),
    })
}

fn build_mymemory(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    Ok(ProviderRequest::get(endpoint.url.clone())
        .query("q", req.require("text")?)
        .query("langpair", format!("{}|{}", AUTO, target(req)?)))
}

fn normalize_mymemory(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<Translation, ShapeError> {
    if let Some(status) = PathMapper::get_u64(&raw.body, "responseStatus") {
        if status != 200 {
            let details = PathMapper::get_string(&raw.body, "responseDetails")
                .unwrap_or_else(|| format!("responseStatus {}", status));
            return Err(ShapeError::new(details));
        }
    }
    let translated = PathMapper::get_string(&raw.body, "responseData.translatedText")
        .ok_or_else(|| ShapeError::missing("responseData.translatedText"))?;

    Ok(Translation {
        translated_text: translated,
        source_language: AUTO.to_string(),
        target_language: req.get("target_language").unwrap_or_default().to_string(),
        provider: endpoint.provider_id.clone(),
    })
}
