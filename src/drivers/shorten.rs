//! URL shortener drivers. Both services answer with the short link as plain text.

use super::http_url;
use crate::capability::{Capability, CapabilityRequest};
use crate::config::FacadeConfig;
use crate::provider::{Endpoint, Provider, ProviderChain, ShapeError};
use crate::transport::{ProviderRequest, RawResponse, ResponseFormat};
use crate::types::ShortUrl;
use crate::Result;

pub const TINYURL_URL: &str = "https://tinyurl.com/api-create.php";
pub const ISGD_URL: &str = "https://is.gd/create.php";

pub fn shorten_chain(config: &FacadeConfig) -> ProviderChain<ShortUrl> {
    ProviderChain::new(
        Capability::ShortenUrl,
        vec![
            Provider::new(
                "shorten.tinyurl",
                config.endpoint("shorten.tinyurl", TINYURL_URL),
                build_tinyurl,
                normalize_plain,
            ),
            Provider::new(
                "shorten.isgd",
                config.endpoint("shorten.isgd", ISGD_URL),
                build_isgd,
                normalize_plain,
            ),
        ],
    )
}

fn build_tinyurl(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    Ok(ProviderRequest::get(endpoint.url.clone())
        .query("url", req.require("url")?)
        .expect(ResponseFormat::Text))
}

fn build_isgd(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    Ok(ProviderRequest::get(endpoint.url.clone())
        .query("format", "simple")
        .query("url", req.require("url")?)
        .expect(ResponseFormat::Text))
}

/// An error page or "Error" string is not a short link.
fn normalize_plain(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<ShortUrl, ShapeError> {
    let text = raw
        .body
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(ShortUrl {
        original_url: req.get("url").unwrap_or_default().to_string(),
        short_url: http_url(text, "short_url")?,
        provider: endpoint.provider_id.clone(),
    })
}
