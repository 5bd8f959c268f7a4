//! OpenAI-compatible chat completion drivers.
//!
//! All three upstreams speak the OpenAI chat-completions dialect, so they share one
//! request builder and one normalizer and differ only in URL.

use super::{keys, ApiKeys};
use crate::capability::{Capability, CapabilityRequest};
use crate::config::FacadeConfig;
use crate::provider::{Endpoint, Provider, ProviderChain, ShapeError};
use crate::transport::{ProviderRequest, RawResponse};
use crate::types::{ChatReply, NO_RESPONSE};
use crate::utils::PathMapper;
use crate::Result;
use serde_json::json;

pub const PAWAN_URL: &str = "https://api.pawan.krd/chat/completions";
pub const CHATANYWHERE_URL: &str = "https://api.chatanywhere.com.cn/v1/chat/completions";
pub const CHURCHLESS_URL: &str = "https://free.churchless.tech/v1/chat/completions";

pub const CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const CHAT_TEMPERATURE: f64 = 0.7;

/// Bearer token sent when no `chat` key is configured; the free gateways accept it.
const FREE_KEY: &str = "free-key";

pub fn chat_chain(config: &FacadeConfig, api_keys: &ApiKeys) -> ProviderChain<ChatReply> {
    let key = api_keys.get(keys::CHAT);
    let provider = |id: &str, url: &str| {
        Provider::new(id, config.endpoint(id, url), build_completion, normalize_completion)
            .with_api_key(keys::CHAT, key.clone())
    };

    ProviderChain::new(
        Capability::Chat,
        vec![
            provider("chat.pawan", PAWAN_URL),
            provider("chat.chatanywhere", CHATANYWHERE_URL),
            provider("chat.churchless", CHURCHLESS_URL),
        ],
    )
}

fn build_completion(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    let token = endpoint.api_key.as_deref().unwrap_or(FREE_KEY);
    Ok(ProviderRequest::post(endpoint.url.clone())
        .header("Authorization", format!("Bearer {}", token))
        .json(json!({
            "model": CHAT_MODEL,
            "messages": [{"role": "user", "content": req.require("prompt")?}],
            "temperature": CHAT_TEMPERATURE,
        })))
}

fn normalize_completion(
    endpoint: &Endpoint,
    raw: &RawResponse,
    _req: &CapabilityRequest,
) -> std::result::Result<ChatReply, ShapeError> {
    if !raw.body.is_object() {
        return Err(ShapeError::new("expected a JSON object"));
    }

    let text = match PathMapper::first_string(&raw.body, &["choices[0].message.content", "result"]) {
        Some(text) => text,
        None => {
            if let Some(err) = PathMapper::first_string(&raw.body, &["error.message", "error"]) {
                return Err(ShapeError::new(format!("provider error: {}", err)));
            }
            NO_RESPONSE.to_string()
        }
    };

    Ok(ChatReply {
        text,
        provider: endpoint.provider_id.clone(),
    })
}
