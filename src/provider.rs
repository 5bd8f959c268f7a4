//! 提供者链：按固定优先级依次尝试，第一个通过形状检查的响应胜出。
//!
//! Provider descriptors and the ordered fallback loop shared by every capability.
//!
//! A [`ProviderChain`] walks its providers strictly in order, one at a time:
//! build the request, execute it once, shape-check and normalize the payload.
//! Any failure moves on to the next provider; there is no retry within a provider.
//! An invalid argument is the caller's fault and stops the chain as-is.

use crate::capability::{Capability, CapabilityRequest};
use crate::transport::{ProviderRequest, RawResponse, Transport};
use crate::{Error, ErrorContext, Result};
use std::borrow::Cow;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Maps a capability request to the concrete HTTP call for one provider.
pub type BuildFn = fn(&Endpoint, &CapabilityRequest) -> Result<ProviderRequest>;

/// Shape-checks a raw payload and converts it into the capability's result type.
pub type NormalizeFn<T> =
    fn(&Endpoint, &RawResponse, &CapabilityRequest) -> std::result::Result<T, ShapeError>;

/// A payload that failed the minimal structural check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ShapeError(pub String);

impl ShapeError {
    pub fn new(msg: impl Into<String>) -> Self {
        ShapeError(msg.into())
    }

    pub fn missing(field: &str) -> Self {
        ShapeError(format!("missing field '{}'", field))
    }
}

/// Where a provider lives and how it authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Stable id, `<capability-group>.<provider>` (e.g. `tiktok.ssstik`).
    pub provider_id: String,
    pub url: String,
    pub key_name: Option<&'static str>,
    pub api_key: Option<String>,
}

impl Endpoint {
    /// The resolved API key, or a configuration error naming the missing key.
    pub fn require_key(&self) -> Result<&str> {
        let name = self.key_name.unwrap_or("api_key");
        self.api_key.as_deref().ok_or_else(|| {
            Error::configuration_with_context(
                format!("provider '{}' needs an API key", self.provider_id),
                ErrorContext::new()
                    .with_field_path(format!("api_keys.{}", name))
                    .with_details(format!(
                        "set it in the config file or {}_API_KEY",
                        name.to_uppercase()
                    ))
                    .with_source(self.provider_id.clone()),
            )
        })
    }
}

/// One upstream API implementing a capability.
pub struct Provider<T> {
    pub endpoint: Endpoint,
    build: BuildFn,
    normalize: NormalizeFn<T>,
}

impl<T> Provider<T> {
    pub fn new(
        provider_id: impl Into<String>,
        url: impl Into<String>,
        build: BuildFn,
        normalize: NormalizeFn<T>,
    ) -> Self {
        Self {
            endpoint: Endpoint {
                provider_id: provider_id.into(),
                url: url.into(),
                key_name: None,
                api_key: None,
            },
            build,
            normalize,
        }
    }

    pub fn with_api_key(mut self, key_name: &'static str, api_key: Option<String>) -> Self {
        self.endpoint.key_name = Some(key_name);
        self.endpoint.api_key = api_key;
        self
    }

    pub fn id(&self) -> &str {
        &self.endpoint.provider_id
    }

    pub fn build_request(&self, request: &CapabilityRequest) -> Result<ProviderRequest> {
        (self.build)(&self.endpoint, request)
    }

    pub fn normalize(
        &self,
        raw: &RawResponse,
        request: &CapabilityRequest,
    ) -> std::result::Result<T, ShapeError> {
        (self.normalize)(&self.endpoint, raw, request)
    }
}

impl<T> fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.endpoint.provider_id)
            .field("url", &self.endpoint.url)
            .field("has_api_key", &self.endpoint.api_key.is_some())
            .finish()
    }
}

/// Providers of one capability in fixed priority order.
#[derive(Debug)]
pub struct ProviderChain<T> {
    capability: Capability,
    providers: Vec<Provider<T>>,
    /// Values for optional parameters the caller left blank.
    defaults: Vec<(&'static str, String)>,
}

impl<T> ProviderChain<T> {
    pub fn new(capability: Capability, providers: Vec<Provider<T>>) -> Self {
        Self {
            capability,
            providers,
            defaults: Vec::new(),
        }
    }

    /// Use `value` for `param` whenever a request leaves it missing or blank.
    pub fn with_default(mut self, param: &'static str, value: impl Into<String>) -> Self {
        self.defaults.push((param, value.into()));
        self
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    fn apply_defaults<'a>(&self, request: &'a CapabilityRequest) -> Cow<'a, CapabilityRequest> {
        let mut request = Cow::Borrowed(request);
        for (param, value) in &self.defaults {
            if request.get(param).is_none() {
                let filled = (*request).clone().param(*param, value.as_str());
                request = Cow::Owned(filled);
            }
        }
        request
    }

    /// Validate `request`, then try each provider in order until one succeeds.
    pub async fn execute(&self, transport: &dyn Transport, request: &CapabilityRequest) -> Result<T> {
        let request = self.apply_defaults(request);
        let request = &*request;
        request.validate()?;

        let capability = self.capability.name();
        let mut last_error: Option<Error> = None;

        for (attempt, provider) in self.providers.iter().enumerate() {
            let request_id = Uuid::new_v4().to_string();
            let start = Instant::now();
            debug!(
                capability,
                provider = provider.id(),
                attempt,
                request_id = request_id.as_str(),
                "bot-services attempt started"
            );

            match self.attempt(provider, transport, request, &request_id).await {
                Ok(result) => {
                    info!(
                        capability,
                        provider = provider.id(),
                        attempt,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "bot-services request succeeded"
                    );
                    return Ok(result);
                }
                Err(e) if e.is_invalid_argument() => {
                    warn!(
                        capability,
                        provider = provider.id(),
                        request_id = request_id.as_str(),
                        error = %e,
                        "bot-services rejected the request arguments"
                    );
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        capability,
                        provider = provider.id(),
                        attempt,
                        request_id = request_id.as_str(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        error = %e,
                        "bot-services provider failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no providers configured".to_string());
        warn!(
            capability,
            attempts = self.providers.len(),
            "bot-services exhausted all providers"
        );
        Err(Error::UpstreamUnavailable {
            capability: capability.to_string(),
            attempts: self.providers.len(),
            message,
        })
    }

    async fn attempt(
        &self,
        provider: &Provider<T>,
        transport: &dyn Transport,
        request: &CapabilityRequest,
        request_id: &str,
    ) -> Result<T> {
        let http = provider
            .build_request(request)?
            .header("x-request-id", request_id);

        let raw = transport
            .execute(&http)
            .await
            .map_err(|e| Error::from_transport(provider.id(), e))?;
        debug!(
            provider = provider.id(),
            request_id,
            method = http.method.as_str(),
            status = raw.status,
            url = raw.url.as_str(),
            "bot-services response received"
        );

        provider
            .normalize(&raw, request)
            .map_err(|e| Error::UpstreamMalformed {
                provider: provider.id().to_string(),
                message: e.0,
            })
    }
}
