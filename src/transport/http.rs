use super::{Method, ProviderRequest, RawResponse, RequestBody, ResponseFormat, Transport, TransportError};
use crate::config::FacadeConfig;
use crate::Result;
use async_trait::async_trait;
use reqwest::Proxy;
use std::env;
use std::time::Duration;

/// `reqwest`-backed transport shared by every provider of a facade.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &FacadeConfig) -> Result<Self> {
        let timeout = config.timeout();

        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.as_str())
            .pool_max_idle_per_host(
                env::var("BOT_SERVICES_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(8),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = config.proxy_url.as_deref() {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                crate::Error::configuration_with_context(
                    format!("invalid proxy url: {}", e),
                    crate::ErrorContext::new()
                        .with_field_path("proxy_url")
                        .with_source("http_transport"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client, timeout })
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Http(err)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ProviderRequest) -> std::result::Result<RawResponse, TransportError> {
        let mut req = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
            Method::Head => self.client.head(&request.url),
        };

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        for (k, v) in &request.headers {
            req = req.header(k.as_str(), v.as_str());
        }

        req = match &request.body {
            Some(RequestBody::Json(body)) => req.json(body),
            Some(RequestBody::Form(fields)) => req.form(fields),
            None => req,
        };

        let resp = req.send().await.map_err(|e| self.classify(e))?;
        let status = resp.status().as_u16();
        let url = resp.url().to_string();

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let body = match request.expect {
            ResponseFormat::Empty => serde_json::Value::Null,
            ResponseFormat::Text => {
                serde_json::Value::String(resp.text().await.map_err(|e| self.classify(e))?)
            }
            ResponseFormat::Json => {
                let text = resp.text().await.map_err(|e| self.classify(e))?;
                serde_json::from_str(&text)
                    .map_err(|e| TransportError::Decode(format!("invalid JSON: {}", e)))?
            }
        };

        Ok(RawResponse { status, url, body })
    }
}
