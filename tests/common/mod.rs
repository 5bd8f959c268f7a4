//! Mock HTTP server setup for integration tests

#![allow(dead_code)]

use bot_services::{FacadeBuilder, FacadeConfig, ServiceFacade};
use mockito::{Matcher, Mock, Server, ServerGuard};

/// Providers routed to `/<group>/<name>` on the mock server. The aggregator-backed
/// providers follow `base_url_override` instead.
pub const ROUTED_PROVIDERS: &[&str] = &[
    "youtube.y2mate",
    "youtube.cobalt",
    "tiktok.ssstik",
    "tiktok.rapidapi",
    "instagram.rapidapi",
    "instagram.scraper",
    "search.youtube-api",
    "music.deezer",
    "music.itunes",
    "chat.pawan",
    "chat.chatanywhere",
    "chat.churchless",
    "image.pollinations",
    "image.pollinations-image",
    "removebg.remove-bg",
    "removebg.rapidapi",
    "translate.google",
    "translate.mymemory",
    "shorten.tinyurl",
    "shorten.isgd",
    "weather.openweathermap",
    "weather.wttr",
];

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Path the fixture routes `provider_id` to.
    pub fn path_for(provider_id: &str) -> String {
        format!("/{}", provider_id.replace('.', "/"))
    }

    /// Builder with every provider pointed at the mock server and no ambient keys.
    pub fn builder(&self) -> FacadeBuilder {
        let config = FacadeConfig {
            timeout_secs: 5,
            use_env_keys: false,
            use_keyring: false,
            ..FacadeConfig::default()
        };
        ROUTED_PROVIDERS.iter().fold(
            ServiceFacade::builder()
                .config(config)
                .base_url_override(&self.base_url),
            |builder, id| {
                builder.endpoint(*id, format!("{}{}", self.base_url, Self::path_for(id)))
            },
        )
    }

    pub fn facade(&self) -> ServiceFacade {
        self.builder().build().expect("facade builds")
    }

    /// JSON response for `method` on a provider's route, any query string, expected `hits` times.
    pub async fn mock_json(
        &mut self,
        method: &str,
        provider_id: &str,
        status: usize,
        body: &str,
        hits: usize,
    ) -> Mock {
        self.server
            .mock(method, Self::path_for(provider_id).as_str())
            .match_query(Matcher::Any)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    /// Plain-text response on a provider's route, any query string.
    pub async fn mock_text(
        &mut self,
        provider_id: &str,
        status: usize,
        body: &str,
        hits: usize,
    ) -> Mock {
        self.server
            .mock("GET", Self::path_for(provider_id).as_str())
            .match_query(Matcher::Any)
            .with_status(status)
            .with_header("content-type", "text/plain")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }
}
