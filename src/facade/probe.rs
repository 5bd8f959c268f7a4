//! Connectivity probe: one sample call per capability, run concurrently.

use super::ServiceFacade;
use crate::capability::Capability;
use crate::Result;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use serde::Serialize;
use std::time::Instant;

const SAMPLE_YOUTUBE_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
const SAMPLE_TIKTOK_URL: &str = "https://www.tiktok.com/@test/video/123";

#[derive(Debug, Clone, Serialize)]
pub struct ProbeEntry {
    pub capability: Capability,
    pub ok: bool,
    /// Provider that answered, when the call succeeded.
    pub provider: Option<String>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub entries: Vec<ProbeEntry>,
}

impl ProbeReport {
    pub fn all_ok(&self) -> bool {
        self.entries.iter().all(|e| e.ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProbeEntry> {
        self.entries.iter().filter(|e| !e.ok)
    }
}

async fn timed<F>(capability: Capability, call: F) -> ProbeEntry
where
    F: std::future::Future<Output = Result<String>>,
{
    let start = Instant::now();
    let outcome = call.await;
    let duration_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(provider) => ProbeEntry {
            capability,
            ok: true,
            provider: Some(provider),
            error: None,
            duration_ms,
        },
        Err(e) => ProbeEntry {
            capability,
            ok: false,
            provider: None,
            error: Some(e.to_string()),
            duration_ms,
        },
    }
}

pub(super) async fn run(facade: &ServiceFacade) -> ProbeReport {
    let checks: Vec<BoxFuture<'_, ProbeEntry>> = vec![
        timed(Capability::YoutubeDownload, async {
            Ok(facade.youtube_download(SAMPLE_YOUTUBE_URL, None).await?.provider)
        })
        .boxed(),
        timed(Capability::TiktokDownload, async {
            Ok(facade.tiktok_download(SAMPLE_TIKTOK_URL).await?.provider)
        })
        .boxed(),
        timed(Capability::Chat, async {
            Ok(facade.chat("Hola").await?.provider)
        })
        .boxed(),
        timed(Capability::TextToImage, async {
            Ok(facade.text_to_image("test").await?.provider)
        })
        .boxed(),
        timed(Capability::Translate, async {
            Ok(facade.translate("Hello world", None).await?.provider)
        })
        .boxed(),
    ];

    ProbeReport {
        entries: join_all(checks).await,
    }
}
