//! # bot-services
//!
//! 面向聊天机器人的多提供者服务门面：媒体下载、搜索、生成式 AI、翻译、短链与天气。
//!
//! A resilient multi-provider request facade for a messaging bot. Each capability
//! (media download, video and music search, chat, image generation and editing,
//! translation, URL shortening, weather) is one async function backed by an ordered
//! list of third-party HTTP providers.
//!
//! ## Overview
//!
//! A call validates its required arguments, then walks its providers strictly in
//! order: build the request, execute it once with the configured timeout, shape-check
//! the payload and normalize it. The first provider whose payload passes wins. When
//! every provider fails the call returns [`Error::UpstreamUnavailable`] naming the
//! capability and the last provider error.
//!
//! There is no caching, no retry inside a provider and no racing of providers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bot_services::ServiceFacade;
//!
//! #[tokio::main]
//! async fn main() -> bot_services::Result<()> {
//!     let facade = ServiceFacade::builder().build()?;
//!
//!     let track = facade.search_music("bohemian rhapsody").await?;
//!     println!("{} - {} ({} s)", track.artist, track.title, track.duration_secs);
//!
//!     let reply = facade.translate("Good morning", None).await?;
//!     println!("{}", reply.translated_text);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`facade`] | [`ServiceFacade`] and its builder, one method per capability |
//! | [`provider`] | Provider descriptors and the ordered fallback loop |
//! | [`drivers`] | Request builders and normalizers for every upstream API |
//! | [`transport`] | HTTP execution behind the [`transport::Transport`] trait |
//! | [`config`] | Defaults, YAML file, environment and keyring lookup |
//! | [`types`] | Normalized result types |

pub mod capability;
pub mod config;
pub mod drivers;
pub mod facade;
pub mod provider;
pub mod transport;
pub mod types;
pub mod utils;

pub use capability::{Capability, CapabilityRequest};
pub use config::FacadeConfig;
pub use facade::{FacadeBuilder, ProbeEntry, ProbeReport, ServiceFacade};
pub use provider::{Provider, ProviderChain, ShapeError};
pub use transport::{HttpTransport, Transport, TransportError};
pub use types::{
    ChatReply, GeneratedImage, MediaDownload, Platform, ProcessedImage, ShortUrl, Sticker, Track,
    Translation, VideoSearchResult, WeatherReport,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
