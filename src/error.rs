use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for configuration problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Configuration key or argument that caused the error (e.g., "api_keys.rapidapi")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected format, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "tiktok.rapidapi")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the service facade.
///
/// Every provider-level variant (`UpstreamTimeout`, `UpstreamMalformed`, `Remote`,
/// `Transport`, `Configuration`) moves a chain on to its next provider. Only
/// `InvalidArgument` and `UpstreamUnavailable` ever reach a caller from a capability call.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },

    #[error("Provider '{provider}' timed out after {timeout_ms} ms")]
    UpstreamTimeout { provider: String, timeout_ms: u64 },

    #[error("Provider '{provider}' returned an unexpected payload: {message}")]
    UpstreamMalformed { provider: String, message: String },

    #[error("Provider '{provider}' answered HTTP {status}: {message}")]
    Remote {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{capability}: all {attempts} provider(s) failed, last error: {message}")]
    UpstreamUnavailable {
        capability: String,
        attempts: usize,
        message: String,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] serde_yaml::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            argument: argument.into(),
            message: message.into(),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Attach the provider id to a transport failure.
    pub(crate) fn from_transport(provider: &str, err: TransportError) -> Self {
        match err {
            TransportError::Timeout(timeout) => Error::UpstreamTimeout {
                provider: provider.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            },
            TransportError::Status { status, body } => Error::Remote {
                provider: provider.to_string(),
                status,
                message: truncate(&body, 200),
            },
            TransportError::Decode(message) => Error::UpstreamMalformed {
                provider: provider.to_string(),
                message,
            },
            other => Error::Transport(other),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Whether the caller can recover by asking the user for different input.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument { .. })
    }

    /// Chat-ready text for the command layer. Never includes a backtrace.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidArgument { message, .. } => message.clone(),
            Error::UpstreamUnavailable {
                capability,
                message,
                ..
            } => format!(
                "The {} service is unavailable right now, try again later. ({})",
                capability, message
            ),
            other => format!("Something went wrong, try again later. ({})", other),
        }
    }
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
