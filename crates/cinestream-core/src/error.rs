//! Error types for CineStream Core

use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Resolver errors
    #[error("Stream resolver failed: {0}")]
    Resolver(String),

    #[error("No stream links found")]
    NoCandidates,

    #[error("Stream resolver returned HTTP {status}: {body}")]
    ResolverStatus { status: u16, body: String },

    #[cfg(feature = "scraper")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid stream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // Streaming errors
    #[error("Stream network failure: {details}")]
    StreamNetwork { details: String },

    #[error("Stream decode failure: {details}")]
    StreamDecode { details: String },

    #[error("Stream failure: {details}")]
    StreamFailed { details: String },

    #[error("Playback start rejected: {0}")]
    PlaybackStartRejected(String),

    // Control errors
    #[error("Unknown stream candidate: {url}")]
    UnknownCandidate { url: String },

    #[error("No source is bound")]
    NoActiveSource,

    #[error("Invalid playback rate: {0}")]
    InvalidPlaybackRate(f64),

    #[error("Session has been torn down")]
    SessionClosed,

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a resolver error
    pub fn resolver(msg: impl Into<String>) -> Self {
        Error::Resolver(msg.into())
    }

    /// Returns true if the error belongs to the resolver class
    pub fn is_resolver_error(&self) -> bool {
        match self {
            Error::Resolver(_) | Error::NoCandidates | Error::ResolverStatus { .. } => true,
            #[cfg(feature = "scraper")]
            Error::Network(_) => true,
            _ => false,
        }
    }

    /// Returns false for failures that degrade silently instead of reaching the user
    pub fn is_surfaced(&self) -> bool {
        !matches!(self, Error::PlaybackStartRejected(_))
    }

    /// Message shown to the user in a transient notice
    pub fn user_message(&self) -> String {
        match self {
            Error::StreamNetwork { .. } => "Failed to load video.".to_string(),
            Error::StreamDecode { .. } => {
                "Error decoding video. Please try again.".to_string()
            }
            Error::StreamFailed { .. } => "Failed to load video.".to_string(),
            Error::NoCandidates => "No stream links found.".to_string(),
            Error::Resolver(msg) if !msg.is_empty() => msg.clone(),
            Error::Resolver(_) => "Failed to load video.".to_string(),
            other => other.to_string(),
        }
    }

    /// Returns the error code for logs and notices
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Resolver(_) => "RESOLVER",
            Error::NoCandidates => "NO_CANDIDATES",
            Error::ResolverStatus { .. } => "RESOLVER_STATUS",
            #[cfg(feature = "scraper")]
            Error::Network(_) => "NETWORK",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::StreamNetwork { .. } => "STREAM_NETWORK",
            Error::StreamDecode { .. } => "STREAM_DECODE",
            Error::StreamFailed { .. } => "STREAM_FAILED",
            Error::PlaybackStartRejected(_) => "PLAY_REJECTED",
            Error::UnknownCandidate { .. } => "UNKNOWN_CANDIDATE",
            Error::NoActiveSource => "NO_SOURCE",
            Error::InvalidPlaybackRate(_) => "INVALID_RATE",
            Error::SessionClosed => "SESSION_CLOSED",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
        }
    }
}
