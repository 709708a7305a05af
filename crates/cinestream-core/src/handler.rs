//! Segmented adaptive-streaming protocol handler abstraction
//!
//! The handler (an HLS engine) is consumed as a black box: it fetches the
//! manifest and segments, feeds the sink, and reports back through
//! [`HandlerEvents`]. Only the source binder creates, drives and destroys
//! handler instances.

use crate::{config::StreamingConfig, events::PlayerEvent, sink::MediaSink};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use url::Url;

/// Identity of one handler instance; never reused within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandlerId(pub u64);

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

/// Error category reported by the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerErrorKind {
    Network,
    Media,
    Other,
}

impl std::fmt::Display for HandlerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerErrorKind::Network => write!(f, "network"),
            HandlerErrorKind::Media => write!(f, "media"),
            HandlerErrorKind::Other => write!(f, "other"),
        }
    }
}

/// Error tagged with `{type, fatal}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerError {
    pub kind: HandlerErrorKind,
    pub fatal: bool,
    /// Handler-specific detail, e.g. `manifestLoadError`
    pub details: String,
}

impl HandlerError {
    pub fn new(kind: HandlerErrorKind, fatal: bool, details: impl Into<String>) -> Self {
        Self {
            kind,
            fatal,
            details: details.into(),
        }
    }
}

/// Events a handler reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HandlerEvent {
    /// The manifest was fetched and parsed
    ManifestParsed { levels: usize },
    Error(HandlerError),
}

/// Event channel handed to one handler instance
#[derive(Debug, Clone)]
pub struct HandlerEvents {
    id: HandlerId,
    tx: mpsc::UnboundedSender<PlayerEvent>,
}

impl HandlerEvents {
    pub(crate) fn new(id: HandlerId, tx: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Deliver an event; returns false once the session is gone
    pub fn emit(&self, event: HandlerEvent) -> bool {
        self.tx
            .send(PlayerEvent::Handler { id: self.id, event })
            .is_ok()
    }
}

/// A live segmented-protocol handler instance
pub trait ProtocolHandler {
    /// Start loading the manifest at `url`
    fn load_source(&mut self, url: &Url);

    /// Bind to the sink the handler feeds
    fn attach_media(&mut self, sink: &mut dyn MediaSink);

    /// Re-attach media after a decode error without tearing the handler down
    fn recover_media_error(&mut self);

    /// Stop all network activity and detach from the sink
    fn destroy(&mut self);
}

/// Constructs handler instances
pub trait HandlerFactory {
    /// Whether the platform can run the handler at all
    fn is_supported(&self) -> bool;

    fn create(&self, config: &StreamingConfig, events: HandlerEvents) -> Box<dyn ProtocolHandler>;
}

/// True when `url` names a segmented manifest rather than a progressive file
pub fn is_segmented_url(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    if path.ends_with(".m3u8") || path.ends_with(".m3u") {
        return true;
    }

    // Proxied manifests carry the extension in the query
    url.query()
        .map(|q| q.to_lowercase().contains(".m3u"))
        .unwrap_or(false)
}
