//! Media sink abstraction
//!
//! The sink is the renderable surface (a video element, a native pipeline).
//! The core only issues commands to it and observes the events it emits
//! through registered [`SinkListener`]s.

use crate::events::PlayerEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use url::Url;

/// Events emitted by a media sink
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SinkEvent {
    /// Playback was requested (`play`)
    Play,
    /// Playback paused (`pause`)
    Pause,
    /// Position advanced (`timeupdate`)
    TimeUpdate { current_time: f64 },
    /// Duration became known or changed (`durationchange`)
    DurationChange { duration: f64 },
    /// Stalled waiting for data (`waiting`)
    Waiting,
    /// Frames are being rendered (`playing`)
    Playing,
    /// More data was buffered (`progress`)
    Progress { buffered_end: f64 },
    /// Metadata of a directly assigned source is available (`loadedmetadata`)
    LoadedMetadata,
}

/// Identifier of a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Delivery end of a sink subscription
///
/// Sink implementations keep the listeners they were handed and call
/// [`SinkListener::emit`] for every event, in emission order.
#[derive(Debug, Clone)]
pub struct SinkListener {
    tx: mpsc::UnboundedSender<PlayerEvent>,
}

impl SinkListener {
    pub(crate) fn new(tx: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        Self { tx }
    }

    /// Deliver an event; returns false once the session is gone
    pub fn emit(&self, event: SinkEvent) -> bool {
        self.tx.send(PlayerEvent::Sink(event)).is_ok()
    }
}

/// Rejection of a playback start (e.g. autoplay policy)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRejected(pub String);

impl std::fmt::Display for PlayRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A renderable media surface
pub trait MediaSink {
    /// Assign a direct (progressive) source
    fn set_source(&mut self, url: &Url);

    /// Drop any directly assigned source
    fn clear_source(&mut self);

    /// Begin loading the assigned source
    fn load(&mut self);

    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    /// Duration in seconds; NaN or 0 when unknown
    fn duration(&self) -> f64;

    fn is_paused(&self) -> bool;

    /// Request playback start
    fn play(&mut self) -> std::result::Result<(), PlayRejected>;

    fn pause(&mut self);

    fn set_playback_rate(&mut self, rate: f64);

    fn set_muted(&mut self, muted: bool);

    /// Register a listener for all [`SinkEvent`]s
    fn subscribe(&mut self, listener: SinkListener) -> ListenerId;

    /// Remove a listener; unknown ids are ignored
    fn unsubscribe(&mut self, id: ListenerId);
}
