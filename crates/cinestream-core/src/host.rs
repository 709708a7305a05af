//! Hooks the embedding page wires up
//!
//! The core never talks to the profile store or the navigation layer itself.
//! It reports through [`PlayerHost`], whose methods all default to no-ops.

use crate::types::{Episode, MediaKind, Notice};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// State handed over when playback moves to a picture-in-picture window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipSnapshot {
    pub stream_url: Url,
    pub current_time: f64,
    pub is_playing: bool,
}

/// Watch checkpoint reported when a session ends mid-title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchProgress {
    pub media_id: u64,
    pub kind: MediaKind,
    pub title: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub current_time: f64,
    pub duration: f64,
    pub recorded_at: DateTime<Utc>,
}

impl WatchProgress {
    /// Progress in percent
    pub fn percent(&self) -> f64 {
        if self.duration > 0.0 {
            self.current_time / self.duration * 100.0
        } else {
            0.0
        }
    }
}

pub trait PlayerHost {
    /// A transient notification should be shown
    fn on_notice(&mut self, _notice: Notice) {}

    fn on_toggle_favorite(&mut self) {}

    fn on_download(&mut self) {}

    fn on_share(&mut self) {}

    /// The user picked another episode from the list
    fn on_episode_select(&mut self, _episode: Episode) {}

    fn on_enter_pip(&mut self, _snapshot: PipSnapshot) {}

    /// Session ended with meaningful progress
    fn on_watch_progress(&mut self, _progress: WatchProgress) {}
}

/// Host that ignores every hook
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHost;

impl PlayerHost for NoopHost {}
