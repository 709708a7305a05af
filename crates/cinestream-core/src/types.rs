//! Core types for CineStream Core

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use url::Url;
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of title being played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Value sent to the stream resolver
    pub fn as_query_value(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_query_value())
    }
}

/// What is being played: enough to resolve streams and to label progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    /// Catalog identifier
    pub id: u64,
    /// Title used for stream resolution
    pub title: String,
    pub kind: MediaKind,
    /// Release year (movies only)
    pub year: Option<u16>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl MediaDescriptor {
    pub fn movie(id: u64, title: impl Into<String>, year: Option<u16>) -> Self {
        Self {
            id,
            title: title.into(),
            kind: MediaKind::Movie,
            year,
            season: None,
            episode: None,
        }
    }

    pub fn episode(id: u64, title: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            id,
            title: title.into(),
            kind: MediaKind::Series,
            year: None,
            season: Some(season),
            episode: Some(episode),
        }
    }

    /// Display label, e.g. `Show: S1E4`
    pub fn label(&self) -> String {
        match (self.season, self.episode) {
            (Some(s), Some(e)) => format!("{}: S{}E{}", self.title, s, e),
            _ => self.title.clone(),
        }
    }
}

/// An episode offered in the episode list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: u64,
    pub episode_number: u32,
    pub name: String,
    pub overview: String,
    pub still_path: Option<String>,
}

/// Quality tier ordinal (resolution height)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(pub u32);

impl Quality {
    /// Parse the leading digits of a quality label (`"720"`, `"720p"`)
    pub fn parse(label: &str) -> Option<Quality> {
        let digits: String = label
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok().map(Quality)
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}p", self.0)
    }
}

/// One offered stream source at a specific quality tier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamCandidate {
    pub quality: Quality,
    pub url: Url,
}

impl StreamCandidate {
    pub fn new(quality: u32, url: Url) -> Self {
        Self {
            quality: Quality(quality),
            url,
        }
    }
}

/// Mirror of the media sink's playback-relevant state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub is_buffering: bool,
    /// Seconds, never negative
    pub current_time: f64,
    /// Seconds, 0 when unknown
    pub duration: f64,
    /// End of the last buffered range in seconds
    pub buffered_end: f64,
}

impl PlaybackState {
    /// State before the first sink event: buffering at the resume offset
    pub fn starting_at(resume_offset: f64) -> Self {
        Self {
            is_buffering: true,
            current_time: sanitize_seconds(resume_offset),
            ..Default::default()
        }
    }

    /// Playback progress in [0, 1], 0 when the duration is unknown
    pub fn progress_fraction(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Buffered progress in [0, 1], 0 when the duration is unknown
    pub fn buffered_fraction(&self) -> f64 {
        if self.duration > 0.0 {
            (self.buffered_end / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Clamp to a finite, non-negative number of seconds
pub(crate) fn sanitize_seconds(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Modal overlays on the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modal {
    Settings,
    Subtitles,
    Episodes,
}

impl std::fmt::Display for Modal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Modal::Settings => write!(f, "settings"),
            Modal::Subtitles => write!(f, "subtitles"),
            Modal::Episodes => write!(f, "episodes"),
        }
    }
}

/// Playback speed multiplier, always finite and positive
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct PlaybackRate(f64);

impl PlaybackRate {
    pub const NORMAL: PlaybackRate = PlaybackRate(1.0);

    pub fn new(rate: f64) -> Result<Self> {
        if rate.is_finite() && rate > 0.0 {
            Ok(Self(rate))
        } else {
            Err(Error::InvalidPlaybackRate(rate))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TryFrom<f64> for PlaybackRate {
    type Error = Error;

    fn try_from(rate: f64) -> Result<Self> {
        PlaybackRate::new(rate)
    }
}

impl From<PlaybackRate> for f64 {
    fn from(rate: PlaybackRate) -> f64 {
        rate.0
    }
}

impl std::fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x", self.0)
    }
}

/// Observable state of the control overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSurfaceState {
    pub visible: bool,
    pub active_modal: Option<Modal>,
    pub playback_rate: PlaybackRate,
    pub selected_quality_url: Option<Url>,
}

impl Default for ControlSurfaceState {
    fn default() -> Self {
        Self {
            visible: true,
            active_modal: None,
            playback_rate: PlaybackRate::NORMAL,
            selected_quality_url: None,
        }
    }
}

/// Direction of a relative seek gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekDirection {
    Forward,
    Backward,
}

impl SeekDirection {
    pub fn sign(&self) -> f64 {
        match self {
            SeekDirection::Forward => 1.0,
            SeekDirection::Backward => -1.0,
        }
    }
}

/// Transient seek indicator; at most one is live per surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekFeedback {
    pub direction: SeekDirection,
    pub expires_at: Instant,
}

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient user-visible notification (toast)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    /// Machine code of the underlying error, if any
    pub code: Option<String>,
    pub message: String,
}

impl Notice {
    pub fn error(err: &Error) -> Self {
        Self {
            level: NoticeLevel::Error,
            code: Some(err.error_code().to_string()),
            message: err.user_message(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            code: None,
            message: message.into(),
        }
    }
}

/// Format seconds as `MM:SS`, or `HH:MM:SS` past the hour
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
