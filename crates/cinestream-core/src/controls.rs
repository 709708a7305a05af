//! Control-surface state machine
//!
//! ```text
//!            tap / timeout (playing, no modal)
//!   VisibleIdle ───────────────────────────────▶ Hidden
//!      ▲  │ open_modal                             │
//!      │  ▼                                        │ tap / activity
//!   Interacting(modal)                             │
//!      │ close / backdrop / commit                 │
//!      └───────────▶ VisibleIdle ◀─────────────────┘
//! ```
//!
//! The inactivity timer runs only in `VisibleIdle`. Modals live inside the
//! phase itself, so two modals can never be open at once.

use crate::{
    config::PlayerConfig,
    events::PlayerEvent,
    timer::{DeferredTask, TimerRole},
    types::{ControlSurfaceState, Modal, PlaybackRate, SeekDirection, SeekFeedback},
};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// Phase of the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPhase {
    Hidden,
    VisibleIdle,
    Interacting(Modal),
}

pub struct ControlSurface {
    phase: ControlPhase,
    playback_rate: PlaybackRate,
    selected_quality_url: Option<Url>,
    hide_delay: Duration,
    hide_timer: DeferredTask,
    feedback: Option<SeekFeedback>,
    feedback_duration: Duration,
    feedback_timer: DeferredTask,
    state_tx: watch::Sender<ControlSurfaceState>,
}

impl ControlSurface {
    pub fn new(config: &PlayerConfig, events: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        let (state_tx, _) = watch::channel(ControlSurfaceState::default());
        Self {
            phase: ControlPhase::VisibleIdle,
            playback_rate: PlaybackRate::NORMAL,
            selected_quality_url: None,
            hide_delay: config.controls_hide_delay(),
            hide_timer: DeferredTask::new(TimerRole::ControlsHide, events.clone()),
            feedback: None,
            feedback_duration: config.seek_feedback_duration(),
            feedback_timer: DeferredTask::new(TimerRole::SeekFeedback, events),
            state_tx,
        }
    }

    pub fn phase(&self) -> ControlPhase {
        self.phase
    }

    pub fn state(&self) -> ControlSurfaceState {
        ControlSurfaceState {
            visible: self.phase != ControlPhase::Hidden,
            active_modal: self.active_modal(),
            playback_rate: self.playback_rate,
            selected_quality_url: self.selected_quality_url.clone(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ControlSurfaceState> {
        self.state_tx.subscribe()
    }

    pub fn active_modal(&self) -> Option<Modal> {
        match self.phase {
            ControlPhase::Interacting(modal) => Some(modal),
            _ => None,
        }
    }

    pub fn is_hide_pending(&self) -> bool {
        self.hide_timer.is_pending()
    }

    pub fn seek_feedback(&self) -> Option<&SeekFeedback> {
        self.feedback.as_ref()
    }

    /// Pointer movement, key press or explicit toggle
    pub fn activity(&mut self) {
        if let ControlPhase::Interacting(_) = self.phase {
            return;
        }
        self.show_idle();
    }

    /// Tap on the playback surface outside chrome and modal content
    pub fn tap_surface(&mut self, is_playing: bool) {
        match self.phase {
            ControlPhase::Hidden => self.show_idle(),
            ControlPhase::VisibleIdle if is_playing => self.hide(),
            ControlPhase::VisibleIdle => self.show_idle(),
            // Outside the modal content is the backdrop
            ControlPhase::Interacting(_) => self.close_modal(),
        }
    }

    /// Open `modal`, closing any other; the surface stays up until it closes
    pub fn open_modal(&mut self, modal: Modal) {
        self.hide_timer.cancel();
        self.set_phase(ControlPhase::Interacting(modal));
    }

    /// Close the open modal (explicit close, backdrop tap or commit)
    pub fn close_modal(&mut self) {
        if let ControlPhase::Interacting(_) = self.phase {
            self.show_idle();
        }
    }

    /// Playback (re)started; arms auto-hide if nothing is pending
    pub fn playback_started(&mut self) {
        if self.phase == ControlPhase::VisibleIdle && !self.hide_timer.is_pending() {
            self.hide_timer.schedule(self.hide_delay);
        }
    }

    /// Inactivity timer fired
    pub fn on_hide_timer(&mut self, generation: u64, is_playing: bool) {
        if !self.hide_timer.accept(generation) {
            return;
        }
        if self.phase == ControlPhase::VisibleIdle && is_playing {
            self.hide();
        } else {
            debug!(phase = ?self.phase, is_playing, "Auto-hide skipped");
        }
    }

    /// Show or refresh the single seek indicator
    pub fn show_seek_feedback(&mut self, direction: SeekDirection) {
        let expires_at = Instant::now() + self.feedback_duration;
        match self.feedback.as_mut() {
            Some(live) => {
                live.direction = direction;
                live.expires_at = expires_at;
            }
            None => {
                self.feedback = Some(SeekFeedback {
                    direction,
                    expires_at,
                })
            }
        }
        self.feedback_timer.schedule(self.feedback_duration);
    }

    /// Seek-indicator timer fired
    pub fn on_feedback_timer(&mut self, generation: u64) {
        if self.feedback_timer.accept(generation) {
            self.feedback = None;
        }
    }

    pub fn set_playback_rate(&mut self, rate: PlaybackRate) {
        self.playback_rate = rate;
        self.publish();
    }

    pub fn set_selected_quality(&mut self, url: Option<Url>) {
        self.selected_quality_url = url;
        self.publish();
    }

    /// Cancel every pending timer and drop transient feedback
    pub fn teardown(&mut self) {
        self.hide_timer.cancel();
        self.feedback_timer.cancel();
        self.feedback = None;
    }

    fn show_idle(&mut self) {
        self.hide_timer.schedule(self.hide_delay);
        self.set_phase(ControlPhase::VisibleIdle);
    }

    fn hide(&mut self) {
        self.hide_timer.cancel();
        self.set_phase(ControlPhase::Hidden);
    }

    fn set_phase(&mut self, phase: ControlPhase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "Control surface transition");
            self.phase = phase;
            self.publish();
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state());
    }
}
