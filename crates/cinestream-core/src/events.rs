//! Inbound event bus of a player session
//!
//! Every input the session reacts to (sink events, handler events, fired
//! timers, host commands) arrives as one [`PlayerEvent`] on a single
//! unbounded channel and is processed in arrival order.

use crate::{
    handler::{HandlerEvent, HandlerId},
    sink::SinkEvent,
    timer::TimerRole,
    types::{Modal, SeekDirection},
};
use tokio::sync::mpsc;
use url::Url;

/// User or host initiated commands
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TogglePlay,
    Seek(SeekDirection),
    SeekTo(f64),
    /// Pointer movement or key press anywhere on the player
    Activity,
    /// Tap on the playback surface outside the control chrome
    TapSurface,
    OpenModal(Modal),
    CloseModal,
    SelectQuality(Url),
    SetPlaybackRate(f64),
    SelectEpisode(u64),
    ToggleFavorite,
    Download,
    Share,
    EnterPip,
    Teardown,
}

/// Everything a session can receive
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Sink(SinkEvent),
    Handler { id: HandlerId, event: HandlerEvent },
    Timer { role: TimerRole, generation: u64 },
    Command(Command),
}

/// Cloneable handle for posting commands to a running session
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    tx: mpsc::UnboundedSender<PlayerEvent>,
}

impl PlayerHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        Self { tx }
    }

    /// Post a command; returns false once the session is gone
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(PlayerEvent::Command(command)).is_ok()
    }
}
