//! Cancellable deferred tasks scoped to a player session
//!
//! Each timer role owns at most one pending task. Firing is reported as a
//! [`PlayerEvent::Timer`] carrying the generation it was scheduled under;
//! cancelling or rescheduling bumps the generation, so a firing that was
//! already queued is recognised as stale and dropped.

use crate::events::PlayerEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Purpose of a deferred task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerRole {
    /// Auto-hide of the control surface
    ControlsHide,
    /// Expiry of the seek indicator
    SeekFeedback,
}

/// Slot holding at most one pending task for a role
#[derive(Debug)]
pub struct DeferredTask {
    role: TimerRole,
    generation: u64,
    handle: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<PlayerEvent>,
}

impl DeferredTask {
    pub fn new(role: TimerRole, tx: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        Self {
            role,
            generation: 0,
            handle: None,
            tx,
        }
    }

    pub fn role(&self) -> TimerRole {
        self.role
    }

    /// Replace any pending task with one firing after `delay`
    pub fn schedule(&mut self, delay: Duration) {
        self.cancel();

        let role = self.role;
        let generation = self.generation;
        let tx = self.tx.clone();
        trace!(?role, generation, delay_ms = delay.as_millis() as u64, "Timer scheduled");

        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(PlayerEvent::Timer { role, generation });
        }));
    }

    /// Cancel the pending task; returns true if one was pending
    pub fn cancel(&mut self) -> bool {
        self.generation = self.generation.wrapping_add(1);
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                trace!(role = ?self.role, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.is_some()
    }

    /// Accept a firing; true only for the currently pending generation
    pub fn accept(&mut self, generation: u64) -> bool {
        if self.handle.is_some() && generation == self.generation {
            self.handle = None;
            true
        } else {
            false
        }
    }
}

impl Drop for DeferredTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
