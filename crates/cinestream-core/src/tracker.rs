//! Playback state tracker
//!
//! Mirrors sink events one-for-one into [`PlaybackState`] and publishes every
//! change on a `watch` channel. Purely event-driven, never polls the sink.

use crate::{
    sink::{ListenerId, MediaSink, SinkEvent, SinkListener},
    types::{sanitize_seconds, PlaybackState},
};
use tokio::sync::watch;
use tracing::{debug, trace};

pub struct PlaybackTracker {
    state: PlaybackState,
    state_tx: watch::Sender<PlaybackState>,
    listener: Option<ListenerId>,
}

impl PlaybackTracker {
    pub fn new(initial: PlaybackState) -> Self {
        let (state_tx, _) = watch::channel(initial);
        Self {
            state: initial,
            state_tx,
            listener: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state_tx.subscribe()
    }

    /// Replace the whole state, e.g. for a fresh load
    pub fn reset(&mut self, state: PlaybackState) {
        self.state = state;
        self.state_tx.send_replace(state);
    }

    /// Start observing `sink`; a previous subscription is released first
    pub fn attach(&mut self, sink: &mut dyn MediaSink, listener: SinkListener) {
        self.detach(sink);
        let id = sink.subscribe(listener);
        debug!(listener = id.0, "Tracker attached to sink");
        self.listener = Some(id);
    }

    /// Stop observing `sink`; returns true if a subscription was released
    pub fn detach(&mut self, sink: &mut dyn MediaSink) -> bool {
        match self.listener.take() {
            Some(id) => {
                sink.unsubscribe(id);
                debug!(listener = id.0, "Tracker detached from sink");
                true
            }
            None => false,
        }
    }

    /// Fold one sink event into the state; returns true if it changed
    pub fn apply(&mut self, event: &SinkEvent) -> bool {
        let before = self.state;
        let state = &mut self.state;

        match *event {
            SinkEvent::Play => state.is_playing = true,
            SinkEvent::Pause => state.is_playing = false,
            SinkEvent::TimeUpdate { current_time } => {
                state.current_time = sanitize_seconds(current_time)
            }
            SinkEvent::DurationChange { duration } => state.duration = sanitize_seconds(duration),
            SinkEvent::Waiting => state.is_buffering = true,
            SinkEvent::Playing => {
                state.is_buffering = false;
                state.is_playing = true;
            }
            SinkEvent::Progress { buffered_end } => {
                state.buffered_end = sanitize_seconds(buffered_end)
            }
            SinkEvent::LoadedMetadata => {}
        }

        let changed = before != self.state;
        if changed {
            trace!(?event, "Playback state updated");
            self.state_tx.send_replace(self.state);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_for_one_mapping() {
        let mut tracker = PlaybackTracker::new(PlaybackState::starting_at(0.0));
        assert!(tracker.state().is_buffering);

        tracker.apply(&SinkEvent::Play);
        assert!(tracker.state().is_playing);
        assert!(tracker.state().is_buffering);

        tracker.apply(&SinkEvent::Playing);
        assert!(tracker.state().is_playing);
        assert!(!tracker.state().is_buffering);

        tracker.apply(&SinkEvent::Waiting);
        assert!(tracker.state().is_buffering);

        tracker.apply(&SinkEvent::TimeUpdate { current_time: 12.5 });
        tracker.apply(&SinkEvent::DurationChange { duration: 3600.0 });
        tracker.apply(&SinkEvent::Progress { buffered_end: 40.0 });
        tracker.apply(&SinkEvent::Pause);

        let state = tracker.state();
        assert_eq!(state.current_time, 12.5);
        assert_eq!(state.duration, 3600.0);
        assert_eq!(state.buffered_end, 40.0);
        assert!(!state.is_playing);
    }

    #[test]
    fn test_unknown_duration_is_zero() {
        let mut tracker = PlaybackTracker::new(PlaybackState::default());
        tracker.apply(&SinkEvent::DurationChange { duration: f64::NAN });
        assert_eq!(tracker.state().duration, 0.0);
        tracker.apply(&SinkEvent::DurationChange { duration: f64::INFINITY });
        assert_eq!(tracker.state().duration, 0.0);
    }

    #[test]
    fn test_publishes_changes_only() {
        let mut tracker = PlaybackTracker::new(PlaybackState::default());
        let mut rx = tracker.subscribe();
        rx.mark_unchanged();

        assert!(!tracker.apply(&SinkEvent::LoadedMetadata));
        assert!(!rx.has_changed().unwrap());

        assert!(tracker.apply(&SinkEvent::TimeUpdate { current_time: 1.0 }));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().current_time, 1.0);
    }
}
