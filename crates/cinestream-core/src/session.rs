//! Player Session - orchestrator for one mounted player
//!
//! Coordinates:
//! - Candidate resolution and the fast-start bind
//! - Sink and handler events through the tracker and recovery policy
//! - Control-surface transitions and their timers
//! - Quality switches, host hooks and teardown
//!
//! The session is single-owner and single-threaded. Everything it reacts to
//! arrives as a [`PlayerEvent`] on its own channel, either processed by
//! [`PlayerSession::run`] or pumped with [`PlayerSession::drain_pending`].

use crate::{
    binder::{BinderStats, BoundSource, SourceBinder, StartOutcome},
    config::PlayerConfig,
    controls::{ControlPhase, ControlSurface},
    events::{Command, PlayerEvent, PlayerHandle},
    handler::{HandlerEvent, HandlerFactory, HandlerId},
    host::{PipSnapshot, PlayerHost, WatchProgress},
    recovery::{RecoveryAction, RecoveryPolicy},
    resolver::{resolve_candidates, CandidateSet, ResolveRequest, StreamResolver},
    sink::{MediaSink, SinkEvent, SinkListener},
    timer::TimerRole,
    tracker::PlaybackTracker,
    types::*,
    Error, Result,
};
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, trace, warn};
use url::Url;

/// Player session managing a single playback surface
pub struct PlayerSession {
    /// Unique session ID
    id: SessionId,
    config: PlayerConfig,
    /// Title being played
    media: MediaDescriptor,
    sink: Box<dyn MediaSink>,
    /// Sole owner of the protocol handler
    binder: SourceBinder,
    tracker: PlaybackTracker,
    controls: ControlSurface,
    policy: RecoveryPolicy,
    /// Ranked candidates; `None` for a direct load
    candidates: Option<CandidateSet>,
    episodes: Vec<Episode>,
    host: Box<dyn PlayerHost>,
    tx: mpsc::UnboundedSender<PlayerEvent>,
    rx: mpsc::UnboundedReceiver<PlayerEvent>,
    last_notice: Option<Notice>,
    torn_down: bool,
}

impl PlayerSession {
    /// Create a session and start observing `sink`
    pub fn new(
        config: PlayerConfig,
        media: MediaDescriptor,
        mut sink: Box<dyn MediaSink>,
        factory: Box<dyn HandlerFactory>,
        host: Box<dyn PlayerHost>,
    ) -> Result<Self> {
        config.validate()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut tracker = PlaybackTracker::new(PlaybackState::default());
        tracker.attach(sink.as_mut(), SinkListener::new(tx.clone()));

        let id = SessionId::new();
        info!(session_id = %id, media = %media.label(), "Player session created");

        Ok(Self {
            id,
            binder: SourceBinder::new(factory, config.streaming.clone(), tx.clone()),
            controls: ControlSurface::new(&config, tx.clone()),
            config,
            media,
            sink,
            tracker,
            policy: RecoveryPolicy::new(),
            candidates: None,
            episodes: Vec::new(),
            host,
            tx,
            rx,
            last_notice: None,
            torn_down: false,
        })
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn media(&self) -> &MediaDescriptor {
        &self.media
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Handle for posting commands from the host
    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle::new(self.tx.clone())
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.tracker.state()
    }

    pub fn control_state(&self) -> ControlSurfaceState {
        self.controls.state()
    }

    pub fn control_phase(&self) -> ControlPhase {
        self.controls.phase()
    }

    /// Subscribe to playback state changes
    pub fn subscribe_playback(&self) -> watch::Receiver<PlaybackState> {
        self.tracker.subscribe()
    }

    /// Subscribe to control-surface changes
    pub fn subscribe_controls(&self) -> watch::Receiver<ControlSurfaceState> {
        self.controls.subscribe()
    }

    pub fn seek_feedback(&self) -> Option<SeekFeedback> {
        self.controls.seek_feedback().copied()
    }

    pub fn candidates(&self) -> Option<&CandidateSet> {
        self.candidates.as_ref()
    }

    /// Qualities offered in the settings modal, lowest first
    pub fn quality_options(&self) -> &[StreamCandidate] {
        self.candidates
            .as_ref()
            .map(|c| c.as_slice())
            .unwrap_or_default()
    }

    pub fn bound_source(&self) -> Option<&BoundSource> {
        self.binder.bound()
    }

    pub fn binder_stats(&self) -> BinderStats {
        self.binder.stats()
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    /// Most recent notice shown to the user
    pub fn last_notice(&self) -> Option<&Notice> {
        self.last_notice.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Resolve candidates and bind the lowest quality
    ///
    /// Resolver failures are surfaced as a notice and returned; playback
    /// never starts in that case.
    #[instrument(skip(self, resolver), fields(session_id = %self.id, title = %self.media.title))]
    pub async fn load(&mut self, resolver: &dyn StreamResolver, resume_offset: f64) -> Result<()> {
        self.ensure_open()?;

        let request = ResolveRequest::from(&self.media);
        let candidates = match resolve_candidates(resolver, &request).await {
            Ok(set) => set,
            Err(e) => {
                error!(error = %e, code = e.error_code(), "Stream resolution failed");
                self.surface(&e);
                return Err(e);
            }
        };

        let first = candidates.lowest().clone();
        self.candidates = Some(candidates);
        self.tracker.reset(PlaybackState::starting_at(resume_offset));
        self.bind(&first.url, Some(first.quality), resume_offset);
        Ok(())
    }

    /// Bind a known stream without consulting the resolver
    #[instrument(skip(self, url), fields(session_id = %self.id, url = %url))]
    pub fn load_direct(&mut self, url: &Url, resume_offset: f64) -> Result<()> {
        self.ensure_open()?;

        self.candidates = None;
        self.tracker.reset(PlaybackState::starting_at(resume_offset));
        self.bind(url, None, resume_offset);
        Ok(())
    }

    fn bind(&mut self, url: &Url, quality: Option<Quality>, resume_offset: f64) {
        self.policy.reset();
        self.binder
            .bind(self.sink.as_mut(), url, quality, resume_offset);
        self.controls.set_selected_quality(Some(url.clone()));
    }

    /// Process every queued event without waiting; returns how many were taken
    pub fn drain_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.handle_event(event);
            processed += 1;
        }
        processed
    }

    /// Process events as they arrive until the session is torn down
    pub async fn run(&mut self) {
        while !self.torn_down {
            match self.rx.recv().await {
                Some(event) => self.handle_event(event),
                None => break,
            }
        }
        debug!(session_id = %self.id, "Event loop finished");
    }

    /// Dispatch one inbound event
    pub fn handle_event(&mut self, event: PlayerEvent) {
        if self.torn_down {
            trace!(?event, "Dropping event after teardown");
            return;
        }

        match event {
            PlayerEvent::Sink(event) => self.on_sink_event(event),
            PlayerEvent::Handler { id, event } => self.on_handler_event(id, event),
            PlayerEvent::Timer { role, generation } => match role {
                TimerRole::ControlsHide => {
                    let is_playing = self.tracker.state().is_playing;
                    self.controls.on_hide_timer(generation, is_playing);
                }
                TimerRole::SeekFeedback => self.controls.on_feedback_timer(generation),
            },
            PlayerEvent::Command(command) => self.on_command(command),
        }
    }

    fn on_sink_event(&mut self, event: SinkEvent) {
        self.tracker.apply(&event);

        match event {
            SinkEvent::Play | SinkEvent::Playing => self.controls.playback_started(),
            SinkEvent::LoadedMetadata => {
                let outcome = self.binder.on_metadata_loaded(self.sink.as_mut());
                self.on_start_outcome(outcome);
            }
            _ => {}
        }
    }

    fn on_handler_event(&mut self, id: HandlerId, event: HandlerEvent) {
        if !self.binder.is_current(id) {
            debug!(handler = %id, "Discarding event from stale handler");
            return;
        }

        match event {
            HandlerEvent::ManifestParsed { levels } => {
                debug!(handler = %id, levels, "Manifest parsed");
                let outcome = self.binder.on_manifest_parsed(self.sink.as_mut(), id);
                self.on_start_outcome(outcome);
            }
            HandlerEvent::Error(err) => match self.policy.decide(&err) {
                RecoveryAction::Ignore => {}
                RecoveryAction::RecoverMedia => {
                    self.binder.recover_media_error(id);
                }
                RecoveryAction::Surface(e) => {
                    error!(handler = %id, error = %e, code = e.error_code(), "Fatal stream error");
                    self.surface(&e);
                }
            },
        }
    }

    fn on_start_outcome(&mut self, outcome: StartOutcome) {
        match outcome {
            StartOutcome::NotApplicable => {}
            StartOutcome::Started => debug!(session_id = %self.id, "Playback started"),
            StartOutcome::Rejected(e) => {
                info!(code = e.error_code(), "Start rejected, waiting for user play");
            }
        }
    }

    fn on_command(&mut self, command: Command) {
        trace!(?command, "Command received");
        let result = match command {
            Command::TogglePlay => {
                self.toggle_play();
                Ok(())
            }
            Command::Seek(direction) => {
                self.seek(direction);
                Ok(())
            }
            Command::SeekTo(seconds) => {
                self.seek_to(seconds);
                Ok(())
            }
            Command::Activity => {
                self.activity();
                Ok(())
            }
            Command::TapSurface => {
                self.tap_surface();
                Ok(())
            }
            Command::OpenModal(modal) => {
                self.open_modal(modal);
                Ok(())
            }
            Command::CloseModal => {
                self.close_modal();
                Ok(())
            }
            Command::SelectQuality(url) => self.select_quality(&url),
            Command::SetPlaybackRate(rate) => self.set_playback_rate(rate),
            Command::SelectEpisode(id) => {
                self.select_episode(id);
                Ok(())
            }
            Command::ToggleFavorite => {
                self.toggle_favorite();
                Ok(())
            }
            Command::Download => {
                self.download();
                Ok(())
            }
            Command::Share => {
                self.share();
                Ok(())
            }
            Command::EnterPip => self.enter_pip(),
            Command::Teardown => {
                self.teardown();
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!(error = %e, code = e.error_code(), "Command failed");
        }
    }

    /// Play when paused, pause otherwise
    pub fn toggle_play(&mut self) {
        if self.torn_down {
            return;
        }
        if self.sink.is_paused() {
            if let Err(rejected) = self.sink.play() {
                info!(reason = %rejected, "Play request rejected");
            }
        } else {
            self.sink.pause();
        }
        self.controls.activity();
    }

    /// Jump by the configured step and show the seek indicator
    pub fn seek(&mut self, direction: SeekDirection) {
        if self.torn_down {
            return;
        }
        let step = self.config.seek_step_secs * direction.sign();
        let mut target = (self.sink.current_time() + step).max(0.0);
        let duration = sanitize_seconds(self.sink.duration());
        if duration > 0.0 {
            target = target.min(duration);
        }

        self.sink.set_current_time(target);
        self.controls.show_seek_feedback(direction);
        self.controls.activity();
    }

    /// Absolute seek from the progress bar; ignored while the duration is unknown
    pub fn seek_to(&mut self, seconds: f64) -> bool {
        if self.torn_down {
            return false;
        }
        let duration = sanitize_seconds(self.sink.duration());
        if duration <= 0.0 {
            debug!(seconds, "Seek ignored, duration unknown");
            return false;
        }

        self.sink
            .set_current_time(sanitize_seconds(seconds).min(duration));
        self.controls.activity();
        true
    }

    /// Pointer movement or key press
    pub fn activity(&mut self) {
        if !self.torn_down {
            self.controls.activity();
        }
    }

    /// Tap on the playback surface outside the chrome
    pub fn tap_surface(&mut self) {
        if !self.torn_down {
            let is_playing = self.tracker.state().is_playing;
            self.controls.tap_surface(is_playing);
        }
    }

    /// Open `modal`; the episode list only exists for series
    pub fn open_modal(&mut self, modal: Modal) -> bool {
        if self.torn_down {
            return false;
        }
        if modal == Modal::Episodes && self.media.kind != MediaKind::Series {
            warn!(kind = %self.media.kind, "Episode list requested for non-series");
            return false;
        }
        self.controls.open_modal(modal);
        true
    }

    pub fn close_modal(&mut self) {
        if !self.torn_down {
            self.controls.close_modal();
        }
    }

    /// Switch to another candidate, resuming at the current position
    #[instrument(skip(self, url), fields(session_id = %self.id, url = %url))]
    pub fn select_quality(&mut self, url: &Url) -> Result<()> {
        self.ensure_open()?;

        let candidate = self
            .candidates
            .as_ref()
            .and_then(|set| set.find(url))
            .cloned()
            .ok_or_else(|| Error::UnknownCandidate {
                url: url.to_string(),
            })?;
        let current = self
            .binder
            .bound()
            .map(|b| b.url.clone())
            .ok_or(Error::NoActiveSource)?;

        if current != candidate.url {
            let resume_offset = self.position();
            info!(
                quality = %candidate.quality,
                resume_offset,
                "Switching quality"
            );
            self.bind(&candidate.url, Some(candidate.quality), resume_offset);
        }

        self.controls.close_modal();
        Ok(())
    }

    /// Apply one of the configured playback rates
    pub fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        self.ensure_open()?;

        let rate = PlaybackRate::new(rate)?;
        let offered = self
            .config
            .playback_rates
            .iter()
            .any(|r| (*r - rate.value()).abs() < f64::EPSILON);
        if !offered {
            return Err(Error::InvalidPlaybackRate(rate.value()));
        }

        self.sink.set_playback_rate(rate.value());
        self.controls.set_playback_rate(rate);
        debug!(%rate, "Playback rate changed");
        Ok(())
    }

    /// Replace the episode list offered for a series
    pub fn set_episodes(&mut self, episodes: Vec<Episode>) {
        self.episodes = episodes;
    }

    /// Forward the chosen episode to the host and close the list
    pub fn select_episode(&mut self, episode_id: u64) -> bool {
        if self.torn_down {
            return false;
        }
        let Some(episode) = self.episodes.iter().find(|e| e.id == episode_id).cloned() else {
            warn!(episode_id, "Unknown episode selected");
            return false;
        };

        info!(episode = episode.episode_number, "Episode selected");
        self.host.on_episode_select(episode);
        self.controls.close_modal();
        true
    }

    pub fn toggle_favorite(&mut self) {
        if !self.torn_down {
            self.host.on_toggle_favorite();
        }
    }

    pub fn download(&mut self) {
        if !self.torn_down {
            self.host.on_download();
        }
    }

    pub fn share(&mut self) {
        if !self.torn_down {
            self.host.on_share();
        }
    }

    /// Hand the current stream and position to a picture-in-picture window
    pub fn enter_pip(&mut self) -> Result<()> {
        self.ensure_open()?;

        let stream_url = self
            .binder
            .bound()
            .map(|b| b.url.clone())
            .ok_or(Error::NoActiveSource)?;
        self.host.on_enter_pip(PipSnapshot {
            stream_url,
            current_time: self.position(),
            is_playing: self.tracker.state().is_playing,
        });
        Ok(())
    }

    /// Release the surface: timers, then sink listeners, then the handler
    ///
    /// Idempotent. Queued and later events are dropped.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        let progress = self.watch_progress();

        self.controls.teardown();
        self.tracker.detach(self.sink.as_mut());
        self.binder.release(self.sink.as_mut());
        self.rx.close();

        if let Some(progress) = progress {
            debug!(percent = progress.percent(), "Reporting watch progress");
            self.host.on_watch_progress(progress);
        }

        let stats = self.binder.stats();
        info!(
            binds = stats.binds,
            handlers_destroyed = stats.handlers_destroyed,
            "Player session torn down"
        );
    }

    /// Checkpoint worth keeping: started, and not effectively finished
    fn watch_progress(&self) -> Option<WatchProgress> {
        let state = self.tracker.state();
        let current_time = self.position();
        if state.duration <= 0.0 || current_time <= 0.0 {
            return None;
        }

        let progress = WatchProgress {
            media_id: self.media.id,
            kind: self.media.kind,
            title: self.media.title.clone(),
            season: self.media.season,
            episode: self.media.episode,
            current_time,
            duration: state.duration,
            recorded_at: Utc::now(),
        };
        let percent = progress.percent();
        (percent > self.config.min_history_progress && percent < self.config.max_history_progress)
            .then_some(progress)
    }

    /// Playback position, or the pending resume offset while a new source is starting
    fn position(&self) -> f64 {
        match self.binder.bound() {
            Some(bound) if bound.awaiting_start => bound.resume_offset,
            _ => self.tracker.state().current_time,
        }
    }

    fn surface(&mut self, err: &Error) {
        if !err.is_surfaced() {
            return;
        }
        let notice = Notice::error(err);
        self.host.on_notice(notice.clone());
        self.last_notice = Some(notice);
    }

    fn ensure_open(&self) -> Result<()> {
        if self.torn_down {
            Err(Error::SessionClosed)
        } else {
            Ok(())
        }
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
