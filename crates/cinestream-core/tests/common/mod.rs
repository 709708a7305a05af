//! Scripted doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use cinestream_core::{
    Episode, Error, HandlerEvent, HandlerEvents, HandlerFactory, HandlerId, ListenerId,
    MediaDescriptor, MediaSink, Notice, PipSnapshot, PlayRejected, PlayerConfig, PlayerHost,
    PlayerSession, ProtocolHandler, ResolveRequest, Result, SinkEvent, SinkListener,
    StreamCandidate, StreamResolver, StreamingConfig, WatchProgress,
};
use std::sync::{Arc, Mutex};
use url::Url;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::default().add_directive("warn".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

/// Cross-double log of lifecycle steps, in the order they happened
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}

// ==================== Media Sink ====================

#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    SetSource(Url),
    ClearSource,
    Load,
    Seek(f64),
    Play,
    Pause,
    SetRate(f64),
    SetMuted(bool),
}

struct SinkInner {
    calls: Vec<SinkCall>,
    source: Option<Url>,
    current_time: f64,
    duration: f64,
    paused: bool,
    playback_rate: f64,
    reject_play: Option<String>,
    listeners: Vec<(ListenerId, SinkListener)>,
    next_listener: u64,
}

/// Media element double; clones share state
#[derive(Clone)]
pub struct MockSink {
    inner: Arc<Mutex<SinkInner>>,
    journal: Journal,
}

impl MockSink {
    pub fn new(journal: Journal) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SinkInner {
                calls: Vec::new(),
                source: None,
                current_time: 0.0,
                duration: f64::NAN,
                paused: true,
                playback_rate: 1.0,
                reject_play: None,
                listeners: Vec::new(),
                next_listener: 1,
            })),
            journal,
        }
    }

    /// Deliver `event` to every subscribed listener
    pub fn emit(&self, event: SinkEvent) {
        let listeners: Vec<SinkListener> = {
            let inner = self.inner.lock().unwrap();
            inner.listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in listeners {
            listener.emit(event);
        }
    }

    /// Playback advanced to `seconds`
    pub fn advance_to(&self, seconds: f64) {
        self.inner.lock().unwrap().current_time = seconds;
        self.emit(SinkEvent::TimeUpdate { current_time: seconds });
    }

    pub fn set_duration(&self, seconds: f64) {
        self.inner.lock().unwrap().duration = seconds;
        self.emit(SinkEvent::DurationChange { duration: seconds });
    }

    /// Refuse every play request with `reason`
    pub fn reject_play(&self, reason: &str) {
        self.inner.lock().unwrap().reject_play = Some(reason.to_string());
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().unwrap().listeners.len()
    }

    pub fn source(&self) -> Option<Url> {
        self.inner.lock().unwrap().source.clone()
    }

    pub fn position(&self) -> f64 {
        self.inner.lock().unwrap().current_time
    }

    pub fn paused(&self) -> bool {
        self.inner.lock().unwrap().paused
    }

    pub fn rate(&self) -> f64 {
        self.inner.lock().unwrap().playback_rate
    }

    fn record(&self, call: SinkCall) {
        self.inner.lock().unwrap().calls.push(call);
    }
}

impl MediaSink for MockSink {
    fn set_source(&mut self, url: &Url) {
        self.inner.lock().unwrap().source = Some(url.clone());
        self.record(SinkCall::SetSource(url.clone()));
    }

    fn clear_source(&mut self) {
        self.inner.lock().unwrap().source = None;
        self.record(SinkCall::ClearSource);
        self.journal.record("sink:clear_source");
    }

    fn load(&mut self) {
        self.record(SinkCall::Load);
    }

    fn current_time(&self) -> f64 {
        self.inner.lock().unwrap().current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.inner.lock().unwrap().current_time = seconds;
        self.record(SinkCall::Seek(seconds));
        self.emit(SinkEvent::TimeUpdate { current_time: seconds });
    }

    fn duration(&self) -> f64 {
        self.inner.lock().unwrap().duration
    }

    fn is_paused(&self) -> bool {
        self.inner.lock().unwrap().paused
    }

    fn play(&mut self) -> std::result::Result<(), PlayRejected> {
        self.record(SinkCall::Play);
        let rejection = self.inner.lock().unwrap().reject_play.clone();
        if let Some(reason) = rejection {
            return Err(PlayRejected(reason));
        }
        self.inner.lock().unwrap().paused = false;
        self.emit(SinkEvent::Play);
        Ok(())
    }

    fn pause(&mut self) {
        self.record(SinkCall::Pause);
        self.inner.lock().unwrap().paused = true;
        self.emit(SinkEvent::Pause);
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.inner.lock().unwrap().playback_rate = rate;
        self.record(SinkCall::SetRate(rate));
    }

    fn set_muted(&mut self, muted: bool) {
        self.record(SinkCall::SetMuted(muted));
    }

    fn subscribe(&mut self, listener: SinkListener) -> ListenerId {
        let mut inner = self.inner.lock().unwrap();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        self.inner.lock().unwrap().listeners.retain(|(l, _)| *l != id);
        self.journal.record("sink:unsubscribe");
    }
}

// ==================== Protocol Handler ====================

#[derive(Default)]
struct FactoryInner {
    created: Vec<HandlerId>,
    destroyed: Vec<HandlerId>,
    loaded: Vec<Url>,
    attached: usize,
    recoveries: u32,
    live: usize,
    max_live: usize,
    events: Vec<HandlerEvents>,
    configs: Vec<StreamingConfig>,
}

/// Handler factory double; clones share state
#[derive(Clone)]
pub struct MockFactory {
    inner: Arc<Mutex<FactoryInner>>,
    journal: Journal,
    supported: bool,
}

impl MockFactory {
    pub fn new(journal: Journal) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FactoryInner::default())),
            journal,
            supported: true,
        }
    }

    pub fn unsupported(journal: Journal) -> Self {
        Self {
            supported: false,
            ..Self::new(journal)
        }
    }

    /// Emit `event` from the most recently created handler
    pub fn emit_latest(&self, event: HandlerEvent) -> HandlerId {
        let events = self
            .inner
            .lock()
            .unwrap()
            .events
            .last()
            .cloned()
            .expect("no handler created");
        events.emit(event);
        events.id()
    }

    /// Emit `event` from the handler with `id`, live or not
    pub fn emit_from(&self, id: HandlerId, event: HandlerEvent) {
        let events = self
            .inner
            .lock()
            .unwrap()
            .events
            .iter()
            .find(|e| e.id() == id)
            .cloned()
            .expect("unknown handler");
        events.emit(event);
    }

    pub fn created(&self) -> Vec<HandlerId> {
        self.inner.lock().unwrap().created.clone()
    }

    pub fn destroyed(&self) -> Vec<HandlerId> {
        self.inner.lock().unwrap().destroyed.clone()
    }

    pub fn loaded(&self) -> Vec<Url> {
        self.inner.lock().unwrap().loaded.clone()
    }

    pub fn attached(&self) -> usize {
        self.inner.lock().unwrap().attached
    }

    pub fn recoveries(&self) -> u32 {
        self.inner.lock().unwrap().recoveries
    }

    pub fn live(&self) -> usize {
        self.inner.lock().unwrap().live
    }

    pub fn max_live(&self) -> usize {
        self.inner.lock().unwrap().max_live
    }

    pub fn last_config(&self) -> Option<StreamingConfig> {
        self.inner.lock().unwrap().configs.last().cloned()
    }
}

impl HandlerFactory for MockFactory {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create(&self, config: &StreamingConfig, events: HandlerEvents) -> Box<dyn ProtocolHandler> {
        let id = events.id();
        {
            let mut inner = self.inner.lock().unwrap();
            inner.created.push(id);
            inner.live += 1;
            inner.max_live = inner.max_live.max(inner.live);
            inner.events.push(events);
            inner.configs.push(config.clone());
        }
        self.journal.record(format!("handler:create:{}", id.0));

        Box::new(MockHandler {
            id,
            inner: self.inner.clone(),
            journal: self.journal.clone(),
        })
    }
}

struct MockHandler {
    id: HandlerId,
    inner: Arc<Mutex<FactoryInner>>,
    journal: Journal,
}

impl ProtocolHandler for MockHandler {
    fn load_source(&mut self, url: &Url) {
        self.inner.lock().unwrap().loaded.push(url.clone());
    }

    fn attach_media(&mut self, _sink: &mut dyn MediaSink) {
        self.inner.lock().unwrap().attached += 1;
    }

    fn recover_media_error(&mut self) {
        self.inner.lock().unwrap().recoveries += 1;
    }

    fn destroy(&mut self) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.destroyed.push(self.id);
            inner.live -= 1;
        }
        self.journal.record(format!("handler:destroy:{}", self.id.0));
    }
}

// ==================== Host ====================

#[derive(Debug, Default)]
pub struct HostLog {
    pub notices: Vec<Notice>,
    pub favorites: u32,
    pub downloads: u32,
    pub shares: u32,
    pub episodes: Vec<Episode>,
    pub pips: Vec<PipSnapshot>,
    pub progress: Vec<WatchProgress>,
}

#[derive(Clone, Default)]
pub struct RecordingHost(pub Arc<Mutex<HostLog>>);

impl RecordingHost {
    pub fn notices(&self) -> Vec<Notice> {
        self.0.lock().unwrap().notices.clone()
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, HostLog> {
        self.0.lock().unwrap()
    }
}

impl PlayerHost for RecordingHost {
    fn on_notice(&mut self, notice: Notice) {
        self.0.lock().unwrap().notices.push(notice);
    }

    fn on_toggle_favorite(&mut self) {
        self.0.lock().unwrap().favorites += 1;
    }

    fn on_download(&mut self) {
        self.0.lock().unwrap().downloads += 1;
    }

    fn on_share(&mut self) {
        self.0.lock().unwrap().shares += 1;
    }

    fn on_episode_select(&mut self, episode: Episode) {
        self.0.lock().unwrap().episodes.push(episode);
    }

    fn on_enter_pip(&mut self, snapshot: PipSnapshot) {
        self.0.lock().unwrap().pips.push(snapshot);
    }

    fn on_watch_progress(&mut self, progress: WatchProgress) {
        self.0.lock().unwrap().progress.push(progress);
    }
}

// ==================== Resolver ====================

/// Resolver answering every request with the same script
pub struct ScriptedResolver {
    answer: std::result::Result<Vec<StreamCandidate>, String>,
    pub requests: Mutex<Vec<ResolveRequest>>,
}

impl ScriptedResolver {
    pub fn links(links: &[(u32, &str)]) -> Self {
        Self {
            answer: Ok(links
                .iter()
                .map(|(q, u)| StreamCandidate::new(*q, url(u)))
                .collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            answer: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StreamResolver for ScriptedResolver {
    async fn resolve(&self, request: &ResolveRequest) -> Result<Vec<StreamCandidate>> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.answer {
            Ok(links) => Ok(links.clone()),
            Err(message) => Err(Error::resolver(message.clone())),
        }
    }
}

/// The scenario ladder: 480p A, 720p B, 1080p C, handed out unordered
pub const A: &str = "https://cdn.example.com/a/index.m3u8";
pub const B: &str = "https://cdn.example.com/b/index.m3u8";
pub const C: &str = "https://cdn.example.com/c/index.m3u8";

pub fn ladder() -> ScriptedResolver {
    ScriptedResolver::links(&[(1080, C), (480, A), (720, B)])
}

// ==================== Harness ====================

pub struct Harness {
    pub session: PlayerSession,
    pub sink: MockSink,
    pub factory: MockFactory,
    pub host: RecordingHost,
    pub journal: Journal,
}

impl Harness {
    pub fn new(media: MediaDescriptor) -> Self {
        let journal = Journal::default();
        Self::with_factory(media, MockFactory::new(journal.clone()), journal)
    }

    pub fn with_factory(media: MediaDescriptor, factory: MockFactory, journal: Journal) -> Self {
        init_tracing();
        let sink = MockSink::new(journal.clone());
        let host = RecordingHost::default();
        let session = PlayerSession::new(
            PlayerConfig::default(),
            media,
            Box::new(sink.clone()),
            Box::new(factory.clone()),
            Box::new(host.clone()),
        )
        .unwrap();

        Self {
            session,
            sink,
            factory,
            host,
            journal,
        }
    }

    pub fn movie() -> Self {
        Self::new(MediaDescriptor::movie(603, "The Matrix", Some(1999)))
    }

    pub fn series() -> Self {
        Self::new(MediaDescriptor::episode(1399, "Dark", 1, 2))
    }

    /// Load the ladder and let the first handler parse its manifest
    pub async fn started(mut self) -> Self {
        self.session.load(&ladder(), 0.0).await.unwrap();
        self.factory.emit_latest(HandlerEvent::ManifestParsed { levels: 1 });
        self.session.drain_pending();
        self
    }

    pub fn drain(&mut self) -> usize {
        self.session.drain_pending()
    }
}
