//! Source binder
//!
//! Attaches one stream URL to the media sink, either through a segmented
//! protocol handler or by direct source assignment, and exclusively owns the
//! handler instance it creates. Binding always destroys the previous handler
//! before constructing the next one, so at most one handler is ever alive.

use crate::{
    config::StreamingConfig,
    events::PlayerEvent,
    handler::{is_segmented_url, HandlerEvents, HandlerFactory, HandlerId, ProtocolHandler},
    sink::MediaSink,
    types::{sanitize_seconds, Quality},
    Error,
};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// How a source is attached to the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    /// Through the handler instance with this id
    Segmented(HandlerId),
    /// Direct assignment of the sink's source
    Direct,
}

/// The stream currently attached to the sink
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSource {
    pub url: Url,
    /// Quality tier, when the source came from the candidate set
    pub quality: Option<Quality>,
    pub mode: BindMode,
    /// Position to restore once the source is ready
    pub resume_offset: f64,
    /// Still waiting for manifest/metadata before starting playback
    pub awaiting_start: bool,
}

/// Result of a start attempt after the source became ready
#[derive(Debug)]
pub enum StartOutcome {
    /// Event did not concern the current source
    NotApplicable,
    Started,
    /// The sink refused to start; playback stays paused
    Rejected(Error),
}

/// Lifecycle counters, for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinderStats {
    pub binds: u64,
    pub handlers_created: u64,
    pub handlers_destroyed: u64,
}

impl BinderStats {
    /// Handlers currently alive
    pub fn live_handlers(&self) -> u64 {
        self.handlers_created - self.handlers_destroyed
    }
}

pub struct SourceBinder {
    factory: Box<dyn HandlerFactory>,
    config: StreamingConfig,
    events: mpsc::UnboundedSender<PlayerEvent>,
    handler: Option<(HandlerId, Box<dyn ProtocolHandler>)>,
    bound: Option<BoundSource>,
    next_handler_id: u64,
    stats: BinderStats,
}

impl SourceBinder {
    pub fn new(
        factory: Box<dyn HandlerFactory>,
        config: StreamingConfig,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> Self {
        Self {
            factory,
            config,
            events,
            handler: None,
            bound: None,
            next_handler_id: 1,
            stats: BinderStats::default(),
        }
    }

    pub fn bound(&self) -> Option<&BoundSource> {
        self.bound.as_ref()
    }

    pub fn stats(&self) -> BinderStats {
        self.stats
    }

    /// Id of the live handler, if any
    pub fn handler_id(&self) -> Option<HandlerId> {
        self.handler.as_ref().map(|(id, _)| *id)
    }

    /// Attach `url` to the sink, replacing whatever was bound
    #[instrument(skip(self, sink, url), fields(url = %url))]
    pub fn bind(
        &mut self,
        sink: &mut dyn MediaSink,
        url: &Url,
        quality: Option<Quality>,
        resume_offset: f64,
    ) -> &BoundSource {
        // Old handler must be gone before a new one touches the sink
        self.destroy_handler();

        sink.set_muted(false);
        let resume_offset = sanitize_seconds(resume_offset);

        let mode = if is_segmented_url(url) && self.factory.is_supported() {
            let id = HandlerId(self.next_handler_id);
            self.next_handler_id += 1;

            let mut handler = self
                .factory
                .create(&self.config, HandlerEvents::new(id, self.events.clone()));
            self.stats.handlers_created += 1;
            handler.load_source(url);
            handler.attach_media(sink);
            self.handler = Some((id, handler));

            info!(handler = %id, resume_offset, "Bound segmented source");
            BindMode::Segmented(id)
        } else {
            sink.set_source(url);
            sink.load();

            info!(resume_offset, "Bound direct source");
            BindMode::Direct
        };

        self.stats.binds += 1;
        self.bound.insert(BoundSource {
            url: url.clone(),
            quality,
            mode,
            resume_offset,
            awaiting_start: true,
        })
    }

    /// Segmented path: the handler with `id` parsed its manifest
    pub fn on_manifest_parsed(&mut self, sink: &mut dyn MediaSink, id: HandlerId) -> StartOutcome {
        let ready = matches!(
            self.bound.as_ref(),
            Some(b) if b.mode == BindMode::Segmented(id) && b.awaiting_start
        );
        if ready {
            self.start(sink)
        } else {
            StartOutcome::NotApplicable
        }
    }

    /// Direct path: sink metadata became available
    pub fn on_metadata_loaded(&mut self, sink: &mut dyn MediaSink) -> StartOutcome {
        let ready = matches!(
            self.bound.as_ref(),
            Some(b) if b.mode == BindMode::Direct && b.awaiting_start
        );
        if ready {
            self.start(sink)
        } else {
            StartOutcome::NotApplicable
        }
    }

    fn start(&mut self, sink: &mut dyn MediaSink) -> StartOutcome {
        let Some(bound) = self.bound.as_mut() else {
            return StartOutcome::NotApplicable;
        };
        bound.awaiting_start = false;

        if bound.resume_offset > 0.0 {
            sink.set_current_time(bound.resume_offset);
        }

        match sink.play() {
            Ok(()) => {
                debug!(url = %bound.url, "Playback start requested");
                StartOutcome::Started
            }
            Err(rejected) => {
                warn!(reason = %rejected, "Playback start rejected, staying paused");
                StartOutcome::Rejected(Error::PlaybackStartRejected(rejected.0))
            }
        }
    }

    /// Ask the live handler with `id` to recover from a media error
    pub fn recover_media_error(&mut self, id: HandlerId) -> bool {
        match self.handler.as_mut() {
            Some((live, handler)) if *live == id => {
                handler.recover_media_error();
                info!(handler = %id, "Media error recovery requested");
                true
            }
            _ => false,
        }
    }

    /// True when events from `id` concern the live handler
    pub fn is_current(&self, id: HandlerId) -> bool {
        self.handler_id() == Some(id)
    }

    /// Release everything: destroy the handler and detach any direct source
    pub fn release(&mut self, sink: &mut dyn MediaSink) {
        self.destroy_handler();
        if let Some(bound) = self.bound.take() {
            if bound.mode == BindMode::Direct {
                sink.clear_source();
            }
            debug!(url = %bound.url, "Source released");
        }
    }

    fn destroy_handler(&mut self) {
        if let Some((id, mut handler)) = self.handler.take() {
            handler.destroy();
            self.stats.handlers_destroyed += 1;
            info!(handler = %id, "Protocol handler destroyed");
        }
    }
}

impl Drop for SourceBinder {
    fn drop(&mut self) {
        self.destroy_handler();
    }
}
