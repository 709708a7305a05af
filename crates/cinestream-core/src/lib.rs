//! CineStream Core - adaptive playback controller
//!
//! This crate provides the playback core behind the CineStream player:
//! - Stream candidate resolution with a lowest-quality fast start
//! - Source binding over a segmented protocol handler or a direct source
//! - Stream error classification and in-place media recovery
//! - Event-driven playback state tracking
//! - The control-surface state machine (auto-hide, modals, seek feedback)
//! - Quality switching that resumes at the current position
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        CineStream Core                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │   Stream     │  │    Source    │  │   Recovery   │           │
//! │  │   Resolver   │  │    Binder    │  │    Policy    │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │   Player    │                              │
//! │                    │   Session   │                              │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐            │
//! │  │   Playback   │  │    Event    │  │   Control    │            │
//! │  │   Tracker    │  │     Bus     │  │   Surface    │            │
//! │  └──────────────┘  └─────────────┘  └──────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The media sink, the segmented protocol handler and the embedding page are
//! collaborators behind the [`MediaSink`], [`HandlerFactory`] and
//! [`PlayerHost`] traits.

pub mod error;
pub mod types;
pub mod config;
pub mod events;
pub mod sink;
pub mod handler;
pub mod resolver;
pub mod binder;
pub mod recovery;
pub mod tracker;
pub mod timer;
pub mod controls;
pub mod host;
pub mod session;

pub use error::{Error, Result};
pub use types::*;
pub use config::{PlayerConfig, ResolverConfig, StreamingConfig};
pub use events::{Command, PlayerEvent, PlayerHandle};
pub use sink::{ListenerId, MediaSink, PlayRejected, SinkEvent, SinkListener};
pub use handler::{
    HandlerError, HandlerErrorKind, HandlerEvent, HandlerEvents, HandlerFactory, HandlerId,
    ProtocolHandler,
};
pub use resolver::{resolve_candidates, CandidateSet, ResolveRequest, StreamResolver};
#[cfg(feature = "scraper")]
pub use resolver::ScraperResolver;
pub use binder::{BindMode, BinderStats, BoundSource};
pub use recovery::{classify, ErrorClass, RecoveryAction, RecoveryPolicy};
pub use controls::ControlPhase;
pub use host::{NoopHost, PipSnapshot, PlayerHost, WatchProgress};
pub use session::PlayerSession;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the player library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "CineStream Core initialized");
}
