//! Stream error classification and recovery policy
//!
//! | kind    | fatal | action                                          |
//! |---------|-------|-------------------------------------------------|
//! | network | yes   | surface "failed to load video"                  |
//! | media   | yes   | one in-place media recovery, then surface       |
//! | other   | yes   | surface a generic failure                       |
//! | any     | no    | log only                                        |
//!
//! Retrying manifests and fragments is the handler's own business, bounded
//! by [`StreamingConfig`](crate::config::StreamingConfig); this policy never
//! schedules retries itself.

use crate::{
    handler::{HandlerError, HandlerErrorKind},
    Error,
};
use tracing::{debug, warn};

/// Severity class of a handler error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Informational, playback continues
    Transient,
    /// Fatal, but the handler can recover in place
    Recoverable,
    /// Playback attempt is over
    Fatal,
}

/// Action the session takes for an error
#[derive(Debug)]
pub enum RecoveryAction {
    Ignore,
    RecoverMedia,
    Surface(Error),
}

/// Classify a handler error by its `{type, fatal}` tag
pub fn classify(error: &HandlerError) -> ErrorClass {
    match (error.fatal, error.kind) {
        (false, _) => ErrorClass::Transient,
        (true, HandlerErrorKind::Media) => ErrorClass::Recoverable,
        (true, _) => ErrorClass::Fatal,
    }
}

/// Per-bound-source recovery bookkeeping
#[derive(Debug, Default)]
pub struct RecoveryPolicy {
    media_recovery_attempted: bool,
}

impl RecoveryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget earlier recovery attempts (new source bound)
    pub fn reset(&mut self) {
        self.media_recovery_attempted = false;
    }

    pub fn media_recovery_attempted(&self) -> bool {
        self.media_recovery_attempted
    }

    /// Decide what to do about `error`
    pub fn decide(&mut self, error: &HandlerError) -> RecoveryAction {
        match classify(error) {
            ErrorClass::Transient => {
                debug!(kind = %error.kind, details = %error.details, "Non-fatal stream error");
                RecoveryAction::Ignore
            }
            ErrorClass::Recoverable if !self.media_recovery_attempted => {
                self.media_recovery_attempted = true;
                warn!(details = %error.details, "Fatal media error, attempting recovery");
                RecoveryAction::RecoverMedia
            }
            ErrorClass::Recoverable => RecoveryAction::Surface(Error::StreamDecode {
                details: error.details.clone(),
            }),
            ErrorClass::Fatal => RecoveryAction::Surface(match error.kind {
                HandlerErrorKind::Network => Error::StreamNetwork {
                    details: error.details.clone(),
                },
                _ => Error::StreamFailed {
                    details: error.details.clone(),
                },
            }),
        }
    }
}
