//! Fire-and-forget user-visible notices.
//!
//! The reconciliation flow reports failures as toast-style notices; the
//! rendering shell drains the receiver and displays them. Nothing waits on
//! delivery or acknowledgement.

use tokio::sync::mpsc;
use tracing::error;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Sending half of the notice channel.
///
/// Cheap to clone. Sends never block and never fail the caller; a dropped
/// receiver just discards notices.
#[derive(Debug, Clone)]
pub struct NoticeSink {
    tx: mpsc::UnboundedSender<Notice>,
}

impl NoticeSink {
    /// Create a sink and the receiver the rendering shell drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit an informational notice.
    pub fn info(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message.into());
    }

    /// Emit an error notice.
    ///
    /// Error notices are additionally logged and captured to Sentry.
    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        error!(notice = %message, "user-visible error");
        sentry::capture_message(&message, sentry::Level::Error);
        self.push(NoticeLevel::Error, message);
    }

    fn push(&self, level: NoticeLevel, message: String) {
        let _ = self.tx.send(Notice { level, message });
    }
}
