use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use super::presentation::PresentationToken;

/// Pause between a mastery event and moving on.
pub const DEFAULT_AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(1_500);

/// Deferred, cancellable "move on" callback.
///
/// At most one callback is pending; scheduling again replaces it. When the
/// delay elapses the token is sent on the channel and the owner of the
/// session decides whether it still applies (see
/// `QuizSession::advance_if_current`). Must be used inside a tokio runtime.
#[derive(Debug)]
pub struct AutoAdvance {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl AutoAdvance {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Send `token` on `tx` after the delay, cancelling any earlier callback.
    pub fn schedule(&mut self, token: PresentationToken, tx: UnboundedSender<PresentationToken>) {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // receiver gone means the front end is shutting down
            let _ = tx.send(token);
        }));
        tracing::debug!(token, ?delay, "auto-advance scheduled");
    }

    /// Drop the pending callback, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Default for AutoAdvance {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_ADVANCE_DELAY)
    }
}

impl Drop for AutoAdvance {
    fn drop(&mut self) {
        self.cancel();
    }
}
