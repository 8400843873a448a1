use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Caller-visible handle for one in-flight stream attempt.
///
/// Exactly one handle family (clones share state) exists per attempt. The
/// handle closes exactly once, on whichever of terminal event, cancellation,
/// or unrecoverable transport error happens first.
#[derive(Clone)]
pub struct StreamHandle {
    id: uuid::Uuid,
    abort: watch::Sender<bool>,
    closed: Arc<AtomicBool>,
}

impl StreamHandle {
    pub(crate) fn new() -> (Self, watch::Receiver<bool>) {
        let (abort, abort_rx) = watch::channel(false);
        (
            Self {
                id: uuid::Uuid::new_v4(),
                abort,
                closed: Arc::new(AtomicBool::new(false)),
            },
            abort_rx,
        )
    }

    /// Handle for an attempt that already reached its terminal state, as
    /// returned by the fallback path.
    pub(crate) fn finished() -> Self {
        let (abort, _) = watch::channel(false);
        Self {
            id: uuid::Uuid::new_v4(),
            abort,
            closed: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Client-side id for this attempt, used in log fields.
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    /// Requests cooperative cancellation.
    ///
    /// Stops the transport and suppresses all further callbacks for this
    /// handle; the remote operation may still finish server-side. Canceling
    /// an already-terminal handle is a no-op.
    pub fn cancel(&self) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let _ = self.abort.send(true);
    }

    /// Whether the attempt has reached a terminal state.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Latches the closed state; returns `true` only for the first caller,
    /// so racing close causes resolve to exactly one winner.
    pub(crate) fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }
}
