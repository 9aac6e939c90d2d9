// ABOUTME: Per-call context carrying caller cancellation and an optional deadline
// ABOUTME: The effective deadline is always bounded by the connection's call timeout

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-side controls for a single put/get/list call.
///
/// A context with no deadline still gets one: every call is bounded by
/// [`ClientConfig::call_timeout`](crate::ClientConfig::call_timeout), and a
/// caller deadline later than that bound is ignored.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline of its own.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context cancelled when `token` is.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            deadline: None,
        }
    }

    /// Tighten the deadline; a later deadline than the current one has no effect.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Deadline for a call starting at `start`, capped at `limit` after it.
    pub(crate) fn bounded_deadline(&self, start: Instant, limit: Duration) -> Instant {
        let cap = start + limit;
        match self.deadline {
            Some(deadline) => deadline.min(cap),
            None => cap,
        }
    }
}
