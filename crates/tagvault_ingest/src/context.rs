//! Per-call execution context.

use std::future::Future;
use std::time::Duration;
use tagvault_error::{MediaError, MediaErrorKind, MediaResult};
use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

/// Deadline and cancellation carried through every store call of one request.
///
/// Cancellation and timeouts abort the current step only. Nothing already
/// written is rolled back; a pending record left behind resolves through
/// passive expiry.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tagvault_ingest::CallContext;
///
/// #[tokio::main]
/// async fn main() {
///     let ctx = CallContext::new().with_timeout(Duration::from_millis(10));
///     let result: Result<(), _> = ctx
///         .run("sleep", async {
///             tokio::time::sleep(Duration::from_secs(1)).await;
///             Ok(())
///         })
///         .await;
///     assert!(result.is_err());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CallContext {
    request_id: Uuid,
    deadline: Option<Instant>,
    cancelled: Option<watch::Receiver<bool>>,
}

/// Cancels the [`CallContext`] it was created with, and all its clones.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CallContext {
    /// Context without deadline or cancellation, with a fresh request id.
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            deadline: None,
            cancelled: None,
        }
    }

    /// Context that can be cancelled through the returned handle.
    pub fn cancellable() -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        let ctx = Self {
            cancelled: Some(receiver),
            ..Self::new()
        };
        (ctx, CancelHandle { sender })
    }

    /// Give up once `timeout` has elapsed from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Give up at `deadline`. An earlier deadline already set wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// Id for correlating log lines of one request.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// The deadline, if one is set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
            .as_ref()
            .is_some_and(|receiver| *receiver.borrow())
    }

    /// Drive `future` unless the context is cancelled or its deadline passes first.
    ///
    /// # Errors
    ///
    /// `Cancelled` or `Timeout` naming `operation`, otherwise whatever `future`
    /// returned.
    pub async fn run<T, F>(&self, operation: &str, future: F) -> MediaResult<T>
    where
        F: Future<Output = MediaResult<T>>,
    {
        if self.is_cancelled() {
            return Err(cancelled(operation));
        }
        if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
            return Err(timed_out(operation));
        }

        tokio::select! {
            biased;
            _ = self.wait_cancelled() => {
                tracing::debug!(request_id = %self.request_id, operation, "Call cancelled");
                Err(cancelled(operation))
            }
            _ = self.wait_deadline() => {
                tracing::debug!(request_id = %self.request_id, operation, "Call deadline exceeded");
                Err(timed_out(operation))
            }
            result = future => result,
        }
    }

    async fn wait_cancelled(&self) {
        if let Some(receiver) = &self.cancelled {
            let mut receiver = receiver.clone();
            if receiver.wait_for(|cancelled| *cancelled).await.is_ok() {
                return;
            }
        }
        // No handle, or the handle was dropped without cancelling
        std::future::pending::<()>().await
    }

    async fn wait_deadline(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}

#[track_caller]
fn cancelled(operation: &str) -> MediaError {
    MediaError::new(MediaErrorKind::Cancelled(operation.to_string()))
}

#[track_caller]
fn timed_out(operation: &str) -> MediaError {
    MediaError::new(MediaErrorKind::Timeout(operation.to_string()))
}
