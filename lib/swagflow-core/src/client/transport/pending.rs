use std::future::Future;

use tokio::sync::{Mutex, OnceCell, oneshot};
use tracing::debug;

use super::TransportError;
use crate::client::response::IncomingResponse;

/// The outcome of a request, as produced by a transport.
pub type TransportResult = Result<IncomingResponse, TransportError>;

/// Write side of a [`PendingRequest`], used by transports to resolve it.
#[derive(Debug)]
pub struct ResponseSender {
    inner: oneshot::Sender<TransportResult>,
}

impl ResponseSender {
    /// Resolves the pending request. A request resolves at most once.
    pub fn send(self, result: TransportResult) {
        if self.inner.send(result).is_err() {
            debug!("pending request dropped before its resolution");
        }
    }
}

/// A handle on an in-flight HTTP request.
///
/// The handle transitions once from pending to either a response or a
/// transport error. Resolution is kept in a write-once cell: every later
/// [`wait`](Self::wait) returns the same outcome without touching the
/// transport again. Abandoning a wait (e.g. on timeout) leaves the handle
/// pending, ready to be awaited again.
#[derive(Debug)]
pub struct PendingRequest {
    receiver: Mutex<Option<oneshot::Receiver<TransportResult>>>,
    resolved: OnceCell<TransportResult>,
}

impl PendingRequest {
    /// Creates an unresolved handle, with the sender that will resolve it.
    pub fn channel() -> (ResponseSender, Self) {
        let (sender, receiver) = oneshot::channel();
        let pending = Self {
            receiver: Mutex::new(Some(receiver)),
            resolved: OnceCell::new(),
        };
        (ResponseSender { inner: sender }, pending)
    }

    /// Runs the request future on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime, like [`tokio::spawn`].
    pub fn spawn<F>(request: F) -> Self
    where
        F: Future<Output = TransportResult> + Send + 'static,
    {
        let (sender, pending) = Self::channel();
        tokio::spawn(async move {
            sender.send(request.await);
        });
        pending
    }

    /// Creates an already resolved handle.
    pub fn ready(result: TransportResult) -> Self {
        Self {
            receiver: Mutex::new(None),
            resolved: OnceCell::new_with(Some(result)),
        }
    }

    /// Tells whether the outcome is already known.
    pub fn is_resolved(&self) -> bool {
        self.resolved.initialized()
    }

    /// Waits for the outcome of the request.
    pub async fn wait(&self) -> &TransportResult {
        self.resolved
            .get_or_init(|| async {
                let mut receiver = self.receiver.lock().await;
                let Some(pending) = receiver.as_mut() else {
                    return Err(TransportError::closed());
                };
                let result = pending
                    .await
                    .unwrap_or_else(|_| Err(TransportError::closed()));
                *receiver = None;
                result
            })
            .await
    }
}
