//! Streaming pull: a background thread feeding a subscription to a callback.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{MessageQueue, QueueError, ReceivedMessage};

const PULL_BATCH: usize = 100;

/// Statistics from a streaming pull.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PullStats {
    pub messages_received: usize,
    pub polls: usize,
}

/// A running streaming pull.
///
/// The pull ends when it is cancelled or when the subscription can no longer
/// be pulled (deleted or detached), in which case [`result`] reports why.
///
/// [`result`]: StreamingPull::result
pub struct StreamingPull {
    subscription_id: String,
    stop_tx: Sender<()>,
    done_rx: Receiver<()>,
    handle: Option<JoinHandle<Result<PullStats, QueueError>>>,
}

/// Start delivering `subscription_id`'s messages to `callback` on a
/// background thread.
///
/// The callback owns each message and is expected to `ack` or `nack` it;
/// unsettled messages stay outstanding.
pub fn subscribe<Q, F>(
    queue: Q,
    subscription_id: &str,
    mut callback: F,
    poll_interval: Duration,
) -> StreamingPull
where
    Q: MessageQueue + 'static,
    F: FnMut(ReceivedMessage) + Send + 'static,
{
    let (stop_tx, stop_rx) = channel();
    // Never sent on; the drop at thread exit is the signal.
    let (done_tx, done_rx) = channel::<()>();
    let subscription = subscription_id.to_string();

    tracing::debug!(subscription = %subscription, "listening for messages");

    let handle = thread::spawn(move || {
        let _done = done_tx;
        let mut stats = PullStats::default();

        loop {
            match stop_rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            stats.polls += 1;
            let messages = queue.pull(&subscription, PULL_BATCH).inspect_err(|err| {
                tracing::warn!(subscription = %subscription, error = %err, "streaming pull stopped");
            })?;

            if messages.is_empty() {
                thread::sleep(poll_interval);
                continue;
            }
            for message in messages {
                stats.messages_received += 1;
                callback(message);
            }
        }

        Ok(stats)
    });

    StreamingPull {
        subscription_id: subscription_id.to_string(),
        stop_tx,
        done_rx,
        handle: Some(handle),
    }
}

impl StreamingPull {
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Block until the pull ends on its own, or fail with
    /// [`QueueError::Timeout`] after `timeout`. A timed-out pull keeps
    /// running; call [`cancel`](StreamingPull::cancel) to stop it.
    pub fn result(&mut self, timeout: Duration) -> Result<PullStats, QueueError> {
        match self.done_rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => Err(QueueError::Timeout),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => self.join(),
        }
    }

    /// Stop pulling and wait for the thread to finish.
    pub fn cancel(mut self) -> Result<PullStats, QueueError> {
        let _ = self.stop_tx.send(());
        self.join()
    }

    fn join(&mut self) -> Result<PullStats, QueueError> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| QueueError::CallbackPanicked)?,
            None => Err(QueueError::Cancelled),
        }
    }
}

impl Drop for StreamingPull {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}
