use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use thiserror::Error;

use super::{Acknowledger, Message, ReceivedMessage};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} '{id}' already exists")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("subscription '{0}' is detached from its topic")]
    Detached(String),

    #[error("timed out waiting for the message service")]
    Timeout,

    #[error("operation cancelled")]
    Cancelled,

    #[error("message callback panicked")]
    CallbackPanicked,

    #[error("queue lock poisoned during {0}")]
    LockPoisoned(&'static str),

    #[error("message encoding failed: {0}")]
    Encoding(String),
}

impl QueueError {
    pub(crate) fn topic_not_found(id: &str) -> Self {
        QueueError::NotFound {
            kind: "topic",
            id: id.to_string(),
        }
    }

    pub(crate) fn subscription_not_found(id: &str) -> Self {
        QueueError::NotFound {
            kind: "subscription",
            id: id.to_string(),
        }
    }
}

/// Pending acknowledgment of a publish, resolved with the message id the
/// service assigned.
#[derive(Debug)]
pub struct PublishAck {
    rx: Receiver<Result<String, QueueError>>,
}

impl PublishAck {
    /// An unresolved acknowledgment and the sender that resolves it.
    pub fn pending() -> (Sender<Result<String, QueueError>>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }

    /// An acknowledgment that is already resolved.
    pub fn ready(message_id: impl Into<String>) -> Self {
        let (tx, ack) = Self::pending();
        // The receiver is alive, so the send cannot fail.
        let _ = tx.send(Ok(message_id.into()));
        ack
    }

    /// Block until the service acknowledges the publish or `timeout` passes.
    pub fn result(self, timeout: Duration) -> Result<String, QueueError> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(QueueError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(QueueError::Cancelled),
        }
    }
}

/// The managed messaging service, as seen by this crate.
///
/// Topics fan out every published message to each of their subscriptions;
/// subscriptions hold messages until they are acknowledged.
pub trait MessageQueue: Acknowledger {
    /// Returns the topic's fully qualified path.
    fn create_topic(&self, topic_id: &str) -> Result<String, QueueError>;

    /// Subscriptions of a deleted topic survive but receive nothing more.
    fn delete_topic(&self, topic_id: &str) -> Result<(), QueueError>;

    fn list_topics(&self) -> Result<Vec<String>, QueueError>;

    /// Returns the subscription's fully qualified path.
    fn create_subscription(
        &self,
        subscription_id: &str,
        topic_id: &str,
    ) -> Result<String, QueueError>;

    fn delete_subscription(&self, subscription_id: &str) -> Result<(), QueueError>;

    /// Detach a subscription from its topic, dropping every retained message.
    fn detach_subscription(&self, subscription_id: &str) -> Result<(), QueueError>;

    /// Paths of the subscriptions attached to `topic_id`.
    fn list_subscriptions(&self, topic_id: &str) -> Result<Vec<String>, QueueError>;

    /// Paths of every subscription in the project.
    fn list_all_subscriptions(&self) -> Result<Vec<String>, QueueError>;

    fn publish(&self, topic_id: &str, message: Message) -> Result<PublishAck, QueueError>;

    /// Take up to `max_messages` pending deliveries from a subscription.
    fn pull(
        &self,
        subscription_id: &str,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, QueueError>;
}
