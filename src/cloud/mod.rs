//! Managed message-queue boundary.
//!
//! The in-process bus never depends on this module. It describes the
//! capability the cloud messaging collaborator exposes (topics,
//! subscriptions, remote publish with acknowledgment, streaming pull) and
//! ships an in-memory implementation for tests and single-process use.
//!
//! ```
//! use std::time::Duration;
//! use pubsub_mediator::cloud::{InMemoryQueue, Message, MessageQueue};
//!
//! let queue = InMemoryQueue::new("demo-project");
//! queue.create_topic("orders").unwrap();
//! queue.create_subscription("billing", "orders").unwrap();
//!
//! let ack = queue.publish("orders", Message::new("order #1")).unwrap();
//! let message_id = ack.result(Duration::from_secs(1)).unwrap();
//!
//! let received = queue.pull("billing", 10).unwrap();
//! assert_eq!(received[0].message().message_id.as_deref(), Some(message_id.as_str()));
//! received.into_iter().for_each(|m| m.ack().unwrap());
//! ```

mod in_memory;
mod message;
mod queue;
mod streaming;

pub use in_memory::InMemoryQueue;
pub use message::{Acknowledger, Message, ReceivedMessage};
pub use queue::{MessageQueue, PublishAck, QueueError};
pub use streaming::{subscribe, PullStats, StreamingPull};

/// Fully qualified topic name, `projects/{project}/topics/{topic}`.
pub fn topic_path(project_id: &str, topic_id: &str) -> String {
    format!("projects/{}/topics/{}", project_id, topic_id)
}

/// Fully qualified subscription name, `projects/{project}/subscriptions/{subscription}`.
pub fn subscription_path(project_id: &str, subscription_id: &str) -> String {
    format!("projects/{}/subscriptions/{}", project_id, subscription_id)
}
