//! In-memory message service for testing and single-process scenarios.
//!
//! Thread-safe and clonable: every clone is a handle to the same topics and
//! subscriptions.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    subscription_path, topic_path, Acknowledger, Message, MessageQueue, PublishAck, QueueError,
    ReceivedMessage,
};

/// In-memory topics and subscriptions.
///
/// Features:
/// - Every published message is copied to each subscription attached to the
///   topic at publish time
/// - Pulled messages stay outstanding until acked; nacked messages go back
///   to the front of the subscription with their attempt count bumped
/// - Detached and orphaned subscriptions keep existing but receive nothing
///
/// ## Example
///
/// ```
/// use pubsub_mediator::cloud::{InMemoryQueue, Message, MessageQueue};
///
/// let queue = InMemoryQueue::new("p");
/// queue.create_topic("t").unwrap();
/// queue.create_subscription("s", "t").unwrap();
/// queue.publish("t", Message::new("one")).unwrap();
///
/// let first = queue.pull("s", 1).unwrap().pop().unwrap();
/// first.nack().unwrap();
///
/// let again = queue.pull("s", 1).unwrap().pop().unwrap();
/// assert_eq!(again.delivery_attempt(), 2);
/// again.ack().unwrap();
/// assert_eq!(queue.pending_len("s").unwrap(), 0);
/// ```
#[derive(Clone)]
pub struct InMemoryQueue {
    project_id: Arc<str>,
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    topics: BTreeSet<String>,
    subscriptions: BTreeMap<String, SubscriptionState>,
    next_message_id: u64,
    next_ack_id: u64,
}

struct SubscriptionState {
    /// `None` once the topic was deleted.
    topic: Option<String>,
    detached: bool,
    pending: VecDeque<Delivery>,
    outstanding: HashMap<String, Delivery>,
}

impl SubscriptionState {
    fn receives_from(&self, topic_id: &str) -> bool {
        !self.detached && self.topic.as_deref() == Some(topic_id)
    }
}

struct Delivery {
    message: Message,
    attempt: u32,
}

impl InMemoryQueue {
    pub fn new(project_id: impl Into<String>) -> Self {
        let project_id: String = project_id.into();
        Self {
            project_id: Arc::from(project_id),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Messages waiting to be pulled from a subscription.
    pub fn pending_len(&self, subscription_id: &str) -> Result<usize, QueueError> {
        let state = self.lock("pending_len")?;
        let sub = state
            .subscriptions
            .get(subscription_id)
            .ok_or_else(|| QueueError::subscription_not_found(subscription_id))?;
        Ok(sub.pending.len())
    }

    /// Messages pulled but neither acked nor nacked.
    pub fn outstanding_len(&self, subscription_id: &str) -> Result<usize, QueueError> {
        let state = self.lock("outstanding_len")?;
        let sub = state
            .subscriptions
            .get(subscription_id)
            .ok_or_else(|| QueueError::subscription_not_found(subscription_id))?;
        Ok(sub.outstanding.len())
    }

    fn lock(&self, operation: &'static str) -> Result<MutexGuard<'_, State>, QueueError> {
        self.state
            .lock()
            .map_err(|_| QueueError::LockPoisoned(operation))
    }
}

impl Acknowledger for InMemoryQueue {
    fn acknowledge(&self, subscription_id: &str, ack_id: &str) -> Result<(), QueueError> {
        let mut state = self.lock("acknowledge")?;
        let sub = state
            .subscriptions
            .get_mut(subscription_id)
            .ok_or_else(|| QueueError::subscription_not_found(subscription_id))?;
        // Unknown or already settled ack ids are ignored, as by the real service.
        sub.outstanding.remove(ack_id);
        Ok(())
    }

    fn nack(&self, subscription_id: &str, ack_id: &str) -> Result<(), QueueError> {
        let mut state = self.lock("nack")?;
        let sub = state
            .subscriptions
            .get_mut(subscription_id)
            .ok_or_else(|| QueueError::subscription_not_found(subscription_id))?;
        if let Some(mut delivery) = sub.outstanding.remove(ack_id) {
            delivery.attempt += 1;
            sub.pending.push_front(delivery);
        }
        Ok(())
    }
}

impl MessageQueue for InMemoryQueue {
    fn create_topic(&self, topic_id: &str) -> Result<String, QueueError> {
        let mut state = self.lock("create_topic")?;
        if !state.topics.insert(topic_id.to_string()) {
            return Err(QueueError::AlreadyExists {
                kind: "topic",
                id: topic_id.to_string(),
            });
        }
        tracing::debug!(topic = topic_id, "topic created");
        Ok(topic_path(&self.project_id, topic_id))
    }

    fn delete_topic(&self, topic_id: &str) -> Result<(), QueueError> {
        let mut state = self.lock("delete_topic")?;
        if !state.topics.remove(topic_id) {
            return Err(QueueError::topic_not_found(topic_id));
        }
        for sub in state.subscriptions.values_mut() {
            if sub.topic.as_deref() == Some(topic_id) {
                sub.topic = None;
            }
        }
        tracing::debug!(topic = topic_id, "topic deleted");
        Ok(())
    }

    fn list_topics(&self) -> Result<Vec<String>, QueueError> {
        let state = self.lock("list_topics")?;
        Ok(state
            .topics
            .iter()
            .map(|id| topic_path(&self.project_id, id))
            .collect())
    }

    fn create_subscription(
        &self,
        subscription_id: &str,
        topic_id: &str,
    ) -> Result<String, QueueError> {
        let mut state = self.lock("create_subscription")?;
        if !state.topics.contains(topic_id) {
            return Err(QueueError::topic_not_found(topic_id));
        }
        if state.subscriptions.contains_key(subscription_id) {
            return Err(QueueError::AlreadyExists {
                kind: "subscription",
                id: subscription_id.to_string(),
            });
        }

        state.subscriptions.insert(
            subscription_id.to_string(),
            SubscriptionState {
                topic: Some(topic_id.to_string()),
                detached: false,
                pending: VecDeque::new(),
                outstanding: HashMap::new(),
            },
        );
        tracing::debug!(
            subscription = subscription_id,
            topic = topic_id,
            "subscription created"
        );
        Ok(subscription_path(&self.project_id, subscription_id))
    }

    fn delete_subscription(&self, subscription_id: &str) -> Result<(), QueueError> {
        let mut state = self.lock("delete_subscription")?;
        state
            .subscriptions
            .remove(subscription_id)
            .map(|_| ())
            .ok_or_else(|| QueueError::subscription_not_found(subscription_id))
    }

    fn detach_subscription(&self, subscription_id: &str) -> Result<(), QueueError> {
        let mut state = self.lock("detach_subscription")?;
        let sub = state
            .subscriptions
            .get_mut(subscription_id)
            .ok_or_else(|| QueueError::subscription_not_found(subscription_id))?;

        let dropped = sub.pending.len() + sub.outstanding.len();
        sub.detached = true;
        sub.pending.clear();
        sub.outstanding.clear();
        tracing::debug!(subscription = subscription_id, dropped, "subscription detached");
        Ok(())
    }

    fn list_subscriptions(&self, topic_id: &str) -> Result<Vec<String>, QueueError> {
        let state = self.lock("list_subscriptions")?;
        if !state.topics.contains(topic_id) {
            return Err(QueueError::topic_not_found(topic_id));
        }
        Ok(state
            .subscriptions
            .iter()
            .filter(|(_, sub)| sub.receives_from(topic_id))
            .map(|(id, _)| subscription_path(&self.project_id, id))
            .collect())
    }

    fn list_all_subscriptions(&self) -> Result<Vec<String>, QueueError> {
        let state = self.lock("list_all_subscriptions")?;
        Ok(state
            .subscriptions
            .keys()
            .map(|id| subscription_path(&self.project_id, id))
            .collect())
    }

    fn publish(&self, topic_id: &str, mut message: Message) -> Result<PublishAck, QueueError> {
        let mut state = self.lock("publish")?;
        if !state.topics.contains(topic_id) {
            return Err(QueueError::topic_not_found(topic_id));
        }

        state.next_message_id += 1;
        let message_id = state.next_message_id.to_string();
        message.message_id = Some(message_id.clone());

        let mut fanout = 0;
        for sub in state.subscriptions.values_mut() {
            if sub.receives_from(topic_id) {
                sub.pending.push_back(Delivery {
                    message: message.clone(),
                    attempt: 1,
                });
                fanout += 1;
            }
        }
        tracing::debug!(topic = topic_id, message_id = %message_id, fanout, "message published");

        Ok(PublishAck::ready(message_id))
    }

    fn pull(
        &self,
        subscription_id: &str,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let mut state = self.lock("pull")?;
        let State {
            subscriptions,
            next_ack_id,
            ..
        } = &mut *state;

        let sub = subscriptions
            .get_mut(subscription_id)
            .ok_or_else(|| QueueError::subscription_not_found(subscription_id))?;
        if sub.detached {
            return Err(QueueError::Detached(subscription_id.to_string()));
        }

        let mut received = Vec::new();
        while received.len() < max_messages {
            let Some(delivery) = sub.pending.pop_front() else {
                break;
            };

            *next_ack_id += 1;
            let ack_id = format!("{}-{}", subscription_id, next_ack_id);
            received.push(ReceivedMessage::new(
                ack_id.clone(),
                subscription_id.to_string(),
                delivery.message.clone(),
                delivery.attempt,
                Arc::new(self.clone()),
            ));
            sub.outstanding.insert(ack_id, delivery);
        }
        Ok(received)
    }
}
