use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::QueueError;

/// A message as published to, or delivered from, a topic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    /// Opaque payload bytes.
    pub data: Vec<u8>,
    /// String key/value metadata.
    pub attributes: BTreeMap<String, String>,
    /// Assigned by the service on publish.
    pub message_id: Option<String>,
    pub ordering_key: Option<String>,
}

impl Message {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Create a message with a bitcode-serialized payload.
    pub fn encode<T: Serialize>(payload: &T) -> Result<Self, QueueError> {
        let bytes =
            bitcode::serialize(payload).map_err(|e| QueueError::Encoding(e.to_string()))?;
        Ok(Self::new(bytes))
    }

    /// Decode the payload from bitcode binary format.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, QueueError> {
        bitcode::deserialize(&self.data).map_err(|e| QueueError::Encoding(e.to_string()))
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_ordering_key(mut self, key: impl Into<String>) -> Self {
        self.ordering_key = Some(key.into());
        self
    }

    /// The payload as a string, if it is valid UTF-8.
    pub fn data_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Push-delivery JSON body: the payload base64-encoded under
    /// `message.data`, plus the delivering subscription.
    pub fn to_push_json(&self, subscription: &str) -> Result<String, QueueError> {
        let envelope = PushEnvelope {
            message: PushMessage {
                data: STANDARD.encode(&self.data),
                attributes: self.attributes.clone(),
                message_id: self.message_id.clone(),
                ordering_key: self.ordering_key.clone(),
            },
            subscription: subscription.to_string(),
        };
        serde_json::to_string(&envelope).map_err(|e| QueueError::Encoding(e.to_string()))
    }

    /// Parse a push-delivery JSON body into `(subscription, message)`.
    pub fn from_push_json(json: &str) -> Result<(String, Self), QueueError> {
        let envelope: PushEnvelope =
            serde_json::from_str(json).map_err(|e| QueueError::Encoding(e.to_string()))?;
        let data = STANDARD
            .decode(envelope.message.data)
            .map_err(|e| QueueError::Encoding(e.to_string()))?;

        let message = Message {
            data,
            attributes: envelope.message.attributes,
            message_id: envelope.message.message_id,
            ordering_key: envelope.message.ordering_key,
        };
        Ok((envelope.subscription, message))
    }
}

#[derive(Serialize, Deserialize)]
struct PushEnvelope {
    message: PushMessage,
    subscription: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushMessage {
    data: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ordering_key: Option<String>,
}

/// Settles delivered messages.
pub trait Acknowledger: Send + Sync {
    /// Mark a delivery as processed; it will not be delivered again.
    fn acknowledge(&self, subscription_id: &str, ack_id: &str) -> Result<(), QueueError>;

    /// Give a delivery back for immediate redelivery.
    fn nack(&self, subscription_id: &str, ack_id: &str) -> Result<(), QueueError>;
}

/// A message pulled from a subscription, awaiting `ack` or `nack`.
pub struct ReceivedMessage {
    ack_id: String,
    subscription_id: String,
    message: Message,
    delivery_attempt: u32,
    acknowledger: Arc<dyn Acknowledger>,
}

impl ReceivedMessage {
    pub(crate) fn new(
        ack_id: String,
        subscription_id: String,
        message: Message,
        delivery_attempt: u32,
        acknowledger: Arc<dyn Acknowledger>,
    ) -> Self {
        Self {
            ack_id,
            subscription_id,
            message,
            delivery_attempt,
            acknowledger,
        }
    }

    pub fn ack_id(&self) -> &str {
        &self.ack_id
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// 1 on first delivery, incremented on every redelivery.
    pub fn delivery_attempt(&self) -> u32 {
        self.delivery_attempt
    }

    pub fn ack(self) -> Result<(), QueueError> {
        self.acknowledger
            .acknowledge(&self.subscription_id, &self.ack_id)
    }

    pub fn nack(self) -> Result<(), QueueError> {
        self.acknowledger.nack(&self.subscription_id, &self.ack_id)
    }
}

impl fmt::Debug for ReceivedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceivedMessage")
            .field("ack_id", &self.ack_id)
            .field("subscription_id", &self.subscription_id)
            .field("message", &self.message)
            .field("delivery_attempt", &self.delivery_attempt)
            .finish()
    }
}
