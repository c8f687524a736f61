#![cfg(feature = "cloud")]

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use pubsub_mediator::cloud::{subscribe, InMemoryQueue, Message, MessageQueue, QueueError};
use pubsub_mediator::{EventBus, EventBusExt, Mediator, Subscriber};
use serde::{Deserialize, Serialize};

const WAIT: Duration = Duration::from_secs(2);
const POLL: Duration = Duration::from_millis(5);

fn project() -> InMemoryQueue {
    let queue = InMemoryQueue::new("demo-project");
    queue.create_topic("chat").unwrap();
    queue.create_subscription("chat-local", "chat").unwrap();
    queue
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ChatLine {
    from: String,
    text: String,
}

#[test]
fn topic_and_subscription_administration() {
    let queue = project();
    queue.create_topic("audit").unwrap();
    queue.create_subscription("audit-archive", "audit").unwrap();

    assert_eq!(
        queue.list_topics().unwrap(),
        vec![
            "projects/demo-project/topics/audit",
            "projects/demo-project/topics/chat",
        ]
    );
    assert_eq!(
        queue.list_subscriptions("chat").unwrap(),
        vec!["projects/demo-project/subscriptions/chat-local"]
    );
    assert_eq!(queue.list_all_subscriptions().unwrap().len(), 2);

    queue.delete_subscription("audit-archive").unwrap();
    queue.delete_topic("audit").unwrap();

    assert_eq!(queue.list_topics().unwrap().len(), 1);
    assert!(matches!(
        queue.delete_topic("audit"),
        Err(QueueError::NotFound { kind: "topic", .. })
    ));
}

#[test]
fn publish_is_acknowledged_with_the_delivered_message_id() {
    let queue = project();
    let line = ChatLine {
        from: "ann".into(),
        text: "Hello, World!".into(),
    };

    let message_id = queue
        .publish("chat", Message::encode(&line).unwrap().with_attribute("room", "lobby"))
        .unwrap()
        .result(WAIT)
        .unwrap();

    let mut received = queue.pull("chat-local", 10).unwrap();
    assert_eq!(received.len(), 1);
    let delivery = received.remove(0);
    assert_eq!(delivery.message().message_id.as_deref(), Some(message_id.as_str()));
    assert_eq!(delivery.message().attributes["room"], "lobby");
    assert_eq!(delivery.message().decode::<ChatLine>().unwrap(), line);
    delivery.ack().unwrap();

    assert_eq!(queue.outstanding_len("chat-local").unwrap(), 0);
}

#[test]
fn streaming_pull_forwards_remote_messages_onto_the_local_bus() {
    let queue = project();
    let mediator: Mediator<String> = Mediator::new();
    let subscriber: Subscriber<String, Mediator<String>> =
        Subscriber::new(Arc::new(mediator.clone()));

    let (seen_tx, seen_rx) = mpsc::channel();
    mediator.subscribe_unbound("message", move |payload: &String| {
        seen_tx.send(payload.clone())?;
        Ok(())
    });

    let bus = mediator.clone();
    let pull = subscribe(
        queue.clone(),
        "chat-local",
        move |message| {
            let text = message.message().data_str().map(str::to_string);
            match text.map(|text| bus.publish("message", text)) {
                Some(Ok(())) => message.ack().unwrap(),
                _ => message.nack().unwrap(),
            }
        },
        POLL,
    );

    queue.publish("chat", Message::new("hi")).unwrap();
    queue.publish("chat", Message::new("there")).unwrap();

    assert_eq!(seen_rx.recv_timeout(WAIT).unwrap(), "hi");
    assert_eq!(seen_rx.recv_timeout(WAIT).unwrap(), "there");

    let stats = pull.cancel().unwrap();
    assert_eq!(stats.messages_received, 2);
    assert_eq!(subscriber.received(), vec!["hi".to_string(), "there".to_string()]);
    assert_eq!(queue.outstanding_len("chat-local").unwrap(), 0);
}

#[test]
fn nacked_messages_are_redelivered_to_the_stream() {
    let queue = project();
    let (tx, rx) = mpsc::channel();

    let pull = subscribe(
        queue.clone(),
        "chat-local",
        move |message| {
            let attempt = message.delivery_attempt();
            tx.send(attempt).unwrap();
            if attempt < 3 {
                message.nack().unwrap();
            } else {
                message.ack().unwrap();
            }
        },
        POLL,
    );

    queue.publish("chat", Message::new("flaky")).unwrap();

    let attempts: Vec<u32> = (0..3).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
    assert_eq!(attempts, vec![1, 2, 3]);
    assert_eq!(pull.cancel().unwrap().messages_received, 3);
}

#[test]
fn detaching_a_subscription_ends_its_stream() {
    let queue = project();
    let mut pull = subscribe(queue.clone(), "chat-local", |_| {}, POLL);

    queue.detach_subscription("chat-local").unwrap();

    assert_eq!(
        pull.result(WAIT).unwrap_err(),
        QueueError::Detached("chat-local".to_string())
    );
    assert!(queue.pull("chat-local", 1).is_err());
}

#[test]
fn push_envelope_carries_a_pulled_message() {
    let queue = project();
    queue.publish("chat", Message::new("over http")).unwrap();
    let delivery = queue.pull("chat-local", 1).unwrap().remove(0);

    let json = delivery
        .message()
        .to_push_json("projects/demo-project/subscriptions/chat-local")
        .unwrap();
    let (subscription, message) = Message::from_push_json(&json).unwrap();

    assert_eq!(subscription, "projects/demo-project/subscriptions/chat-local");
    assert_eq!(message.data_str(), Some("over http"));
    assert_eq!(&message, delivery.message());
    delivery.ack().unwrap();
}
