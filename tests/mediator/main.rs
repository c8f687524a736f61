
use std::io;
use std::sync::{Arc, Mutex};

use pubsub_mediator::{
    Attachable, BusConfig, BusError, EventBus, EventBusExt, Mediator, Publisher,
    ReentrancyMode, Subscriber, MESSAGE_EVENT,
};

use chat::{ChatRoom, Member};

fn new_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs<F: FnOnce()>(f: F) -> String {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    tracing::subscriber::with_default(subscriber, f);

    let bytes = captured.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

// =============================================================================
// Publisher delivery contract
// =============================================================================

#[test]
fn every_matching_handler_runs_once_in_order_with_the_payload() {
    let log = new_log();
    let publisher: Publisher<String> = Publisher::new();

    publisher.subscribe("connection", Member::on_connection, Member::new("ann", &log));
    publisher.subscribe("message", Member::on_connection, Member::new("zed", &log));
    publisher.subscribe("connection", Member::on_connection, Member::new("bob", &log));

    publisher.publish("connection", "x".to_string()).unwrap();

    assert_eq!(entries(&log), vec!["ann saw x", "bob saw x"]);
}

#[test]
fn publish_with_no_subscribers_returns_normally() {
    let mediator: Mediator<String> = Mediator::new();
    assert!(mediator.publish("connection", "x".to_string()).is_ok());
}

#[test]
fn handler_failure_surfaces_and_stops_delivery() {
    let log = new_log();
    let mediator: Mediator<String> = Mediator::new();

    mediator.subscribe("kick", Member::on_connection, Member::new("ann", &log));
    mediator.subscribe("kick", Member::on_kick, Member::new("bob", &log));
    mediator.subscribe("kick", Member::on_connection, Member::new("cid", &log));

    let err = mediator.publish("kick", "bob".to_string()).unwrap_err();

    assert!(matches!(err, BusError::Handler { position: 1, .. }));
    assert!(err.to_string().contains("bob refuses to leave"));
    assert_eq!(entries(&log), vec!["ann saw bob", "bob saw bob"]);
}

#[test]
fn bound_context_is_stable_across_mutation() {
    let log = new_log();
    let mediator: Mediator<String> = Mediator::new();
    let member = Member::new("ann", &log);

    mediator.subscribe("connection", Member::on_connection, Arc::clone(&member));
    *member.nick.lock().unwrap() = "annie".to_string();
    mediator.publish("connection", "x".to_string()).unwrap();

    assert_eq!(entries(&log), vec!["annie saw x"]);
}

#[test]
fn missing_context_falls_back_with_a_warning() {
    let mediator: Mediator<String> = Mediator::new();
    let seen = new_log();
    let sink = Arc::clone(&seen);

    let logs = capture_logs(|| {
        mediator.subscribe_unbound("connection", move |payload: &String| {
            sink.lock().unwrap().push(payload.clone());
            Ok(())
        });
    });
    mediator.publish("connection", "x".to_string()).unwrap();

    assert!(logs.contains("WARN"));
    assert!(logs.contains("no context given"));
    assert_eq!(entries(&seen), vec!["x"]);
}

// =============================================================================
// Subscriber
// =============================================================================

#[test]
fn subscriber_send_fires_its_own_handler_once() {
    let mediator: Mediator<String> = Mediator::new();
    let subscriber: Subscriber<String, Mediator<String>> = Subscriber::new(Arc::new(mediator));

    subscriber.send("hi").unwrap();

    assert_eq!(subscriber.received(), vec!["hi".to_string()]);
    assert_eq!(subscriber.publisher().events(), vec![MESSAGE_EVENT.to_string()]);
}

#[test]
fn subscriber_logs_received_messages() {
    let mediator: Mediator<String> = Mediator::new();
    let logs = capture_logs(|| {
        let subscriber: Subscriber<String, Mediator<String>> =
            Subscriber::new(Arc::new(mediator.clone()));
        subscriber.send("Hello, World!").unwrap();
    });

    assert!(logs.contains("user sent message"));
    assert!(logs.contains("Hello, World!"));
}

// =============================================================================
// Mediator attachment
// =============================================================================

#[test]
fn attached_object_publish_is_mediator_publish() {
    let log = new_log();
    let mediator: Mediator<String> = Mediator::new();
    let mut room = ChatRoom::new("lobby");

    mediator.attach_to_object(&mut room);
    mediator.subscribe("evt", Member::on_connection, Member::new("ann", &log));
    room.event_bus().publish("evt", "y".to_string()).unwrap();

    assert_eq!(entries(&log), vec!["ann saw y"]);
}

#[test]
fn prior_object_subscriptions_are_unreachable_after_attach() {
    let log = new_log();
    let mediator: Mediator<String> = Mediator::new();
    let mut room = ChatRoom::new("lobby");

    room.event_bus()
        .subscribe("evt", Member::on_connection, Member::new("old", &log));
    mediator.attach_to_object(&mut room);
    room.event_bus()
        .subscribe("evt", Member::on_connection, Member::new("new", &log));

    room.event_bus().publish("evt", "y".to_string()).unwrap();

    assert_eq!(entries(&log), vec!["new saw y"]);
    assert_eq!(mediator.subscription_count(), 1);
}

#[test]
fn reattaching_resets_the_channel_and_keeps_routing() {
    let log = new_log();
    let mediator: Mediator<String> = Mediator::new();
    let mut room = ChatRoom::new("lobby");

    mediator.attach_to_object(&mut room);
    room.event_bus()
        .subscribe("evt", Member::on_connection, Member::new("ann", &log));
    mediator.attach_to_object(&mut room);

    room.event_bus().publish("evt", "y".to_string()).unwrap();

    // Subscriptions made through the slot live on the mediator, so they survive.
    assert_eq!(entries(&log), vec!["ann saw y"]);
    assert!(room.bus_slot().is_mediated());
    assert_eq!(room.bus_slot().local_subscription_count(), 0);
}

#[test]
fn objects_without_a_slot_can_be_attached() {
    struct MockObject {
        name: &'static str,
    }

    let log = new_log();
    let mediator: Mediator<String> = Mediator::new();
    let mock = mediator.attach(MockObject {
        name: "mock object",
    });

    mediator.subscribe("connection", Member::on_connection, Member::new("ann", &log));
    mock.event_bus()
        .publish("connection", format!("{} connected", mock.name))
        .unwrap();

    assert_eq!(entries(&log), vec!["ann saw mock object connected"]);
}

#[test]
fn rooms_on_one_mediator_share_traffic_without_knowing_each_other() {
    let log = new_log();
    let mediator: Mediator<String> = Mediator::new();
    let mut lobby = ChatRoom::new("lobby");
    let mut games = ChatRoom::new("games");
    mediator.attach_to_object(&mut lobby);
    mediator.attach_to_object(&mut games);

    games
        .event_bus()
        .subscribe("connection", Member::on_connection, Member::new("ann", &log));
    lobby
        .event_bus()
        .publish("connection", format!("{} opened", lobby.name))
        .unwrap();

    assert_eq!(entries(&log), vec!["ann saw lobby opened"]);
}

// =============================================================================
// Reentrancy
// =============================================================================

#[test]
fn reject_mode_stops_a_handler_publishing_through_an_attached_object() {
    let mediator: Mediator<String> = Mediator::with_config(BusConfig {
        reentrancy: ReentrancyMode::Reject,
    });
    let room = Arc::new(Mutex::new(ChatRoom::new("lobby")));
    mediator.attach_to_object(&mut *room.lock().unwrap());

    let echo_room = Arc::clone(&room);
    mediator.subscribe_unbound("ping", move |payload: &String| {
        let room = echo_room.lock().unwrap();
        Ok(room.event_bus().publish("pong", payload.clone())?)
    });

    let err = mediator.publish("ping", "1".to_string()).unwrap_err();
    assert!(err.to_string().contains("reentrant publish of 'pong' rejected"));
}

#[test]
fn snapshot_mode_lets_handlers_chain_events() {
    let log = new_log();
    let mediator: Mediator<String> = Mediator::new();

    let bus = mediator.clone();
    mediator.subscribe_unbound("ping", move |payload: &String| {
        Ok(bus.publish("pong", format!("{}!", payload))?)
    });
    mediator.subscribe("pong", Member::on_connection, Member::new("ann", &log));

    mediator.publish("ping", "1".to_string()).unwrap();

    assert_eq!(entries(&log), vec!["ann saw 1!"]);
}
