use std::sync::Arc;

use pubsub_mediator::{init_logging, Attachable, Config, EventBus, EventBusExt, Mediator, Subscriber};

struct MockObject {
    name: String,
}

impl MockObject {
    fn on_connection(&self, payload: &String) -> pubsub_mediator::HandlerResult {
        tracing::info!(object = %self.name, payload = %payload, "connection event");
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_logging(&config.logging)?;

    // One mediator shared by every participant
    let mediator: Mediator<String> = Mediator::with_config(config.bus);

    // Give a plain object an event bus routed to the mediator
    let mock = mediator.attach(MockObject {
        name: "mock object".to_string(),
    });

    // A subscriber talks over the "message" event
    let subscriber: Subscriber<String, Mediator<String>> =
        Subscriber::new(Arc::new(mediator.clone()));
    subscriber.send("Hello, World!")?;

    // Handlers are bound to an explicit context
    let context = Arc::new(MockObject {
        name: "listener".to_string(),
    });
    mediator.subscribe("connection", MockObject::on_connection, context);

    // Publishing through the attached object reaches the mediator's handlers
    mock.event_bus()
        .publish("connection", format!("{} connected", mock.name))?;

    tracing::info!(
        received = subscriber.received().len(),
        subscriptions = mediator.subscription_count(),
        "demo finished"
    );
    Ok(())
}
