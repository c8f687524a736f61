//! Mediator - a publisher that takes over other objects' pub/sub traffic.

use std::ops::Deref;
use std::sync::Arc;

use super::{Attachable, Attached, BusSlot, EventBus, Publisher};
use crate::binding::BoundHandler;
use crate::config::BusConfig;
use crate::error::BusError;

/// A [`Publisher`] that other objects can be attached to.
///
/// Attaching points the object's [`BusSlot`] at the mediator, so code that
/// publishes or subscribes through the object is really talking to the
/// mediator's channel. Objects attached to the same mediator share one bus
/// without holding references to each other.
///
/// ## Example
///
/// ```
/// use pubsub_mediator::{Attachable, EventBus, EventBusExt, Mediator};
///
/// struct Room {
///     name: String,
/// }
///
/// let mediator: Mediator<String> = Mediator::new();
/// let room = mediator.attach(Room { name: "lobby".into() });
///
/// mediator.subscribe_unbound("evt", |payload: &String| {
///     assert_eq!(payload, "y");
///     Ok(())
/// });
///
/// // Publishing through the object reaches the mediator's handlers.
/// room.event_bus().publish("evt", "y".to_string()).unwrap();
/// assert_eq!(room.name, "lobby");
/// ```
pub struct Mediator<P> {
    publisher: Publisher<P>,
}

impl<P> Clone for Mediator<P> {
    fn clone(&self) -> Self {
        Self {
            publisher: self.publisher.clone(),
        }
    }
}

impl<P: 'static> Default for Mediator<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: 'static> Mediator<P> {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            publisher: Publisher::with_config(config),
        }
    }

    /// The underlying publisher.
    pub fn publisher(&self) -> &Publisher<P> {
        &self.publisher
    }

    /// Take over `obj`'s event bus.
    ///
    /// The object's channel is replaced by a fresh empty one (its previous
    /// subscriptions are dropped, not merged) and its slot is routed to this
    /// mediator. Attaching again resets the channel again; routing stays the
    /// same.
    pub fn attach_to_object<T>(&self, obj: &mut T)
    where
        T: Attachable<P> + ?Sized,
    {
        let discarded = obj.bus_slot_mut().route_to(Arc::new(self.clone()));
        tracing::debug!(discarded, "object attached to mediator");
    }

    /// Give `value` a bus slot routed to this mediator.
    ///
    /// For objects that have no slot of their own.
    pub fn attach<T>(&self, value: T) -> Attached<P, T> {
        let mut attached = Attached::new(value, BusSlot::new());
        self.attach_to_object(&mut attached);
        attached
    }
}

impl<P: 'static> Deref for Mediator<P> {
    type Target = Publisher<P>;

    fn deref(&self) -> &Publisher<P> {
        &self.publisher
    }
}

impl<P: 'static> EventBus<P> for Mediator<P> {
    fn subscribe_bound(&self, event: String, handler: BoundHandler<P>) {
        self.publisher.subscribe_bound(event, handler)
    }

    fn publish(&self, event: &str, payload: P) -> Result<(), BusError> {
        self.publisher.publish(event, payload)
    }
}
