//! Attachable objects: a settable event-bus field instead of patched methods.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use super::{EventBus, Publisher};
use crate::binding::BoundHandler;
use crate::error::BusError;

/// The event-bus field of an attachable object.
///
/// Until it is routed, the slot behaves as the object's own private
/// publisher. Once routed (see [`Mediator::attach_to_object`]) every
/// subscribe and publish goes to the shared bus instead, and the object keeps
/// no pub/sub state of its own.
///
/// [`Mediator::attach_to_object`]: super::Mediator::attach_to_object
pub struct BusSlot<P: 'static> {
    channel: Publisher<P>,
    route: Option<Arc<dyn EventBus<P>>>,
}

impl<P: 'static> Default for BusSlot<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: 'static> BusSlot<P> {
    pub fn new() -> Self {
        Self {
            channel: Publisher::new(),
            route: None,
        }
    }

    /// True once the slot forwards to a shared bus.
    pub fn is_mediated(&self) -> bool {
        self.route.is_some()
    }

    /// Subscriptions held in the slot's own channel.
    pub fn local_subscription_count(&self) -> usize {
        self.channel.subscription_count()
    }

    /// Drop the current channel and route everything to `bus`.
    ///
    /// Returns the number of local subscriptions discarded.
    pub fn route_to(&mut self, bus: Arc<dyn EventBus<P>>) -> usize {
        let discarded = self.channel.subscription_count();
        self.channel = Publisher::new();
        self.route = Some(bus);
        discarded
    }

    fn target(&self) -> &dyn EventBus<P> {
        match &self.route {
            Some(bus) => bus.as_ref(),
            None => &self.channel,
        }
    }
}

impl<P: 'static> EventBus<P> for BusSlot<P> {
    fn subscribe_bound(&self, event: String, handler: BoundHandler<P>) {
        self.target().subscribe_bound(event, handler)
    }

    fn publish(&self, event: &str, payload: P) -> Result<(), BusError> {
        self.target().publish(event, payload)
    }
}

impl<P: 'static> fmt::Debug for BusSlot<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusSlot")
            .field("mediated", &self.is_mediated())
            .field("local_subscriptions", &self.local_subscription_count())
            .finish()
    }
}

/// An object that carries a [`BusSlot`] and can therefore be attached to a
/// mediator.
pub trait Attachable<P: 'static> {
    fn bus_slot(&self) -> &BusSlot<P>;

    fn bus_slot_mut(&mut self) -> &mut BusSlot<P>;

    /// The object's event bus, for `obj.event_bus().publish(...)`.
    fn event_bus(&self) -> &BusSlot<P> {
        self.bus_slot()
    }
}

/// Any value given a [`BusSlot`] after the fact.
///
/// Created by [`Mediator::attach`] for objects that were never designed with
/// a slot. Derefs to the wrapped value.
///
/// [`Mediator::attach`]: super::Mediator::attach
pub struct Attached<P: 'static, T> {
    value: T,
    slot: BusSlot<P>,
}

impl<P: 'static, T> Attached<P, T> {
    pub(crate) fn new(value: T, slot: BusSlot<P>) -> Self {
        Self { value, slot }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<P: 'static, T> Attachable<P> for Attached<P, T> {
    fn bus_slot(&self) -> &BusSlot<P> {
        &self.slot
    }

    fn bus_slot_mut(&mut self) -> &mut BusSlot<P> {
        &mut self.slot
    }
}

impl<P: 'static, T> Deref for Attached<P, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<P: 'static, T> DerefMut for Attached<P, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}
