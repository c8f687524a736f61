//! The event-bus capability shared by publishers, mediators and slots.

use std::sync::Arc;

use crate::binding::{bind, BoundHandler};
use crate::error::{BusError, HandlerResult};

/// Something handlers can be registered on and events published through.
///
/// Object safe, so attachable objects can hold an `Arc<dyn EventBus<P>>`
/// without knowing what sits behind it.
pub trait EventBus<P: 'static>: Send + Sync {
    /// Append an already-bound handler for `event`.
    fn subscribe_bound(&self, event: String, handler: BoundHandler<P>);

    /// Deliver `payload` to every handler registered for `event`, in
    /// registration order. The first failing handler aborts the rest.
    fn publish(&self, event: &str, payload: P) -> Result<(), BusError>;
}

/// Binding conveniences available on every [`EventBus`], trait objects included.
pub trait EventBusExt<P: 'static>: EventBus<P> {
    /// Bind `handler` to `context` and register it for `event`.
    fn subscribe<C, F>(&self, event: impl Into<String>, handler: F, context: Arc<C>)
    where
        C: Send + Sync + 'static,
        F: Fn(&C, &P) -> HandlerResult + Send + Sync + 'static,
    {
        self.subscribe_bound(event.into(), bind(context, handler));
    }

    /// Register a handler that has no separate context.
    ///
    /// The handler is bound to itself. This is accepted but logged as a
    /// warning, since it usually means a context was forgotten.
    fn subscribe_unbound<F>(&self, event: impl Into<String>, handler: F)
    where
        F: Fn(&P) -> HandlerResult + Send + Sync + 'static,
    {
        let event = event.into();
        tracing::warn!(event = %event, "no context given, binding handler to itself");
        let handler = Arc::new(handler);
        self.subscribe_bound(event, bind(handler, |h: &F, payload: &P| h(payload)));
    }
}

impl<P: 'static, B: EventBus<P> + ?Sized> EventBusExt<P> for B {}

impl<P: 'static, B: EventBus<P> + ?Sized> EventBus<P> for Arc<B> {
    fn subscribe_bound(&self, event: String, handler: BoundHandler<P>) {
        (**self).subscribe_bound(event, handler)
    }

    fn publish(&self, event: &str, payload: P) -> Result<(), BusError> {
        (**self).publish(event, payload)
    }
}
