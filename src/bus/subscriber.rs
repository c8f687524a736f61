//! Subscriber - a component that listens and sends on the `"message"` event.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use super::{EventBus, EventBusExt};
use crate::error::{BusError, HandlerResult};

/// Event name every [`Subscriber`] listens and sends on.
pub const MESSAGE_EVENT: &str = "message";

/// Holds a reference to a publisher, listens on [`MESSAGE_EVENT`] and sends
/// on it.
///
/// The bus type defaults to `dyn EventBus<P>`; use a concrete type (for
/// example `Mediator<P>`) to keep access to its own API through
/// [`Subscriber::publisher`].
pub struct Subscriber<P: 'static, B: ?Sized = dyn EventBus<P>> {
    publisher: Arc<B>,
    mailbox: Arc<Mailbox<P>>,
}

impl<P, B> Subscriber<P, B>
where
    P: Clone + fmt::Debug + Send + Sync + 'static,
    B: EventBus<P> + ?Sized,
{
    /// Register this subscriber's message handler on `publisher`.
    pub fn new(publisher: Arc<B>) -> Self {
        let mailbox = Arc::new(Mailbox::default());
        publisher.subscribe(MESSAGE_EVENT, Mailbox::on_message, Arc::clone(&mailbox));
        tracing::debug!("subscriber registered");

        Self { publisher, mailbox }
    }

    /// Publish `message` as a [`MESSAGE_EVENT`].
    pub fn send(&self, message: impl Into<P>) -> Result<(), BusError> {
        tracing::debug!("sending message");
        self.publisher.publish(MESSAGE_EVENT, message.into())
    }

    pub fn publisher(&self) -> &Arc<B> {
        &self.publisher
    }

    /// Messages delivered to this subscriber, oldest first.
    pub fn received(&self) -> Vec<P> {
        self.mailbox.messages()
    }
}

/// The subscriber's own state, bound as the context of its message handler.
///
/// Kept apart from the publisher reference so the publisher's channel does
/// not point back at the publisher.
struct Mailbox<P> {
    messages: Mutex<Vec<P>>,
}

impl<P> Default for Mailbox<P> {
    fn default() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }
}

impl<P: Clone + fmt::Debug> Mailbox<P> {
    fn on_message(&self, message: &P) -> HandlerResult {
        tracing::info!(content = ?message, "user sent message");
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }

    fn messages(&self) -> Vec<P> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
