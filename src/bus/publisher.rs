//! In-process publisher: one event channel, synchronous ordered delivery.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use super::EventBus;
use crate::binding::BoundHandler;
use crate::channel::{EventChannel, Subscription};
use crate::config::{BusConfig, ReentrancyMode};
use crate::error::BusError;

/// Owns an [`EventChannel`] and delivers published payloads to it.
///
/// Cloning yields another handle to the same channel (shared via `Arc`), so
/// a publisher can be handed to any number of components.
///
/// ## Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use pubsub_mediator::{EventBus, EventBusExt, HandlerResult, Publisher};
///
/// struct Log(Mutex<Vec<String>>);
///
/// impl Log {
///     fn record(&self, payload: &String) -> HandlerResult {
///         self.0.lock().unwrap().push(payload.clone());
///         Ok(())
///     }
/// }
///
/// let publisher: Publisher<String> = Publisher::new();
/// let log = Arc::new(Log(Mutex::new(Vec::new())));
///
/// publisher.subscribe("connection", Log::record, Arc::clone(&log));
/// publisher.publish("connection", "x".to_string()).unwrap();
/// publisher.publish("unknown", "ignored".to_string()).unwrap();
///
/// assert_eq!(*log.0.lock().unwrap(), vec!["x".to_string()]);
/// ```
pub struct Publisher<P> {
    inner: Arc<Inner<P>>,
}

struct Inner<P> {
    channel: Mutex<EventChannel<P>>,
    /// Threads currently inside `publish`; only tracked in `Reject` mode.
    publishing: Mutex<HashSet<ThreadId>>,
    config: BusConfig,
}

impl<P> Clone for Publisher<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: 'static> Default for Publisher<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: 'static> Publisher<P> {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        tracing::debug!(reentrancy = ?config.reentrancy, "publisher created");
        Self {
            inner: Arc::new(Inner {
                channel: Mutex::new(EventChannel::new()),
                publishing: Mutex::new(HashSet::new()),
                config,
            }),
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Total subscriptions across all events.
    pub fn subscription_count(&self) -> usize {
        self.channel().len()
    }

    /// Distinct subscribed event names, in first-registration order.
    pub fn events(&self) -> Vec<String> {
        self.channel().events()
    }

    /// True when both handles share one channel.
    pub fn same_channel(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // The channel is append-only, so a panic elsewhere can never leave it
    // half-written and a poisoned lock is safe to reuse.
    fn channel(&self) -> MutexGuard<'_, EventChannel<P>> {
        self.inner
            .channel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, event: &str) -> Result<Option<PublishGuard<'_>>, BusError> {
        if self.inner.config.reentrancy != ReentrancyMode::Reject {
            return Ok(None);
        }

        let current = thread::current().id();
        let mut publishing = self
            .inner
            .publishing
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !publishing.insert(current) {
            tracing::warn!(event = %event, "reentrant publish rejected");
            return Err(BusError::ReentrantPublish {
                event: event.to_string(),
            });
        }

        Ok(Some(PublishGuard {
            publishing: &self.inner.publishing,
            thread: current,
        }))
    }
}

impl<P: 'static> EventBus<P> for Publisher<P> {
    fn subscribe_bound(&self, event: String, handler: BoundHandler<P>) {
        let mut channel = self.channel();
        channel.push(Subscription::new(event, handler));
        tracing::trace!(subscriptions = channel.len(), "subscription appended");
    }

    fn publish(&self, event: &str, payload: P) -> Result<(), BusError> {
        let _guard = self.enter(event)?;

        // Snapshot, then deliver without holding the lock so handlers may
        // subscribe or publish themselves.
        let handlers = self.channel().matching(event);
        tracing::debug!(event = %event, handlers = handlers.len(), "publishing");

        for (position, handler) in handlers.iter().enumerate() {
            handler
                .call(&payload)
                .map_err(|err| BusError::handler(event, position, err))?;
        }
        Ok(())
    }
}

/// Removes the publishing thread's marker when delivery ends, including on
/// error or unwinding.
struct PublishGuard<'a> {
    publishing: &'a Mutex<HashSet<ThreadId>>,
    thread: ThreadId,
}

impl Drop for PublishGuard<'_> {
    fn drop(&mut self) {
        self.publishing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.thread);
    }
}
