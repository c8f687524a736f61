use super::Subscription;
use crate::binding::BoundHandler;

/// Ordered sequence of subscriptions.
///
/// Insertion order is invocation order. The same event name may appear any
/// number of times, and there is no removal.
#[derive(Clone, Debug)]
pub struct EventChannel<P> {
    subscriptions: Vec<Subscription<P>>,
}

impl<P> Default for EventChannel<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> EventChannel<P> {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Append a subscription after every existing entry.
    pub fn push(&mut self, subscription: Subscription<P>) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subscription<P>> {
        self.subscriptions.iter()
    }

    /// Handlers registered for `event`, in registration order.
    pub fn matching(&self, event: &str) -> Vec<BoundHandler<P>> {
        self.subscriptions
            .iter()
            .filter(|sub| sub.matches(event))
            .map(|sub| sub.handler().clone())
            .collect()
    }

    /// Distinct event names in order of first registration.
    pub fn events(&self) -> Vec<String> {
        let mut events: Vec<String> = Vec::new();
        for sub in &self.subscriptions {
            if !events.iter().any(|e| e == sub.event()) {
                events.push(sub.event().to_string());
            }
        }
        events
    }
}
