use crate::binding::BoundHandler;

/// An event name paired with an already-bound handler.
#[derive(Clone, Debug)]
pub struct Subscription<P> {
    event: String,
    handler: BoundHandler<P>,
}

impl<P> Subscription<P> {
    pub fn new(event: impl Into<String>, handler: BoundHandler<P>) -> Self {
        Self {
            event: event.into(),
            handler,
        }
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn handler(&self) -> &BoundHandler<P> {
        &self.handler
    }

    /// Exact, case-sensitive name match.
    pub fn matches(&self, event: &str) -> bool {
        self.event == event
    }
}
