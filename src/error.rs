use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error carried out of a failing handler.
pub type HandlerError = Box<dyn StdError + Send + Sync + 'static>;

/// Result returned by every handler body.
pub type HandlerResult = anyhow::Result<()>;

#[derive(Debug, Error)]
pub enum BusError {
    /// A handler returned an error. Handlers registered after it were not invoked.
    #[error("handler #{position} for event '{event}' failed: {source}")]
    Handler {
        event: String,
        position: usize,
        #[source]
        source: HandlerError,
    },

    /// A handler tried to publish on the bus that is currently delivering to it.
    #[error("reentrant publish of '{event}' rejected")]
    ReentrantPublish { event: String },
}

impl BusError {
    pub(crate) fn handler(event: &str, position: usize, err: anyhow::Error) -> Self {
        BusError::Handler {
            event: event.to_string(),
            position,
            source: err.into(),
        }
    }

    /// Event name the failed publish was delivering.
    pub fn event(&self) -> &str {
        match self {
            BusError::Handler { event, .. } | BusError::ReentrantPublish { event } => event,
        }
    }
}
