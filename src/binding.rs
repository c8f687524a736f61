//! Handler binding - partial application of a fixed context.
//!
//! A [`BoundHandler`] is what a channel stores: a callable that already
//! carries the value it runs against, so the publisher can invoke it later
//! without knowing who owns it.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use pubsub_mediator::{bind, HandlerResult};
//!
//! struct Counter {
//!     seen: Mutex<Vec<String>>,
//! }
//!
//! impl Counter {
//!     fn on_event(&self, payload: &String) -> HandlerResult {
//!         self.seen.lock().unwrap().push(payload.clone());
//!         Ok(())
//!     }
//! }
//!
//! let counter = Arc::new(Counter { seen: Mutex::new(Vec::new()) });
//! let handler = bind(Arc::clone(&counter), Counter::on_event);
//!
//! handler.call(&"hello".to_string()).unwrap();
//! assert_eq!(*counter.seen.lock().unwrap(), vec!["hello".to_string()]);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::HandlerResult;

type HandlerFn<P> = dyn Fn(&P) -> HandlerResult + Send + Sync;

/// A handler with its invocation context already applied.
///
/// Clones share the same wrapper. Equality is wrapper identity: binding the
/// same function to the same context twice yields two unequal handlers.
pub struct BoundHandler<P> {
    inner: Arc<HandlerFn<P>>,
}

impl<P: 'static> BoundHandler<P> {
    /// Wrap a closure that already captures everything it needs.
    pub fn from_fn<F>(handler: F) -> Self
    where
        F: Fn(&P) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(handler),
        }
    }

    /// Invoke the handler with one payload.
    pub fn call(&self, payload: &P) -> HandlerResult {
        (self.inner)(payload)
    }

    /// True when both values are clones of the same wrapper.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<P> Clone for BoundHandler<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: 'static> PartialEq for BoundHandler<P> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<P> fmt::Debug for BoundHandler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundHandler")
            .field("ptr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

/// Fix `context` as the first argument of `handler`.
///
/// The context is shared, not copied: the bound handler always sees the
/// current state of `context`, including mutations made elsewhere through
/// interior mutability.
pub fn bind<C, P, F>(context: Arc<C>, handler: F) -> BoundHandler<P>
where
    C: Send + Sync + 'static,
    P: 'static,
    F: Fn(&C, &P) -> HandlerResult + Send + Sync + 'static,
{
    BoundHandler::from_fn(move |payload: &P| handler(&*context, payload))
}
