//! Event Bus - in-process publish/subscribe
//!
//! Components exchange named events through a shared bus instead of holding
//! references to each other.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Subscriber (per component)                  │
//! │  - holds Arc<bus>, listens on "message"                     │
//! │  - send() = publish("message", ..)                          │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     EventBus trait                           │
//! │  subscribe_bound(event, handler) / publish(event, payload)  │
//! └─────────────────────────────────────────────────────────────┘
//!          │                  │                     │
//!          ▼                  ▼                     ▼
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────────────┐
//! │  Publisher  │◄───│  Mediator   │◄───│ BusSlot (attached   │
//! │ (channel)   │    │ (is-a pub.) │    │  object's bus field)│
//! └─────────────┘    └─────────────┘    └─────────────────────┘
//! ```
//!
//! Delivery is synchronous: `publish` returns once every matching handler
//! has run, in registration order, and stops at the first handler error.

mod event_bus;
mod mediator;
mod publisher;
mod slot;
mod subscriber;

pub use event_bus::{EventBus, EventBusExt};
pub use mediator::Mediator;
pub use publisher::Publisher;
pub use slot::{Attachable, Attached, BusSlot};
pub use subscriber::{Subscriber, MESSAGE_EVENT};
