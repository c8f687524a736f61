mod binding;
pub mod bus;
mod channel;
#[cfg(feature = "cloud")]
pub mod cloud;
pub mod config;
mod error;
pub mod logging;

pub use binding::{bind, BoundHandler};
pub use bus::{
    Attachable, Attached, BusSlot, EventBus, EventBusExt, Mediator, Publisher, Subscriber,
    MESSAGE_EVENT,
};
pub use channel::{EventChannel, Subscription};
pub use config::{BusConfig, Config, ConfigError, ReentrancyMode};
pub use error::{BusError, HandlerError, HandlerResult};
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingError};
