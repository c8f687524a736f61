//! Event channel - the ordered subscription log a publisher owns.

mod event_channel;
mod subscription;

pub use event_channel::EventChannel;
pub use subscription::Subscription;
