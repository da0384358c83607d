//! Subscription-and-notification engine for Minecraft server status.
//!
//! Chats subscribe to servers; a [`Scheduler`] probes every subscribed server
//! on a fixed interval and the [`Engine`] decides when a status change is worth
//! telling subscribers about, replacing each chat's previous status message.

mod dispatch;
mod engine;
mod error;
mod models;
mod presence;
mod probe;
mod registry;
mod scheduler;
mod status;
pub mod time;

#[cfg(test)]
mod testing;

pub use dispatch::{Dispatcher, MessageGateway, ReplaceOutcome, render_status};
pub use engine::{Engine, ServerOverview, UpdateOutcome};
pub use error::{DeliveryError, InvalidServerKey, ProbeError, SubscriptionError};
pub use models::{
  CachedStatus, DEFAULT_PORT, MessageId, ServerKey, StatusResult, SubscriberId,
};
pub use presence::{PRESENCE_WINDOW_SECS, PresenceTracker};
pub use probe::StatusProbe;
pub use registry::SubscriptionRegistry;
pub use scheduler::{DEFAULT_POLL_INTERVAL, Scheduler, SchedulerHandle};
pub use status::{StatusCache, Summary, changed, normalize};
