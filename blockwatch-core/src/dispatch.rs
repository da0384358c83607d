//! Status notifications and the per-chat replace-on-update protocol.
//!
//! Each (server, chat) pair has at most one outstanding status message. A new
//! update deletes the outstanding one (best-effort) and sends a fresh, silent
//! message in its place.
//!
//! Updates carry the generation [`crate::StatusCache`] handed out for them.
//! Replacements for one pair run one at a time, and an update older than the
//! one the chat already shows is dropped.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::DeliveryError;
use crate::models::{CachedStatus, MessageId, ServerKey, SubscriberId};

/// Outbound half of the messaging platform.
#[async_trait]
pub trait MessageGateway: Send + Sync {
  /// Send `text` to a chat. `silent` asks the platform not to ping anyone.
  async fn send_message(
    &self,
    to: SubscriberId,
    text: &str,
    silent: bool,
  ) -> Result<MessageId, DeliveryError>;

  async fn delete_message(&self, to: SubscriberId, message: MessageId) -> Result<(), DeliveryError>;
}

/// What happened while replacing one chat's status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOutcome {
  pub subscriber: SubscriberId,
  /// The previous message existed and was deleted.
  pub deleted: bool,
  /// The new message went out.
  pub sent: bool,
  /// Id of the new message when `sent`.
  pub message: Option<MessageId>,
  /// A newer update already reached this chat, so this one was dropped.
  pub superseded: bool,
}

/// Render a status message.
///
/// `recent` adds the "last 24h" line; it's left out for one-off status replies.
pub fn render_status(server: &ServerKey, status: &CachedStatus, recent: Option<&[String]>) -> String {
  let mut text = format!("{}\nonline: {}", server, status.online);
  if !status.players.is_empty() {
    text.push_str(", players: ");
    text.push_str(&status.players);
  }
  if let Some(recent) = recent {
    text.push_str("\nlast 24h: ");
    text.push_str(&recent.join(", "));
  }
  text
}

/// Status message state of one (server, chat) pair.
#[derive(Debug, Default)]
struct Slot {
  message: Option<MessageId>,
  /// Generation of the newest update handled for this pair.
  generation: u64,
}

pub struct Dispatcher {
  gateway: Arc<dyn MessageGateway>,
  slots: scc::HashMap<(ServerKey, SubscriberId), Arc<Mutex<Slot>>>,
}

impl Dispatcher {
  pub fn new(gateway: Arc<dyn MessageGateway>) -> Self {
    Self {
      gateway,
      slots: scc::HashMap::new(),
    }
  }

  /// Replace every subscriber's status message for `server` with `text`.
  ///
  /// Subscribers are handled concurrently and independently; an empty
  /// subscriber list is a no-op.
  pub async fn notify(
    &self,
    server: &ServerKey,
    text: &str,
    generation: u64,
    subscribers: &[SubscriberId],
  ) -> Vec<ReplaceOutcome> {
    if subscribers.is_empty() {
      debug!(%server, "no subscribers left to notify");
      return Vec::new();
    }
    join_all(
      subscribers
        .iter()
        .map(|subscriber| self.replace(server, *subscriber, text, generation)),
    )
    .await
  }

  /// Delete the outstanding message (if any), then send `text` silently.
  ///
  /// A failed delete never stops the send. The old id is discarded either way.
  /// The pair stays locked from the delete until the new id is stored.
  pub async fn replace(
    &self,
    server: &ServerKey,
    subscriber: SubscriberId,
    text: &str,
    generation: u64,
  ) -> ReplaceOutcome {
    let mut outcome = ReplaceOutcome {
      subscriber,
      deleted: false,
      sent: false,
      message: None,
      superseded: false,
    };
    let slot = self
      .slots
      .entry_async((server.clone(), subscriber))
      .await
      .or_default()
      .get()
      .clone();
    let mut slot = slot.lock().await;

    if generation <= slot.generation {
      debug!(%server, %subscriber, generation, shown = slot.generation, "dropping superseded status");
      outcome.superseded = true;
      return outcome;
    }
    slot.generation = generation;

    if let Some(old) = slot.message.take() {
      match self.gateway.delete_message(subscriber, old).await {
        Ok(()) => outcome.deleted = true,
        Err(e) => warn!(%server, %subscriber, message = old.0, error = %e, "can't delete status message"),
      }
    }

    match self.gateway.send_message(subscriber, text, true).await {
      Ok(id) => {
        slot.message = Some(id);
        outcome.sent = true;
        outcome.message = Some(id);
      }
      Err(e) => warn!(%server, %subscriber, error = %e, "can't send status message"),
    }
    outcome
  }

  /// The status message currently shown to `subscriber` for `server`.
  pub async fn outstanding(&self, server: &ServerKey, subscriber: SubscriberId) -> Option<MessageId> {
    let slot = self
      .slots
      .read_async(&(server.clone(), subscriber), |_, slot| slot.clone())
      .await?;
    let message = slot.lock().await.message;
    message
  }

  /// Stop tracking the status message for this pair. The message itself stays in the chat.
  pub async fn forget(&self, server: &ServerKey, subscriber: SubscriberId) {
    let _ = self.slots.remove_async(&(server.clone(), subscriber)).await;
  }
}
