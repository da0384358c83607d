use std::sync::Arc;

use tracing::{debug, info};

use crate::dispatch::{Dispatcher, MessageGateway, ReplaceOutcome, render_status};
use crate::error::{ProbeError, SubscriptionError};
use crate::models::{CachedStatus, ServerKey, StatusResult, SubscriberId};
use crate::presence::PresenceTracker;
use crate::registry::SubscriptionRegistry;
use crate::status::{StatusCache, normalize};

/// What a probe result led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
  /// The probe failed; nothing was touched.
  ProbeFailed,
  /// Nothing notify-worthy changed.
  Unchanged,
  /// The cached status was replaced and subscribers were notified.
  Notified(Vec<ReplaceOutcome>),
}

/// A tracked server as seen from outside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOverview {
  pub server: ServerKey,
  pub subscribers: usize,
  pub status: Option<CachedStatus>,
}

/// Owns every table of the subscription-and-notification engine.
///
/// State lives as long as the engine; nothing is persisted.
pub struct Engine {
  registry: SubscriptionRegistry,
  statuses: StatusCache,
  presence: PresenceTracker,
  dispatcher: Dispatcher,
}

impl Engine {
  pub fn new(gateway: Arc<dyn MessageGateway>) -> Self {
    Self {
      registry: SubscriptionRegistry::new(),
      statuses: StatusCache::new(),
      presence: PresenceTracker::new(),
      dispatcher: Dispatcher::new(gateway),
    }
  }

  pub fn dispatcher(&self) -> &Dispatcher {
    &self.dispatcher
  }

  // ========================================================================
  // Subscriptions
  // ========================================================================

  pub async fn subscribe(
    &self,
    server: &ServerKey,
    subscriber: SubscriberId,
  ) -> Result<(), SubscriptionError> {
    self.registry.subscribe(server, subscriber).await?;
    info!(%server, %subscriber, "server added");
    Ok(())
  }

  pub async fn unsubscribe(
    &self,
    server: &ServerKey,
    subscriber: SubscriberId,
  ) -> Result<(), SubscriptionError> {
    self.registry.unsubscribe(server, subscriber).await?;
    self.dispatcher.forget(server, subscriber).await;
    info!(%server, %subscriber, "server removed");
    Ok(())
  }

  /// Always succeeds. Returns the servers the subscriber was removed from.
  pub async fn unsubscribe_all(&self, subscriber: SubscriberId) -> Vec<ServerKey> {
    let removed = self.registry.unsubscribe_all(subscriber).await;
    for server in &removed {
      self.dispatcher.forget(server, subscriber).await;
    }
    info!(%subscriber, servers = removed.len(), "unsubscribed from all servers");
    removed
  }

  pub async fn subscribers_of(&self, server: &ServerKey) -> Vec<SubscriberId> {
    self.registry.subscribers_of(server).await
  }

  pub async fn servers_of(&self, subscriber: SubscriberId) -> Vec<ServerKey> {
    self.registry.servers_of(subscriber).await
  }

  /// Servers with at least one subscriber, sorted.
  pub async fn active_servers(&self) -> Vec<ServerKey> {
    self
      .registry
      .active_servers()
      .await
      .into_iter()
      .map(|(server, _)| server)
      .collect()
  }

  // ========================================================================
  // Status
  // ========================================================================

  pub async fn cached_status(&self, server: &ServerKey) -> Option<CachedStatus> {
    self.statuses.get(server).await
  }

  pub async fn recent_players(&self, server: &ServerKey, now: i64) -> Vec<String> {
    self.presence.recent_players(server, now).await
  }

  pub async fn overview(&self, server: &ServerKey) -> Option<ServerOverview> {
    let subscribers = self.registry.subscribers_of(server).await.len();
    if subscribers == 0 {
      return None;
    }
    Some(ServerOverview {
      server: server.clone(),
      subscribers,
      status: self.statuses.get(server).await,
    })
  }

  pub async fn overviews(&self) -> Vec<ServerOverview> {
    let mut overviews = Vec::new();
    for (server, subscribers) in self.registry.active_servers().await {
      let status = self.statuses.get(&server).await;
      overviews.push(ServerOverview {
        server,
        subscribers,
        status,
      });
    }
    overviews
  }

  /// Feed one probe result through change detection and, if it changed,
  /// presence tracking and notification.
  ///
  /// The cache is only written when a notification follows, so the cached
  /// status always matches what subscribers were last told.
  pub async fn handle_probe_result(
    &self,
    server: &ServerKey,
    result: Result<StatusResult, ProbeError>,
    now: i64,
  ) -> UpdateOutcome {
    let result = match result {
      Ok(result) => result,
      Err(e) => {
        debug!(%server, error = %e, "probe failed");
        return UpdateOutcome::ProbeFailed;
      }
    };

    let summary = normalize(&result);
    let Some(generation) = self.statuses.replace_if_changed(server, &summary).await else {
      return UpdateOutcome::Unchanged;
    };

    self
      .presence
      .record(server, summary.player_names.iter().map(String::as_str), now)
      .await;
    let recent = self.presence.recent_players(server, now).await;
    let text = render_status(server, &summary.to_cached(), Some(&recent));

    let subscribers = self.registry.subscribers_of(server).await;
    info!(
      %server,
      online = %summary.online_display,
      players = %summary.players_display,
      subscribers = subscribers.len(),
      "status changed"
    );
    UpdateOutcome::Notified(
      self
        .dispatcher
        .notify(server, &text, generation, &subscribers)
        .await,
    )
  }
}
