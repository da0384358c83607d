use tracing::debug;

use crate::error::SubscriptionError;
use crate::models::{ServerKey, SubscriberId};

/// Which chats want updates for which servers.
///
/// Subscriber lists keep insertion order and never hold duplicates. A list
/// that becomes empty is removed, so every registered server has at least one
/// subscriber.
pub struct SubscriptionRegistry {
  servers: scc::HashMap<ServerKey, Vec<SubscriberId>>,
}

impl SubscriptionRegistry {
  pub fn new() -> Self {
    Self {
      servers: scc::HashMap::new(),
    }
  }

  pub async fn subscribe(
    &self,
    server: &ServerKey,
    subscriber: SubscriberId,
  ) -> Result<(), SubscriptionError> {
    let mut entry = self.servers.entry_async(server.clone()).await.or_default();
    let subscribers = entry.get_mut();
    if subscribers.contains(&subscriber) {
      return Err(SubscriptionError::AlreadySubscribed(server.clone()));
    }
    subscribers.push(subscriber);
    debug!(%server, %subscriber, count = subscribers.len(), "subscribed");
    Ok(())
  }

  pub async fn unsubscribe(
    &self,
    server: &ServerKey,
    subscriber: SubscriberId,
  ) -> Result<(), SubscriptionError> {
    let removed = self
      .servers
      .update_async(server, |_, subscribers| {
        match subscribers.iter().position(|s| *s == subscriber) {
          Some(idx) => {
            subscribers.remove(idx);
            true
          }
          None => false,
        }
      })
      .await
      .unwrap_or(false);

    if !removed {
      return Err(SubscriptionError::NotSubscribed(server.clone()));
    }
    let _ = self
      .servers
      .remove_if_async(server, |subscribers| subscribers.is_empty())
      .await;
    debug!(%server, %subscriber, "unsubscribed");
    Ok(())
  }

  /// Remove `subscriber` from every server. Returns the servers it was removed from.
  pub async fn unsubscribe_all(&self, subscriber: SubscriberId) -> Vec<ServerKey> {
    let mut removed_from = Vec::new();
    self
      .servers
      .retain_async(|server, subscribers| {
        let before = subscribers.len();
        subscribers.retain(|s| *s != subscriber);
        if subscribers.len() != before {
          removed_from.push(server.clone());
        }
        !subscribers.is_empty()
      })
      .await;
    debug!(%subscriber, servers = removed_from.len(), "unsubscribed from all servers");
    removed_from
  }

  /// Subscribers of a server in subscription order, possibly empty.
  pub async fn subscribers_of(&self, server: &ServerKey) -> Vec<SubscriberId> {
    self
      .servers
      .read_async(server, |_, subscribers| subscribers.clone())
      .await
      .unwrap_or_default()
  }

  /// Servers a subscriber is subscribed to, sorted.
  pub async fn servers_of(&self, subscriber: SubscriberId) -> Vec<ServerKey> {
    let mut servers = Vec::new();
    self
      .servers
      .iter_async(|server, subscribers| {
        if subscribers.contains(&subscriber) {
          servers.push(server.clone());
        }
        true
      })
      .await;
    servers.sort();
    servers
  }

  /// Every server with at least one subscriber, with its subscriber count, sorted.
  pub async fn active_servers(&self) -> Vec<(ServerKey, usize)> {
    let mut servers = Vec::new();
    self
      .servers
      .iter_async(|server, subscribers| {
        if !subscribers.is_empty() {
          servers.push((server.clone(), subscribers.len()));
        }
        true
      })
      .await;
    servers.sort();
    servers
  }
}

impl Default for SubscriptionRegistry {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(s: &str) -> ServerKey {
    ServerKey::parse(s).unwrap()
  }

  #[tokio::test]
  async fn test_subscribe_then_unsubscribe() {
    let registry = SubscriptionRegistry::new();
    let server = key("play.example.com");

    registry.subscribe(&server, SubscriberId(1)).await.unwrap();
    registry.subscribe(&server, SubscriberId(2)).await.unwrap();
    assert_eq!(
      registry.subscribers_of(&server).await,
      vec![SubscriberId(1), SubscriberId(2)]
    );

    registry.unsubscribe(&server, SubscriberId(1)).await.unwrap();
    assert_eq!(registry.subscribers_of(&server).await, vec![SubscriberId(2)]);
    assert_eq!(
      registry.unsubscribe(&server, SubscriberId(1)).await,
      Err(SubscriptionError::NotSubscribed(server.clone()))
    );
  }

  #[tokio::test]
  async fn test_duplicate_subscription_is_rejected() {
    let registry = SubscriptionRegistry::new();
    let server = key("play.example.com");

    registry.subscribe(&server, SubscriberId(7)).await.unwrap();
    assert_eq!(
      registry.subscribe(&server, SubscriberId(7)).await,
      Err(SubscriptionError::AlreadySubscribed(server.clone()))
    );
    assert_eq!(registry.subscribers_of(&server).await, vec![SubscriberId(7)]);
  }

  #[tokio::test]
  async fn test_unsubscribe_unknown_server() {
    let registry = SubscriptionRegistry::new();
    let server = key("nowhere.example.com");
    assert_eq!(
      registry.unsubscribe(&server, SubscriberId(1)).await,
      Err(SubscriptionError::NotSubscribed(server.clone()))
    );
    assert!(registry.subscribers_of(&server).await.is_empty());
  }

  #[tokio::test]
  async fn test_emptied_servers_are_pruned() {
    let registry = SubscriptionRegistry::new();
    let server = key("play.example.com");

    registry.subscribe(&server, SubscriberId(1)).await.unwrap();
    registry.unsubscribe(&server, SubscriberId(1)).await.unwrap();
    assert!(registry.active_servers().await.is_empty());
  }

  #[tokio::test]
  async fn test_unsubscribe_all() {
    let registry = SubscriptionRegistry::new();
    let a = key("a.example.com");
    let b = key("b.example.com:25570");
    let c = key("c.example.com");

    registry.subscribe(&a, SubscriberId(1)).await.unwrap();
    registry.subscribe(&a, SubscriberId(2)).await.unwrap();
    registry.subscribe(&b, SubscriberId(1)).await.unwrap();
    registry.subscribe(&c, SubscriberId(3)).await.unwrap();

    let mut removed = registry.unsubscribe_all(SubscriberId(1)).await;
    removed.sort();
    assert_eq!(removed, vec![a.clone(), b.clone()]);

    for server in [&a, &b, &c] {
      assert!(!registry.subscribers_of(server).await.contains(&SubscriberId(1)));
    }
    assert_eq!(registry.subscribers_of(&a).await, vec![SubscriberId(2)]);
    assert_eq!(
      registry.active_servers().await,
      vec![(a.clone(), 1), (c.clone(), 1)]
    );

    // Idempotent, even for subscribers that were never anywhere
    assert!(registry.unsubscribe_all(SubscriberId(1)).await.is_empty());
    assert!(registry.unsubscribe_all(SubscriberId(99)).await.is_empty());
  }

  #[tokio::test]
  async fn test_servers_of() {
    let registry = SubscriptionRegistry::new();
    let a = key("a.example.com");
    let b = key("b.example.com");

    registry.subscribe(&b, SubscriberId(1)).await.unwrap();
    registry.subscribe(&a, SubscriberId(1)).await.unwrap();
    registry.subscribe(&a, SubscriberId(2)).await.unwrap();

    assert_eq!(registry.servers_of(SubscriberId(1)).await, vec![a.clone(), b]);
    assert_eq!(registry.servers_of(SubscriberId(2)).await, vec![a]);
    assert!(registry.servers_of(SubscriberId(3)).await.is_empty());
  }
}
