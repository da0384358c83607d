//! Rolling record of recently seen players.

use crate::models::ServerKey;

/// Length of the "recently seen" window in seconds.
pub const PRESENCE_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Per-server map of player name to the last time it was seen online.
pub struct PresenceTracker {
  /// Each entry is (player_name, last_seen), kept in first-seen order.
  servers: scc::HashMap<ServerKey, Vec<(String, i64)>>,
}

impl PresenceTracker {
  pub fn new() -> Self {
    Self {
      servers: scc::HashMap::new(),
    }
  }

  /// Mark every name as seen at `now`.
  ///
  /// Entries that fell out of the window are dropped afterwards; they would
  /// never be returned by [`Self::recent_players`] again anyway.
  pub async fn record<'a, I>(&self, server: &ServerKey, names: I, now: i64)
  where
    I: IntoIterator<Item = &'a str>,
  {
    let names: Vec<&str> = names.into_iter().collect();
    if names.is_empty() {
      return;
    }

    let mut entry = self.servers.entry_async(server.clone()).await.or_default();
    let players = entry.get_mut();
    for name in names {
      match players.iter_mut().find(|(n, _)| n.as_str() == name) {
        Some((_, seen)) => *seen = (*seen).max(now),
        None => players.push((name.to_string(), now)),
      }
    }
    players.retain(|(_, seen)| *seen > now - PRESENCE_WINDOW_SECS);
  }

  /// Names seen strictly within the last 24 hours before `now`, in first-seen order.
  pub async fn recent_players(&self, server: &ServerKey, now: i64) -> Vec<String> {
    let cutoff = now - PRESENCE_WINDOW_SECS;
    self
      .servers
      .read_async(server, |_, players| {
        players
          .iter()
          .filter(|(_, seen)| *seen > cutoff)
          .map(|(name, _)| name.clone())
          .collect()
      })
      .await
      .unwrap_or_default()
  }

  /// Number of players remembered for a server, expired or not.
  pub async fn tracked_count(&self, server: &ServerKey) -> usize {
    self
      .servers
      .read_async(server, |_, players| players.len())
      .await
      .unwrap_or(0)
  }
}

impl Default for PresenceTracker {
  fn default() -> Self {
    Self::new()
  }
}
