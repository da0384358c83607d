//! Status normalization and change detection.
//!
//! A probe result becomes a [`Summary`]; [`changed`] decides whether that
//! summary is worth notifying about relative to the last notified status.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use scc::hash_map::Entry;

use crate::models::{CachedStatus, ServerKey, StatusResult};

/// Canonical snapshot of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
  pub online_count: u32,
  pub max_count: u32,
  /// `online/max`
  pub online_display: String,
  /// Distinct sampled names, sorted.
  pub player_names: BTreeSet<String>,
  /// Sorted names joined with `", "`.
  pub players_display: String,
}

impl Summary {
  /// The part of the summary kept for change detection.
  pub fn to_cached(&self) -> CachedStatus {
    CachedStatus {
      online: self.online_display.clone(),
      players: self.players_display.clone(),
    }
  }

  /// Whether the sample lists every online player.
  pub fn is_complete(&self) -> bool {
    self.online_count as usize == self.player_names.len()
  }
}

pub fn normalize(result: &StatusResult) -> Summary {
  let player_names: BTreeSet<String> = result.sample.iter().cloned().collect();
  let players_display = player_names
    .iter()
    .map(String::as_str)
    .collect::<Vec<_>>()
    .join(", ");

  Summary {
    online_count: result.online,
    max_count: result.max,
    online_display: format!("{}/{}", result.online, result.max),
    player_names,
    players_display,
  }
}

/// True only when the sample is complete AND both display strings differ from `prev`.
pub fn changed(prev: Option<&CachedStatus>, next: &Summary) -> bool {
  if !next.is_complete() {
    return false;
  }
  match prev {
    Some(prev) => next.online_display != prev.online && next.players_display != prev.players,
    None => true,
  }
}

/// Last notified status per server.
pub struct StatusCache {
  statuses: scc::HashMap<ServerKey, CachedStatus>,
  /// Bumped on every replacement, across all servers.
  generation: AtomicU64,
}

impl StatusCache {
  pub fn new() -> Self {
    Self {
      statuses: scc::HashMap::new(),
      generation: AtomicU64::new(0),
    }
  }

  /// Store `summary` if [`changed`] says it differs from the cached status.
  ///
  /// Returns the generation of the replacement, or `None` if nothing changed.
  /// The check, the write and the generation bump happen under the same entry
  /// lock, so for one server a later replacement always has a higher generation.
  pub async fn replace_if_changed(&self, server: &ServerKey, summary: &Summary) -> Option<u64> {
    match self.statuses.entry_async(server.clone()).await {
      Entry::Occupied(mut entry) => {
        if !changed(Some(entry.get()), summary) {
          return None;
        }
        *entry.get_mut() = summary.to_cached();
        Some(self.next_generation())
      }
      Entry::Vacant(entry) => {
        if !changed(None, summary) {
          return None;
        }
        let generation = self.next_generation();
        entry.insert_entry(summary.to_cached());
        Some(generation)
      }
    }
  }

  fn next_generation(&self) -> u64 {
    self.generation.fetch_add(1, Ordering::SeqCst) + 1
  }

  pub async fn get(&self, server: &ServerKey) -> Option<CachedStatus> {
    self.statuses.read_async(server, |_, status| status.clone()).await
  }
}

impl Default for StatusCache {
  fn default() -> Self {
    Self::new()
  }
}
