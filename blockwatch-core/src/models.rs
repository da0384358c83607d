use std::fmt;
use std::str::FromStr;

use crate::error::InvalidServerKey;

/// Port a Minecraft server listens on when the key doesn't name one.
pub const DEFAULT_PORT: u16 = 25565;

const MAX_HOST_LEN: usize = 253;

/// Identifier of a Minecraft server endpoint (`host[:port]`).
///
/// The host is stored lower-case so `Play.Example.com` and `play.example.com`
/// share subscribers and cached status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerKey(String);

impl ServerKey {
  /// Parse a server address, stripping an optional `http(s)://` prefix and trailing `/`.
  pub fn parse(raw: &str) -> Result<Self, InvalidServerKey> {
    let trimmed = raw.trim();
    let trimmed = trimmed
      .strip_prefix("https://")
      .or_else(|| trimmed.strip_prefix("http://"))
      .unwrap_or(trimmed)
      .trim_end_matches('/');

    let (host, port) = match trimmed.rsplit_once(':') {
      Some((host, port)) => {
        let port: u16 = port
          .parse()
          .map_err(|_| InvalidServerKey::InvalidPort(port.to_string()))?;
        if port == 0 {
          return Err(InvalidServerKey::InvalidPort("0".to_string()));
        }
        (host, Some(port))
      }
      None => (trimmed, None),
    };

    if host.is_empty() {
      return Err(InvalidServerKey::EmptyHost);
    }
    if host.len() > MAX_HOST_LEN {
      return Err(InvalidServerKey::HostTooLong(host.len()));
    }
    if !host
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
      return Err(InvalidServerKey::InvalidHost(host.to_string()));
    }

    let host = host.to_ascii_lowercase();
    Ok(match port {
      Some(port) => Self(format!("{host}:{port}")),
      None => Self(host),
    })
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Host part of the key.
  pub fn host(&self) -> &str {
    match self.0.rsplit_once(':') {
      Some((host, _)) => host,
      None => &self.0,
    }
  }

  /// Port part of the key, or [`DEFAULT_PORT`].
  pub fn port(&self) -> u16 {
    self
      .0
      .rsplit_once(':')
      .and_then(|(_, port)| port.parse().ok())
      .unwrap_or(DEFAULT_PORT)
  }
}

impl FromStr for ServerKey {
  type Err = InvalidServerKey;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl fmt::Display for ServerKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A chat channel receiving status notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

impl fmt::Display for SubscriberId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Identifier the messaging platform assigned to a sent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

/// Raw result of one successful probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResult {
  /// Players the server reports as online.
  pub online: u32,
  /// Player slots.
  pub max: u32,
  /// Sampled player names, in the order the server sent them.
  pub sample: Vec<String>,
}

/// Last-notified status of a server, used for change detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedStatus {
  /// `online/max`
  pub online: String,
  /// Sorted, comma-joined player names
  pub players: String,
}
