use async_trait::async_trait;

use crate::error::ProbeError;
use crate::models::{ServerKey, StatusResult};

/// One status round-trip to a Minecraft server.
///
/// Implementations enforce their own timeout and turn every failure into a
/// [`ProbeError`].
#[async_trait]
pub trait StatusProbe: Send + Sync {
  async fn probe(&self, server: &ServerKey) -> Result<StatusResult, ProbeError>;
}
