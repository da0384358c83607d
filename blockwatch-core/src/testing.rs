//! In-process collaborators for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::dispatch::MessageGateway;
use crate::error::{DeliveryError, ProbeError};
use crate::models::{MessageId, ServerKey, StatusResult, SubscriberId};
use crate::probe::StatusProbe;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
  pub to: SubscriberId,
  pub text: String,
  pub silent: bool,
  pub id: MessageId,
}

/// Records every send/delete and hands out increasing message ids.
#[derive(Default)]
pub struct FakeGateway {
  next_id: AtomicU64,
  sent: Mutex<Vec<SentMessage>>,
  deleted: Mutex<Vec<(SubscriberId, MessageId)>>,
  failing_sends: Mutex<HashSet<SubscriberId>>,
  failing_deletes: Mutex<HashSet<SubscriberId>>,
  send_delays: Mutex<VecDeque<Duration>>,
}

impl FakeGateway {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn fail_sends_for(&self, subscriber: SubscriberId) {
    self.failing_sends.lock().unwrap().insert(subscriber);
  }

  pub fn fail_deletes_for(&self, subscriber: SubscriberId) {
    self.failing_deletes.lock().unwrap().insert(subscriber);
  }

  /// Hold the next send for `delay` before it goes out.
  pub fn delay_next_send(&self, delay: Duration) {
    self.send_delays.lock().unwrap().push_back(delay);
  }

  pub fn sent(&self) -> Vec<SentMessage> {
    self.sent.lock().unwrap().clone()
  }

  pub fn deleted(&self) -> Vec<(SubscriberId, MessageId)> {
    self.deleted.lock().unwrap().clone()
  }
}

#[async_trait]
impl MessageGateway for FakeGateway {
  async fn send_message(
    &self,
    to: SubscriberId,
    text: &str,
    silent: bool,
  ) -> Result<MessageId, DeliveryError> {
    let delay = self.send_delays.lock().unwrap().pop_front();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    if self.failing_sends.lock().unwrap().contains(&to) {
      return Err(DeliveryError::Gateway("missing access".to_string()));
    }
    let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    self.sent.lock().unwrap().push(SentMessage {
      to,
      text: text.to_string(),
      silent,
      id,
    });
    Ok(id)
  }

  async fn delete_message(&self, to: SubscriberId, message: MessageId) -> Result<(), DeliveryError> {
    if self.failing_deletes.lock().unwrap().contains(&to) {
      return Err(DeliveryError::Gateway("unknown message".to_string()));
    }
    self.deleted.lock().unwrap().push((to, message));
    Ok(())
  }
}

/// Replays scripted probe results per server. Unscripted probes time out.
#[derive(Default)]
pub struct FakeProbe {
  scripted: Mutex<HashMap<ServerKey, VecDeque<Result<StatusResult, ProbeError>>>>,
  delays: Mutex<HashMap<ServerKey, Duration>>,
  probed: Mutex<Vec<ServerKey>>,
}

impl FakeProbe {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&self, server: &ServerKey, result: Result<StatusResult, ProbeError>) {
    self
      .scripted
      .lock()
      .unwrap()
      .entry(server.clone())
      .or_default()
      .push_back(result);
  }

  pub fn delay(&self, server: &ServerKey, delay: Duration) {
    self.delays.lock().unwrap().insert(server.clone(), delay);
  }

  pub fn probed(&self) -> Vec<ServerKey> {
    self.probed.lock().unwrap().clone()
  }
}

#[async_trait]
impl StatusProbe for FakeProbe {
  async fn probe(&self, server: &ServerKey) -> Result<StatusResult, ProbeError> {
    self.probed.lock().unwrap().push(server.clone());
    let delay = self.delays.lock().unwrap().get(server).copied();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    let next = self
      .scripted
      .lock()
      .unwrap()
      .get_mut(server)
      .and_then(VecDeque::pop_front);
    next.unwrap_or(Err(ProbeError::Timeout(Duration::from_secs(10))))
  }
}

pub fn status(online: u32, max: u32, sample: &[&str]) -> StatusResult {
  StatusResult {
    online,
    max,
    sample: sample.iter().map(|s| s.to_string()).collect(),
  }
}
