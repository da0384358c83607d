//! Fixed-interval polling of every subscribed server.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, trace};

use crate::engine::{Engine, UpdateOutcome};
use crate::probe::StatusProbe;
use crate::time::now;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Clone)]
pub struct Scheduler {
  engine: Arc<Engine>,
  probe: Arc<dyn StatusProbe>,
  interval: Duration,
}

impl Scheduler {
  pub fn new(engine: Arc<Engine>, probe: Arc<dyn StatusProbe>, interval: Duration) -> Self {
    Self {
      engine,
      probe,
      interval,
    }
  }

  /// Probe every server that has subscribers.
  ///
  /// Each probe runs on its own task, so a slow server never holds up the
  /// others. The handles are only awaited by callers that care (tests).
  pub async fn tick(&self) -> Vec<JoinHandle<UpdateOutcome>> {
    let servers = self.engine.active_servers().await;
    trace!(servers = servers.len(), "poll tick");
    servers
      .into_iter()
      .map(|server| {
        let engine = self.engine.clone();
        let probe = self.probe.clone();
        tokio::spawn(async move {
          let result = probe.probe(&server).await;
          engine.handle_probe_result(&server, result, now()).await
        })
      })
      .collect()
  }

  /// Run [`Self::tick`] every interval until the handle is shut down.
  ///
  /// Probes from one tick aren't awaited before the next tick starts; a
  /// server that never answers can have several probes in flight.
  pub fn start(self) -> SchedulerHandle {
    info!(interval_ms = self.interval.as_millis() as u64, "starting poll scheduler");
    let handle = tokio::spawn(async move {
      let mut interval = tokio::time::interval(self.interval);
      interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        interval.tick().await;
        drop(self.tick().await);
      }
    });
    SchedulerHandle { handle }
  }
}

pub struct SchedulerHandle {
  handle: JoinHandle<()>,
}

impl SchedulerHandle {
  /// Stop issuing new ticks. Probes already in flight run to completion.
  pub async fn shutdown(self) {
    self.handle.abort();
    let _ = self.handle.await;
    info!("poll scheduler stopped");
  }
}
