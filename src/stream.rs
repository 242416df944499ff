use crate::aggregation::FleetAggregator;
use crate::config::Config;
use crate::error::Result;
use crate::prometheus::MetricsSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Why a publisher stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The subscriber went away.
    Disconnected,
    /// Computing or serializing a snapshot failed.
    PushFailed,
}

/// Pushes a fresh fleet snapshot to one subscriber, once on activation and
/// then on every interval tick, until the subscriber disconnects or a push
/// fails.
pub struct StreamPublisher {
    source: Arc<dyn MetricsSource>,
    config: Arc<Config>,
    interval: Duration,
    subscriber: String,
}

impl StreamPublisher {
    pub fn new(
        source: Arc<dyn MetricsSource>,
        config: Arc<Config>,
        subscriber: impl Into<String>,
    ) -> Self {
        let interval = config.stream.interval();
        Self {
            source,
            config,
            interval,
            subscriber: subscriber.into(),
        }
    }

    pub fn spawn(self, tx: mpsc::Sender<String>) -> JoinHandle<CloseReason> {
        tokio::spawn(self.run(tx))
    }

    pub async fn run(self, tx: mpsc::Sender<String>) -> CloseReason {
        info!(subscriber = %self.subscriber, "stream subscriber connected");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately, giving the activation push.
        // A closed channel is checked before every tick.
        let reason = loop {
            tokio::select! {
                biased;
                _ = tx.closed() => break CloseReason::Disconnected,
                _ = ticker.tick() => {
                    if let Err(reason) = self.push(&tx).await {
                        break reason;
                    }
                }
            }
        };

        info!(subscriber = %self.subscriber, ?reason, "stream subscriber closed");
        reason
    }

    async fn push(&self, tx: &mpsc::Sender<String>) -> std::result::Result<(), CloseReason> {
        let payload = match self.render().await {
            Ok(payload) => payload,
            Err(e) => {
                error!(subscriber = %self.subscriber, error = %e, "failed to build snapshot");
                return Err(CloseReason::PushFailed);
            }
        };

        tx.send(payload).await.map_err(|_| CloseReason::Disconnected)?;
        debug!(subscriber = %self.subscriber, "snapshot pushed");
        Ok(())
    }

    async fn render(&self) -> Result<String> {
        let snapshot = FleetAggregator::new(self.source.as_ref(), &self.config)
            .snapshot()
            .await?;
        Ok(serde_json::to_string(&snapshot)?)
    }
}
