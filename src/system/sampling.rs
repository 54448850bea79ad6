use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::platform::MemoryTypeProbe;
use super::provider::MetricsProvider;
use super::sampler::Sampler;
use super::store::SnapshotStore;

/// Handle to the background sampling task.
pub struct SamplingHandle {
    shutdown: watch::Sender<bool>,
    stopped: watch::Receiver<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl SamplingHandle {
    /// Stop after the cycle in progress (if any) has been published.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            error!("Sampling task ended abnormally: {err}");
        }
    }

    /// Resolves once the loop has exited, whether asked to or not. A
    /// panicking cycle is terminal: the sampler is lost with it and the
    /// store keeps its last snapshot.
    pub async fn stopped(&self) {
        let mut stopped = self.stopped.clone();
        let _ = stopped.wait_for(|done| *done).await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

fn shutdown_requested(rx: &watch::Receiver<bool>) -> bool {
    *rx.borrow() || rx.has_changed().is_err()
}

/// Sample every `period` and publish into `store`. The first tick fires
/// immediately. Collection runs on the blocking pool so slow probes never
/// stall the runtime; readers keep seeing the previous snapshot meanwhile.
/// Dropping the handle also stops the loop.
pub fn spawn_sampling_loop<P, M>(
    sampler: Sampler<P, M>,
    store: Arc<SnapshotStore>,
    period: Duration,
) -> SamplingHandle
where
    P: MetricsProvider + 'static,
    M: MemoryTypeProbe + 'static,
{
    let (tx, mut rx) = watch::channel(false);
    let (stopped_tx, stopped_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut sampler = sampler;
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Sampling every {} ms", period.as_millis());

        loop {
            // Shutdown wins over a tick that became ready at the same time.
            tokio::select! {
                biased;
                changed = rx.changed() => {
                    if changed.is_err() || *rx.borrow() {
                        break;
                    }
                    continue;
                }
                _ = interval.tick() => {}
            }

            let cycle = tokio::task::spawn_blocking(move || {
                let snapshot = sampler.collect();
                (sampler, snapshot)
            })
            .await;

            match cycle {
                Ok((returned, snapshot)) => {
                    sampler = returned;
                    store.publish(snapshot);
                }
                Err(err) => {
                    error!("Sampling cycle panicked, sampling is stopped for good: {err}");
                    break;
                }
            }

            if shutdown_requested(&rx) {
                break;
            }
        }
        info!("Sampling stopped");
        let _ = stopped_tx.send(true);
    });

    SamplingHandle {
        shutdown: tx,
        stopped: stopped_rx,
        task,
    }
}
