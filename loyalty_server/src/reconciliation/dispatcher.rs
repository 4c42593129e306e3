use std::sync::Arc;

use accrual_client::AccrualService;
use log::*;
use loyalty_engine::LedgerDatabase;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use super::{worker::Worker, BatchDiscoverer, LedgerUpdater};
use crate::config::ReconcilerConfig;

/// Owns the reconciliation pipeline: one discovery task, a bounded job queue and a fixed pool of workers.
///
/// Dropping a `Reconciler` does not stop its tasks. Call [`Reconciler::shutdown`].
pub struct Reconciler {
    shutdown: CancellationToken,
    discoverer: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl Reconciler {
    /// Spawns the discoverer and `config.workers` workers on the current Tokio runtime.
    pub fn start<B, C>(db: Arc<B>, client: Arc<C>, config: &ReconcilerConfig) -> Self
    where
        B: LedgerDatabase + 'static,
        C: AccrualService + 'static,
    {
        let shutdown = CancellationToken::new();
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let queue = Arc::new(Mutex::new(receiver));
        let updater = LedgerUpdater::new(Arc::clone(&db), config);
        let workers = (0..config.workers.max(1))
            .map(|id| {
                let worker =
                    Worker::new(id, Arc::clone(&client), updater.clone(), Arc::clone(&queue), shutdown.clone());
                tokio::spawn(worker.run())
            })
            .collect::<Vec<_>>();
        let discoverer = BatchDiscoverer::new(db, config);
        let discoverer = tokio::spawn(discoverer.run(sender, config.poll_interval, shutdown.clone()));
        info!(
            "🔁️ Reconciler started with {} workers and a queue of {}",
            workers.len(),
            config.queue_capacity.max(1)
        );
        Self { shutdown, discoverer, workers }
    }

    /// Stops discovery, interrupts idle and paused workers, and waits for in-flight jobs to finish.
    pub async fn shutdown(self) {
        info!("🔁️ Reconciler shutting down");
        self.shutdown.cancel();
        if let Err(e) = self.discoverer.await {
            error!("🔁️ The discovery task failed. {e}");
        }
        for (id, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.await {
                error!("🔁️ Worker {id} failed. {e}");
            }
        }
        info!("🔁️ Reconciler stopped");
    }
}
