use std::sync::Arc;

use accrual_client::{AccrualOutcome, AccrualService};
use log::*;
use loyalty_common::OrderNumber;
use loyalty_engine::LedgerDatabase;
use tokio::{
    sync::{mpsc, Mutex},
    time::sleep,
};
use tokio_util::sync::CancellationToken;

use super::LedgerUpdater;

pub(crate) type JobQueue = Arc<Mutex<mpsc::Receiver<OrderNumber>>>;

pub(crate) struct Worker<B, C> {
    id: usize,
    client: Arc<C>,
    updater: LedgerUpdater<B>,
    queue: JobQueue,
    shutdown: CancellationToken,
}

impl<B, C> Worker<B, C>
where
    B: LedgerDatabase,
    C: AccrualService,
{
    pub fn new(
        id: usize,
        client: Arc<C>,
        updater: LedgerUpdater<B>,
        queue: JobQueue,
        shutdown: CancellationToken,
    ) -> Self {
        Self { id, client, updater, queue, shutdown }
    }

    /// Processes jobs until shutdown. Idle and rate-limited workers stop immediately; a job that has already been
    /// handed to the accrual service runs to completion first.
    pub async fn run(self) {
        let id = self.id;
        trace!("🔁️ Worker {id} started");
        loop {
            let job = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                job = next_job(&self.queue) => job,
            };
            let Some(number) = job else {
                debug!("🔁️ Worker {id}: job queue closed");
                break;
            };
            match self.client.fetch_status(&number).await {
                AccrualOutcome::RateLimited { retry_after } => {
                    info!(
                        "🔁️ Worker {id} was rate limited while querying order {number}. Pausing for {}s",
                        retry_after.as_secs_f32()
                    );
                    tokio::select! {
                        biased;
                        _ = self.shutdown.cancelled() => break,
                        _ = sleep(retry_after) => {},
                    }
                },
                outcome => {
                    self.updater.apply(&number, outcome).await;
                },
            }
        }
        trace!("🔁️ Worker {id} stopped");
    }
}

async fn next_job(queue: &JobQueue) -> Option<OrderNumber> {
    queue.lock().await.recv().await
}
