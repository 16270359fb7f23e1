//! Background worker that applies access statistics.
//!
//! The redirect path only enqueues a [`StatsEvent`] through [`StatsQueue`];
//! the worker owns every store write. Each event runs on its own task, so a
//! client disconnecting after the redirect has no effect on the update.
//!
//! # Lifecycle
//!
//! ```rust,ignore
//! let (queue, worker) = StatsWorker::spawn(link_repository, 10_000, 4);
//! // ... hand `queue` to request handlers ...
//! worker.shutdown(Duration::from_secs(10)).await;
//! ```
//!
//! `shutdown` closes the queue, applies every event still buffered and waits
//! for in-flight updates to finish.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::domain::repositories::LinkRepository;
use crate::domain::stats_event::StatsEvent;

const RETRY_ATTEMPTS: usize = 3;
const RETRY_MAX_DELAY: Duration = Duration::from_secs(1);

/// Sending half of the stats channel, cloned into [`crate::state::AppState`].
#[derive(Clone)]
pub struct StatsQueue {
    tx: mpsc::Sender<StatsEvent>,
}

impl StatsQueue {
    pub fn new(tx: mpsc::Sender<StatsEvent>) -> Self {
        Self { tx }
    }

    /// Enqueues an access for `code` without waiting.
    ///
    /// Returns `false` if the event was dropped because the queue is full or
    /// closed. Dropping is logged and counted, never reported to the caller
    /// as an error.
    pub fn schedule(&self, code: &str) -> bool {
        match self.tx.try_send(StatsEvent::new(code)) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!("Stats queue full, dropping access for {}", event.code);
                metrics::counter!("stats_events_dropped_total", "reason" => "full").increment(1);
                false
            }
            Err(TrySendError::Closed(event)) => {
                warn!("Stats queue closed, dropping access for {}", event.code);
                metrics::counter!("stats_events_dropped_total", "reason" => "closed")
                    .increment(1);
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Free slots currently available in the channel.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

/// Handle to the running stats worker.
pub struct StatsWorker {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl StatsWorker {
    /// Starts the worker and returns the queue feeding it.
    ///
    /// At most `concurrency` updates are in flight at once.
    pub fn spawn(
        repository: Arc<dyn LinkRepository>,
        capacity: usize,
        concurrency: usize,
    ) -> (StatsQueue, StatsWorker) {
        let (tx, rx) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(run_stats_worker(rx, repository, concurrency, shutdown_rx));

        (
            StatsQueue::new(tx),
            StatsWorker {
                shutdown_tx,
                handle,
            },
        )
    }

    /// Stops accepting events, drains the queue and waits for pending updates.
    ///
    /// Returns `false` if draining did not finish within `timeout`.
    pub async fn shutdown(self, timeout: Duration) -> bool {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(timeout, self.handle).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!("Stats worker terminated abnormally: {}", e);
                false
            }
            Err(_) => {
                warn!("Stats worker did not drain within {:?}", timeout);
                false
            }
        }
    }
}

/// Worker loop: receives events until shutdown, then flushes.
///
/// If the [`StatsWorker`] handle is dropped without calling `shutdown`, the
/// loop keeps running until every [`StatsQueue`] is dropped.
pub async fn run_stats_worker(
    mut rx: mpsc::Receiver<StatsEvent>,
    repository: Arc<dyn LinkRepository>,
    concurrency: usize,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut detached = false;

    info!("Stats worker started (concurrency: {})", concurrency);

    loop {
        tokio::select! {
            signal = &mut shutdown_rx, if !detached => {
                if signal.is_ok() {
                    rx.close();
                    break;
                }
                detached = true;
            }
            event = rx.recv() => {
                let Some(event) = event else { break };
                spawn_update(&mut tasks, &semaphore, &repository, event).await;
            }
        }

        while let Some(result) = tasks.try_join_next() {
            log_join_result(result);
        }
    }

    let mut drained = 0usize;
    while let Some(event) = rx.recv().await {
        spawn_update(&mut tasks, &semaphore, &repository, event).await;
        drained += 1;
    }

    while let Some(result) = tasks.join_next().await {
        log_join_result(result);
    }

    info!("Stats worker stopped ({} buffered events flushed)", drained);
}

async fn spawn_update(
    tasks: &mut JoinSet<()>,
    semaphore: &Arc<Semaphore>,
    repository: &Arc<dyn LinkRepository>,
    event: StatsEvent,
) {
    let Ok(permit) = semaphore.clone().acquire_owned().await else {
        error!("Stats semaphore closed, dropping access for {}", event.code);
        return;
    };

    let repository = repository.clone();
    tasks.spawn(async move {
        let _permit = permit;
        record_access(repository.as_ref(), &event).await;
    });
}

fn log_join_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        error!("Stats update task failed: {}", e);
    }
}

/// Applies one access to the store: `access_count + 1`, `last_accessed = accessed_at`.
///
/// Store failures are retried with jittered exponential backoff and then
/// logged. A code with no matching link is a silent no-op.
pub async fn record_access(repository: &dyn LinkRepository, event: &StatsEvent) {
    // 50ms, 100ms, 200ms before jitter
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(25)
        .max_delay(RETRY_MAX_DELAY)
        .map(jitter)
        .take(RETRY_ATTEMPTS);

    let result = Retry::spawn(strategy, || {
        repository.increment_access(&event.code, event.accessed_at)
    })
    .await;

    match result {
        Ok(true) => {
            debug!("Recorded access for {}", event.code);
            metrics::counter!("stats_updates_total").increment(1);
        }
        Ok(false) => {
            debug!("No link for {}, skipping stats update", event.code);
        }
        Err(e) => {
            warn!("Failed to record access for {}: {}", event.code, e);
            metrics::counter!("stats_updates_failed_total").increment(1);
        }
    }
}
