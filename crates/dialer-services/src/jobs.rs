//! Background execution of dial jobs
//!
//! [`DialJobQueue`] hands jobs to a fixed pool of tokio workers over a bounded
//! channel. Every job gets a status entry in a [`JobStatusStore`] before it is
//! queued, and the entry is updated when a worker starts and finishes it.
//! Each job executes in its own task, so a panicking run is recorded as a
//! failed job instead of taking the worker down.

use async_trait::async_trait;
use dialer_core::{
    models::{DialJob, JobId, JobRecord, JobState},
    traits::{DialRunner, JobQueue, JobStatusStore},
    AppError, AppResult,
};
use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Job ids remembered per user by [`MemoryJobStatusStore`]
const MAX_RECENT_PER_USER: usize = 100;

/// Bounded queue feeding a pool of dial workers
///
/// The queue is shared behind an `Arc` by request handlers, so shutdown works
/// through `&self`: once the sender is taken no further jobs are accepted.
pub struct DialJobQueue {
    sender: parking_lot::Mutex<Option<mpsc::Sender<JobRecord>>>,
    store: Arc<dyn JobStatusStore>,
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl DialJobQueue {
    /// Spawn `workers` workers sharing a queue of `capacity` jobs
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        runner: Arc<dyn DialRunner>,
        store: Arc<dyn JobStatusStore>,
        workers: usize,
        capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..workers.max(1))
            .map(|worker| {
                tokio::spawn(worker_loop(
                    worker,
                    receiver.clone(),
                    runner.clone(),
                    store.clone(),
                ))
            })
            .collect::<Vec<_>>();

        info!("Started {} dial workers", workers.len());

        Self {
            sender: parking_lot::Mutex::new(Some(sender)),
            store,
            workers: parking_lot::Mutex::new(workers),
        }
    }

    /// Stop accepting jobs and wait up to `grace` for queued and running
    /// ones to finish
    ///
    /// Returns `false` if workers were still busy when `grace` ran out.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        drop(self.sender.lock().take());
        let workers = std::mem::take(&mut *self.workers.lock());
        if workers.is_empty() {
            return true;
        }

        info!("Draining {} dial workers", workers.len());
        match tokio::time::timeout(grace, join_all(workers)).await {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result {
                        error!("Dial worker ended abnormally: {}", e);
                    }
                }
                info!("Dial workers stopped");
                true
            }
            Err(_) => {
                warn!(
                    "Dial workers still busy after {}s; unfinished jobs stay pending",
                    grace.as_secs()
                );
                false
            }
        }
    }
}

#[async_trait]
impl JobQueue for DialJobQueue {
    #[instrument(skip(self, job), fields(list_id = job.contact_list_id))]
    async fn submit(&self, job: DialJob) -> AppResult<JobId> {
        let sender = self.sender.lock().clone().ok_or_else(|| {
            warn!("Dial job rejected: queue is shutting down");
            AppError::QueueUnavailable("dial queue is full or stopped".to_string())
        })?;
        let permit = sender.try_reserve().map_err(|e| {
            warn!("Dial job rejected: {}", e);
            AppError::QueueUnavailable("dial queue is full or stopped".to_string())
        })?;

        let record = JobRecord::submitted(JobId::generate(), job);
        let id = record.id.clone();

        self.store.insert(&record).await?;
        permit.send(record);

        debug!("Queued dial job {}", id);
        Ok(id)
    }

    async fn status(&self, id: &JobId) -> AppResult<Option<JobRecord>> {
        self.store.get(id).await
    }

    async fn recent(&self, user_id: i64, limit: usize) -> AppResult<Vec<JobId>> {
        self.store.recent(user_id, limit).await
    }
}

async fn worker_loop(
    worker: usize,
    receiver: Arc<Mutex<mpsc::Receiver<JobRecord>>>,
    runner: Arc<dyn DialRunner>,
    store: Arc<dyn JobStatusStore>,
) {
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(record) = next else {
            debug!("Dial worker {} exiting", worker);
            break;
        };
        execute(record, &runner, store.as_ref()).await;
    }
}

#[instrument(skip_all, fields(job_id = %record.id))]
async fn execute(mut record: JobRecord, runner: &Arc<dyn DialRunner>, store: &dyn JobStatusStore) {
    record.mark_started();
    if let Err(e) = store.update(&record).await {
        warn!("Failed to mark job started: {}", e);
    }

    let job = record.job.clone();
    let runner = runner.clone();
    let state = match tokio::spawn(async move { runner.run(&job).await }).await {
        Ok(Ok(summary)) => JobState::Succeeded { result: summary },
        Ok(Err(e)) => {
            error!("Dial job failed: {}", e);
            JobState::Failed {
                error: e.to_string(),
            }
        }
        Err(e) => {
            error!("Dial job aborted: {}", e);
            JobState::Failed {
                error: format!("Dial job aborted: {}", e),
            }
        }
    };

    info!("Dial job finished: {}", state.label());
    record.finish(state);
    if let Err(e) = store.update(&record).await {
        error!("Failed to record job outcome: {}", e);
    }
}

#[derive(Default)]
struct JobTables {
    jobs: HashMap<JobId, JobRecord>,
    by_user: HashMap<i64, VecDeque<JobId>>,
}

/// Process-local job status store, used when Redis is not configured
#[derive(Default)]
pub struct MemoryJobStatusStore {
    tables: RwLock<JobTables>,
}

impl MemoryJobStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStatusStore for MemoryJobStatusStore {
    async fn insert(&self, record: &JobRecord) -> AppResult<()> {
        let mut guard = self.tables.write();
        let tables = &mut *guard;

        let ids = tables.by_user.entry(record.job.requested_by).or_default();
        ids.push_front(record.id.clone());
        if ids.len() > MAX_RECENT_PER_USER {
            if let Some(evicted) = ids.pop_back() {
                tables.jobs.remove(&evicted);
            }
        }

        tables.jobs.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn update(&self, record: &JobRecord) -> AppResult<()> {
        let mut tables = self.tables.write();
        match tables.jobs.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Dial job {}", record.id))),
        }
    }

    async fn get(&self, id: &JobId) -> AppResult<Option<JobRecord>> {
        Ok(self.tables.read().jobs.get(id).cloned())
    }

    async fn recent(&self, user_id: i64, limit: usize) -> AppResult<Vec<JobId>> {
        Ok(self
            .tables
            .read()
            .by_user
            .get(&user_id)
            .map(|ids| ids.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
