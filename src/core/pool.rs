//! Bounded worker pool
//!
//! A producer feeds tasks into a bounded queue, a fixed number of workers
//! drain it, and an observer counts completions. Once every enqueued task
//! has reported back the observer closes the queue, which lets the idle
//! workers exit.
//!
//! Task failures are logged and counted, never propagated: the run only
//! fails if the pool itself cannot be set up.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use log::{debug, error, warn};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::core::error::{Error, Result};
use crate::core::options::{DownloadOptions, ProgressCallback};
use crate::core::task::DownloadTask;

/// Work performed for each task; resolves to the written file
pub type TaskHandler = Arc<dyn Fn(DownloadTask) -> BoxFuture<'static, Result<PathBuf>> + Send + Sync>;

/// Completion message sent by a worker
#[derive(Debug)]
pub enum TaskOutcome {
    Completed { task: DownloadTask, path: PathBuf },
    Failed { task: DownloadTask, error: Error },
}

/// Summary of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Tasks planned
    pub total: u64,
    /// Tasks whose image was written
    pub succeeded: u64,
    /// Tasks that failed and were dropped
    pub failed: u64,
    /// Tasks never dispatched because the run was cancelled
    pub cancelled: u64,
}

impl RunReport {
    fn new(total: u64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Tasks that reported back, successfully or not
    pub fn finished(&self) -> u64 {
        self.succeeded + self.failed
    }

    fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Completed { .. } => self.succeeded += 1,
            TaskOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Fixed-size pool of workers sharing one bounded queue
pub struct WorkerPool {
    workers: usize,
    queue_capacity: usize,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl WorkerPool {
    /// A pool of `workers` workers behind a queue of `queue_capacity` tasks.
    /// Both must be at least 1.
    pub fn new(workers: usize, queue_capacity: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::InvalidInput("worker count must be at least 1".to_string()));
        }
        if queue_capacity == 0 {
            return Err(Error::InvalidInput("queue capacity must be at least 1".to_string()));
        }
        Ok(Self {
            workers,
            queue_capacity,
            progress: None,
            cancel: CancellationToken::new(),
        })
    }

    pub fn from_options(options: &DownloadOptions) -> Result<Self> {
        let mut pool = Self::new(options.workers, options.queue_capacity)?
            .with_cancellation(options.cancel.clone());
        pool.progress = options.progress.clone();
        Ok(pool)
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run every task through `handler` and wait for all of them
    pub async fn run(&self, tasks: Vec<DownloadTask>, handler: TaskHandler) -> Result<RunReport> {
        let total = tasks.len() as u64;
        let (queue_tx, queue_rx) = mpsc::channel::<DownloadTask>(self.queue_capacity);
        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let (done_tx, done_rx) = mpsc::unbounded_channel::<TaskOutcome>();

        let mut workers = JoinSet::new();
        for id in 0..self.workers {
            workers.spawn(worker_loop(
                id,
                Arc::clone(&queue_rx),
                done_tx.clone(),
                Arc::clone(&handler),
                self.cancel.clone(),
            ));
        }
        drop(done_tx);
        drop(queue_rx);

        let producer = tokio::spawn(produce(tasks, queue_tx, self.cancel.clone()));
        let observer = tokio::spawn(observe(
            producer,
            done_rx,
            total,
            self.progress.clone(),
            self.cancel.clone(),
        ));

        let report = observer
            .await
            .map_err(|e| Error::Worker(format!("completion observer: {e}")))??;

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!("Worker terminated abnormally: {e}");
            }
        }

        Ok(report)
    }
}

/// Enqueue every task, suspending while the queue is full. Hands the queue
/// back with the number of tasks enqueued so the observer decides when to
/// close it.
async fn produce(
    tasks: Vec<DownloadTask>,
    queue: mpsc::Sender<DownloadTask>,
    cancel: CancellationToken,
) -> (mpsc::Sender<DownloadTask>, u64) {
    let mut enqueued = 0u64;
    for task in tasks {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = queue.send(task) => {
                if sent.is_err() {
                    break;
                }
                enqueued += 1;
            }
        }
    }
    debug!("Enqueued {enqueued} tasks");
    (queue, enqueued)
}

/// Count completions until every enqueued task reported back (or the run is
/// cancelled), then close the queue.
async fn observe(
    mut producer: tokio::task::JoinHandle<(mpsc::Sender<DownloadTask>, u64)>,
    mut done: mpsc::UnboundedReceiver<TaskOutcome>,
    total: u64,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
) -> Result<RunReport> {
    let mut report = RunReport::new(total);
    let mut queue: Option<mpsc::Sender<DownloadTask>> = None;
    let mut enqueued: Option<u64> = None;

    let record = |report: &mut RunReport, outcome: TaskOutcome| {
        if let TaskOutcome::Completed { task, path } = &outcome {
            debug!("Finished {task}: {}", path.display());
        }
        report.record(&outcome);
        if let Some(progress) = &progress {
            progress(report.finished(), total);
        }
    };

    loop {
        if enqueued.is_some_and(|n| report.finished() >= n) {
            break;
        }
        tokio::select! {
            joined = &mut producer, if enqueued.is_none() => {
                let (sender, count) = joined
                    .map_err(|e| Error::Worker(format!("task producer: {e}")))?;
                queue = Some(sender);
                enqueued = Some(count);
            }
            outcome = done.recv() => match outcome {
                Some(outcome) => record(&mut report, outcome),
                None => break,
            },
            _ = cancel.cancelled() => break,
        }
    }

    if enqueued.is_none() {
        let (sender, _) = producer
            .await
            .map_err(|e| Error::Worker(format!("task producer: {e}")))?;
        queue = Some(sender);
    }
    // Closing the queue releases workers blocked on an empty queue.
    drop(queue);

    // In-flight tasks still report back after a cancellation.
    while let Some(outcome) = done.recv().await {
        record(&mut report, outcome);
    }

    report.cancelled = total - report.finished();
    if report.cancelled > 0 {
        warn!("Run cancelled, {} tasks were not attempted", report.cancelled);
    }
    Ok(report)
}

async fn worker_loop(
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<DownloadTask>>>,
    done: mpsc::UnboundedSender<TaskOutcome>,
    handler: TaskHandler,
    cancel: CancellationToken,
) {
    loop {
        let next = {
            let mut queue = queue.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                task = queue.recv() => task,
            }
        };
        let Some(task) = next else {
            break;
        };

        debug!("Worker {id} picked up {task}");

        // Run the task on its own tokio task so a panic stays contained.
        let outcome = match tokio::spawn(handler(task.clone())).await {
            Ok(Ok(path)) => TaskOutcome::Completed { task, path },
            Ok(Err(error)) => {
                error!("Failed to download {task}: {}", error.with_causes());
                TaskOutcome::Failed { task, error }
            }
            Err(join_error) => {
                let error = Error::Worker(join_error.to_string());
                error!("Failed to download {task}: {}", error.with_causes());
                TaskOutcome::Failed { task, error }
            }
        };

        if done.send(outcome).is_err() {
            break;
        }
    }
    debug!("Worker {id} exiting");
}
