use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, error, info, warn};

use crate::db::{job_repo, now_rfc3339};
use crate::error::WorkerError;
use crate::processing::JobRunner;
use crate::worker::job::{Job, JobResult, JobState};
use crate::worker::progress::{JobPhase, JobProgressBroadcaster, JobProgressEvent};

pub struct WorkerPool {
    job_sender: Sender<Job>,
    result_receiver: Receiver<JobResult>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    progress: Option<JobProgressBroadcaster>,
}

impl WorkerPool {
    pub fn new(runner: JobRunner, worker_count: usize) -> Result<Self, WorkerError> {
        Self::with_progress(runner, worker_count, None)
    }

    /// Starts `worker_count` threads, optionally publishing progress events.
    pub fn with_progress(
        runner: JobRunner,
        worker_count: usize,
        progress: Option<JobProgressBroadcaster>,
    ) -> Result<Self, WorkerError> {
        if worker_count == 0 {
            return Err(WorkerError::SpawnFailed(
                "worker_count must be greater than 0".to_string(),
            ));
        }
        let (job_sender, job_receiver) = bounded::<Job>(worker_count * 2);
        let (result_sender, result_receiver) = bounded::<JobResult>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_runner = runner.clone();
            let worker_progress = progress.clone();

            let handle = thread::Builder::new()
                .name(format!("vistoria-worker-{}", worker_id))
                .spawn(move || {
                    run_worker(
                        worker_id,
                        job_rx,
                        result_tx,
                        shutdown_flag,
                        worker_runner,
                        worker_progress,
                    );
                })
                .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Ok(Self {
            job_sender,
            result_receiver,
            workers,
            shutdown,
            progress,
        })
    }

    /// Queues a job. Blocks while the queue is full.
    pub fn submit(&self, job: Job) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        if let Some(progress) = &self.progress {
            progress.send(JobProgressEvent::new(
                &job.id,
                job.kind(),
                job.payload.inspection_id(),
                JobPhase::Queued,
                "Job queued",
            ));
        }

        self.job_sender
            .send(job)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    pub fn try_recv_result(&self) -> Option<JobResult> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result(&self) -> Option<JobResult> {
        self.result_receiver.recv().ok()
    }

    pub fn recv_result_timeout(&self, timeout: std::time::Duration) -> Option<JobResult> {
        self.result_receiver.recv_timeout(timeout).ok()
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Closes the queue and joins every worker. Jobs already queued are
    /// still run unless [`shutdown`](Self::shutdown) was called first.
    pub fn wait(self) {
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<Job>,
    result_sender: Sender<JobResult>,
    shutdown: Arc<AtomicBool>,
    runner: JobRunner,
    progress: Option<JobProgressBroadcaster>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(job) => {
                let result = execute_job(&runner, &job, progress.as_ref());

                // Results are optional for callers; durable state is in the jobs table.
                match result_sender.try_send(result) {
                    Ok(()) => {}
                    Err(TrySendError::Full(result)) => {
                        debug!("Result queue full, dropping result of {}", result.job_id)
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        debug!("Worker {} result channel disconnected", worker_id);
                        break;
                    }
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}

/// Runs one job and records its terminal state.
fn execute_job(
    runner: &JobRunner,
    job: &Job,
    progress: Option<&JobProgressBroadcaster>,
) -> JobResult {
    let kind = job.kind();
    let inspection_id = job.payload.inspection_id();
    let db = &runner.context().db;

    let _span = tracing::info_span!("job", id = %job.id, kind = %kind).entered();

    if let Err(e) = job_repo::mark_running(db, &job.id, &now_rfc3339()) {
        warn!("Failed to mark job {} running: {}", job.id, e);
    }
    if let Some(progress) = progress {
        progress.send(JobProgressEvent::new(
            &job.id,
            kind,
            inspection_id,
            JobPhase::Running,
            "Job started",
        ));
    }

    let outcome = runner.run(&job.payload);
    let state = outcome.final_state();

    let stored = serde_json::to_string(&outcome).unwrap_or_else(|e| {
        error!("Failed to serialize result of job {}: {}", job.id, e);
        String::from("null")
    });
    if let Err(e) = job_repo::finish(
        db,
        &job.id,
        state.as_str(),
        outcome.error(),
        &stored,
        &now_rfc3339(),
    ) {
        error!("Failed to store result of job {}: {}", job.id, e);
    }

    if let Some(progress) = progress {
        let event = match state {
            JobState::Failed => JobProgressEvent::failed(
                &job.id,
                kind,
                inspection_id,
                outcome.error().unwrap_or("job failed"),
            ),
            _ => JobProgressEvent::new(
                &job.id,
                kind,
                inspection_id,
                JobPhase::Succeeded,
                "Job finished",
            ),
        };
        progress.send(event);
    }

    info!("Job {} ({}) finished: {}", job.id, kind, state);

    JobResult {
        job_id: job.id.clone(),
        kind,
        outcome,
    }
}
