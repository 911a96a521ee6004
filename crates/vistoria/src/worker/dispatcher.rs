//! Batch dispatcher: records jobs durably and hands them to the worker pool.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::db::{file_repo, job_repo, now_rfc3339, Database};
use crate::error::{Result, WorkerError};
use crate::model::FileKind;
use crate::processing::JobRunner;
use crate::worker::job::{Job, JobKind, JobOutcome, JobPayload, JobState, JobStatusView};
use crate::worker::pool::WorkerPool;
use crate::worker::progress::JobProgressBroadcaster;

pub struct BatchDispatcher {
    db: Database,
    pool: WorkerPool,
    /// Jobs created before this instant belong to a previous process.
    started_at: String,
}

impl BatchDispatcher {
    pub fn new(db: Database, pool: WorkerPool) -> Self {
        Self {
            db,
            pool,
            started_at: now_rfc3339(),
        }
    }

    /// Starts a pool over `runner` and wraps it.
    pub fn start(
        runner: JobRunner,
        worker_count: usize,
        progress: Option<JobProgressBroadcaster>,
    ) -> std::result::Result<Self, WorkerError> {
        let db = runner.context().db.clone();
        let pool = WorkerPool::with_progress(runner, worker_count, progress)?;
        Ok(Self::new(db, pool))
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Submits one job per non-empty artifact list plus a cost rollup.
    ///
    /// The inspection id is not checked here; jobs for an unknown inspection
    /// fail on their own and report it in their result.
    pub fn dispatch_batch(
        &self,
        inspection_id: i64,
        images: &[String],
        audios: &[String],
        documents: &[String],
    ) -> Result<BTreeMap<JobKind, String>> {
        let all_paths: Vec<String> = images
            .iter()
            .chain(audios)
            .chain(documents)
            .cloned()
            .collect();
        let touched = file_repo::mark_pending(&self.db, inspection_id, &all_paths)?;
        info!(
            "Dispatching batch for inspection {}: {} images, {} audios, {} documents ({} records pending)",
            inspection_id,
            images.len(),
            audios.len(),
            documents.len(),
            touched
        );

        let mut handles = BTreeMap::new();
        for (kind, paths) in [
            (FileKind::Photo, images),
            (FileKind::Audio, audios),
            (FileKind::Document, documents),
        ] {
            if paths.is_empty() {
                continue;
            }
            let handle = self.enqueue(JobPayload::Artifacts {
                kind,
                inspection_id,
                paths: paths.to_vec(),
            })?;
            handles.insert(JobKind::for_files(kind), handle);
        }

        let handle = self.enqueue(JobPayload::Costs {
            inspection_id,
            region: None,
        })?;
        handles.insert(JobKind::Costs, handle);

        Ok(handles)
    }

    pub fn dispatch_costs(&self, inspection_id: i64, region: Option<String>) -> Result<String> {
        self.enqueue(JobPayload::Costs {
            inspection_id,
            region,
        })
    }

    pub fn dispatch_comparison(&self, before_id: i64, after_id: i64) -> Result<String> {
        self.enqueue(JobPayload::Comparison { before_id, after_id })
    }

    /// Status of a job as seen by a poller.
    pub fn job_status(&self, handle: &str) -> Result<JobStatusView> {
        let row = job_repo::find_by_id(&self.db, handle)?
            .ok_or_else(|| WorkerError::JobNotFound(handle.to_string()))?;
        let state: JobState = row.state.parse()?;

        let result = match (&row.result, state) {
            (Some(raw), _) => Some(serde_json::from_str(raw).map_err(|e| {
                WorkerError::InvalidPayload {
                    id: row.id.clone(),
                    reason: e.to_string(),
                }
            })?),
            // Interrupted jobs never stored a payload.
            (None, JobState::Failed) => serde_json::to_value(JobOutcome::failed(
                row.last_error.as_deref().unwrap_or(job_repo::INTERRUPTED),
            ))
            .ok(),
            (None, _) => None,
        };

        Ok(JobStatusView {
            task_id: row.id,
            status: state.public().to_string(),
            result,
        })
    }

    /// Runs a finished job again under the same handle.
    pub fn redispatch(&self, handle: &str) -> Result<()> {
        let row = job_repo::find_by_id(&self.db, handle)?
            .ok_or_else(|| WorkerError::JobNotFound(handle.to_string()))?;
        let state: JobState = row.state.parse()?;
        if !state.is_finished() {
            return Err(WorkerError::JobNotFinished(handle.to_string()).into());
        }
        let payload: JobPayload =
            serde_json::from_str(&row.payload).map_err(|e| WorkerError::InvalidPayload {
                id: row.id.clone(),
                reason: e.to_string(),
            })?;

        if let JobPayload::Artifacts {
            inspection_id,
            paths,
            ..
        } = &payload
        {
            file_repo::mark_pending(&self.db, *inspection_id, paths)?;
        }
        job_repo::reset_for_redispatch(&self.db, handle, &now_rfc3339())?;
        info!("Redispatching job {} ({})", handle, row.kind);

        self.pool.submit(Job {
            id: row.id,
            payload,
        })?;
        Ok(())
    }

    /// Recovers from a crash: fails jobs left unfinished by a previous process,
    /// then dispatches one job per (inspection, artifact kind) for records
    /// still `pending` or `processing`. Returns the new handles.
    pub fn resume_pending(&self) -> Result<Vec<String>> {
        let interrupted = job_repo::mark_interrupted(&self.db, &self.started_at, &now_rfc3339())?;
        if interrupted > 0 {
            warn!("Marked {} unfinished jobs as interrupted", interrupted);
        }

        let mut groups: BTreeMap<(i64, FileKind), Vec<String>> = BTreeMap::new();
        for record in file_repo::list_resumable(&self.db)? {
            groups
                .entry((record.inspection_id, record.kind))
                .or_default()
                .push(record.file_path);
        }

        let mut handles = Vec::with_capacity(groups.len());
        for ((inspection_id, kind), paths) in groups {
            info!(
                "Resuming {} {} artifacts for inspection {}",
                paths.len(),
                kind,
                inspection_id
            );
            handles.push(self.enqueue(JobPayload::Artifacts {
                kind,
                inspection_id,
                paths,
            })?);
        }
        Ok(handles)
    }

    /// Stops the workers after their current job. Queued jobs stay pending
    /// in the job table until the next [`resume_pending`](Self::resume_pending).
    pub fn shutdown(self) {
        self.pool.shutdown();
        self.pool.wait();
    }

    /// Lets the workers drain the queue, then joins them.
    pub fn drain(self) {
        self.pool.wait();
    }

    fn enqueue(&self, payload: JobPayload) -> Result<String> {
        let job = Job::new(payload);
        let now = now_rfc3339();
        let serialized =
            serde_json::to_string(&job.payload).map_err(|e| WorkerError::InvalidPayload {
                id: job.id.clone(),
                reason: e.to_string(),
            })?;

        job_repo::insert(
            &self.db,
            &job_repo::JobRow {
                id: job.id.clone(),
                kind: job.kind().to_string(),
                inspection_id: job.payload.inspection_id(),
                payload: serialized,
                state: JobState::Pending.as_str().to_string(),
                attempts: 0,
                last_error: None,
                result: None,
                created_at: now.clone(),
                updated_at: now,
                finished_at: None,
            },
        )?;

        let id = job.id.clone();
        if let Err(e) = self.pool.submit(job) {
            let outcome = JobOutcome::failed(e.to_string());
            let stored = serde_json::to_string(&outcome).unwrap_or_default();
            job_repo::finish(
                &self.db,
                &id,
                JobState::Failed.as_str(),
                outcome.error(),
                &stored,
                &now_rfc3339(),
            )?;
            return Err(e.into());
        }
        Ok(id)
    }
}
