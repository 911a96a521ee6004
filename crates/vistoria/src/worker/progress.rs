//! Job progress broadcaster for live job status consumers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::job::JobKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobPhase::Queued => write!(f, "Queued"),
            JobPhase::Running => write!(f, "Running"),
            JobPhase::Succeeded => write!(f, "Succeeded"),
            JobPhase::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressEvent {
    pub job_id: String,
    pub kind: JobKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspection_id: Option<i64>,
    pub phase: JobPhase,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Set on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobProgressEvent {
    pub fn new(
        job_id: &str,
        kind: JobKind,
        inspection_id: Option<i64>,
        phase: JobPhase,
        message: &str,
    ) -> Self {
        Self {
            job_id: job_id.to_string(),
            kind,
            inspection_id,
            phase,
            message: message.to_string(),
            timestamp: Utc::now(),
            error: None,
        }
    }

    pub fn failed(job_id: &str, kind: JobKind, inspection_id: Option<i64>, error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(job_id, kind, inspection_id, JobPhase::Failed, "Job failed")
        }
    }
}

/// Broadcasts job progress events. Sending never blocks and never fails.
#[derive(Clone)]
pub struct JobProgressBroadcaster {
    sender: Arc<broadcast::Sender<JobProgressEvent>>,
}

impl JobProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: JobProgressEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.sender.subscribe()
    }
}

impl Default for JobProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
