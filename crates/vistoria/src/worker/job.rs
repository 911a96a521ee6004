use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::model::FileKind;
use crate::processing::{BatchReport, ComparisonReport, CostReport, ReportStatus};

/// Job class, also the key of the handle map returned by a batch dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Images,
    Audios,
    Documents,
    Costs,
    Comparison,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Audios => "audios",
            Self::Documents => "documents",
            Self::Costs => "costs",
            Self::Comparison => "comparison",
        }
    }

    /// Job class that processes artifacts of `kind`.
    pub fn for_files(kind: FileKind) -> Self {
        match kind {
            FileKind::Photo => Self::Images,
            FileKind::Audio => Self::Audios,
            FileKind::Document => Self::Documents,
        }
    }
}

impl FromStr for JobKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "images" => Ok(Self::Images),
            "audios" => Ok(Self::Audios),
            "documents" => Ok(Self::Documents),
            "costs" => Ok(Self::Costs),
            "comparison" => Ok(Self::Comparison),
            _ => Err(DomainError::InvalidStatus {
                kind: "job kind",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work description stored with the job record, enough to run it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    Artifacts {
        kind: FileKind,
        inspection_id: i64,
        paths: Vec<String>,
    },
    Costs {
        inspection_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<String>,
    },
    Comparison {
        before_id: i64,
        after_id: i64,
    },
}

impl JobPayload {
    pub fn kind(&self) -> JobKind {
        match self {
            Self::Artifacts { kind, .. } => JobKind::for_files(*kind),
            Self::Costs { .. } => JobKind::Costs,
            Self::Comparison { .. } => JobKind::Comparison,
        }
    }

    /// Inspection the job writes to. Comparisons only read.
    pub fn inspection_id(&self) -> Option<i64> {
        match self {
            Self::Artifacts { inspection_id, .. } | Self::Costs { inspection_id, .. } => {
                Some(*inspection_id)
            }
            Self::Comparison { .. } => None,
        }
    }
}

/// Durable job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Success,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// State as reported to pollers, which only distinguish
    /// pending, success and failed.
    pub fn public(&self) -> &'static str {
        match self {
            Self::Pending | Self::Running => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for JobState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(DomainError::InvalidStatus {
                kind: "job state",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub payload: JobPayload,
}

impl Job {
    pub fn new(payload: JobPayload) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            payload,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.payload.kind()
    }
}

/// Payload of a job that failed before producing a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub status: ReportStatus,
    pub error: String,
}

/// Result payload stored on the job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutcome {
    Batch(BatchReport),
    Costs(CostReport),
    Comparison(ComparisonReport),
    Failed(FailureReport),
}

impl JobOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed(FailureReport {
            status: ReportStatus::Failed,
            error: error.into(),
        })
    }

    pub fn status(&self) -> ReportStatus {
        match self {
            Self::Batch(r) => r.status,
            Self::Costs(r) => r.status,
            Self::Comparison(r) => r.status,
            Self::Failed(r) => r.status,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Batch(r) => r.error.as_deref(),
            Self::Costs(r) => r.error.as_deref(),
            Self::Comparison(_) => None,
            Self::Failed(r) => Some(&r.error),
        }
    }

    /// Durable state mirroring the payload status.
    pub fn final_state(&self) -> JobState {
        if self.status().is_success() {
            JobState::Success
        } else {
            JobState::Failed
        }
    }
}

/// Message a worker sends back after finishing a job.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub job_id: String,
    pub kind: JobKind,
    pub outcome: JobOutcome,
}

/// What a poller sees for a job handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub task_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}
