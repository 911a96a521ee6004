pub mod dispatcher;
pub mod job;
pub mod pool;
pub mod progress;

pub use dispatcher::BatchDispatcher;
pub use job::{Job, JobKind, JobOutcome, JobPayload, JobResult, JobState, JobStatusView};
pub use pool::WorkerPool;
pub use progress::{JobPhase, JobProgressBroadcaster, JobProgressEvent};

// Re-export crossbeam_channel for use in main
pub use crossbeam_channel;
