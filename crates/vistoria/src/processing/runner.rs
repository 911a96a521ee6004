use std::sync::Arc;

use log::warn;

use super::{compare_inspections, process_artifacts, recalculate_costs, ProcessingContext};
use crate::worker::job::{JobOutcome, JobPayload};

/// Executes job payloads against the shared processing context.
#[derive(Clone)]
pub struct JobRunner {
    ctx: Arc<ProcessingContext>,
}

impl JobRunner {
    pub fn new(ctx: Arc<ProcessingContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ProcessingContext {
        &self.ctx
    }

    /// Runs one payload. Never fails: errors end up in the outcome.
    pub fn run(&self, payload: &JobPayload) -> JobOutcome {
        let ctx = &*self.ctx;
        match payload {
            JobPayload::Artifacts {
                kind,
                inspection_id,
                paths,
            } => JobOutcome::Batch(process_artifacts(ctx, *kind, *inspection_id, paths)),
            JobPayload::Costs {
                inspection_id,
                region,
            } => JobOutcome::Costs(recalculate_costs(ctx, *inspection_id, region.as_deref())),
            JobPayload::Comparison {
                before_id,
                after_id,
            } => match compare_inspections(
                &ctx.db,
                *before_id,
                *after_id,
                ctx.settings.deterioration_unit_cost,
            ) {
                Ok(report) => JobOutcome::Comparison(report),
                Err(e) => {
                    warn!("Comparison {} -> {} failed: {}", before_id, after_id, e);
                    JobOutcome::failed(e.to_string())
                }
            },
        }
    }
}
