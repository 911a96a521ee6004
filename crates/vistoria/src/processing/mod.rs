//! Job bodies: artifact batches, the cost rollup and the entry/exit
//! comparator. Checklist seeding lives here too.
//!
//! Every job entry point returns a serializable report instead of an error
//! so the worker can store it as the job result. Failures are carried in the
//! report's `status` and `error` fields.

pub mod batch;
pub mod checklist;
pub mod compare;
pub mod costs;
pub mod runner;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::{
    DisabledAi, NoopDetector, ObjectDetector, SpeechToText, TextExtractor, TextSummarizer,
    VisionAnalyzer,
};
use crate::config::Config;
use crate::db::Database;

pub use batch::{process_artifacts, BatchReport, FileOutcome};
pub use checklist::{
    create_checklist_from_template, extend_checklist_from_detections, ChecklistSeed,
    RoomSuggestion,
};
pub use compare::{compare_checklists, compare_inspections, ComparisonReport, StatusChange};
pub use costs::{
    estimate_costs, recalculate_costs, tariffs_for_region, CostEstimate, CostLine, CostReport,
    QuoteItem,
};
pub use runner::JobRunner;

/// Final status carried by every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Success,
    Failed,
}

impl ReportStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// External services a job may call.
#[derive(Clone)]
pub struct Collaborators {
    pub vision: Arc<dyn VisionAnalyzer>,
    pub speech: Arc<dyn SpeechToText>,
    pub detector: Arc<dyn ObjectDetector>,
    pub summarizer: Arc<dyn TextSummarizer>,
    pub extractor: Arc<dyn TextExtractor>,
}

impl Collaborators {
    /// No AI provider and no detector; documents still go through `extractor`.
    pub fn without_ai(extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            vision: Arc::new(DisabledAi),
            speech: Arc::new(DisabledAi),
            detector: Arc::new(NoopDetector),
            summarizer: Arc::new(DisabledAi),
            extractor,
        }
    }
}

/// Pricing and defaults used by the job bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingSettings {
    pub default_region: String,
    pub fallback_item_cost: f64,
    pub deterioration_unit_cost: f64,
    pub currency: String,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            default_region: "RJ".to_string(),
            fallback_item_cost: 50.0,
            deterioration_unit_cost: 100.0,
            currency: "BRL".to_string(),
        }
    }
}

impl ProcessingSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_region: config.default_region.clone(),
            fallback_item_cost: config.costs.fallback_item_cost,
            deterioration_unit_cost: config.costs.deterioration_unit_cost,
            currency: config.costs.currency.clone(),
        }
    }
}

/// Everything a job needs, shared by all workers.
#[derive(Clone)]
pub struct ProcessingContext {
    pub db: Database,
    pub collaborators: Collaborators,
    pub settings: ProcessingSettings,
}

impl ProcessingContext {
    pub fn new(db: Database, collaborators: Collaborators, settings: ProcessingSettings) -> Self {
        Self {
            db,
            collaborators,
            settings,
        }
    }
}

/// Rounds a currency amount to cents.
pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
