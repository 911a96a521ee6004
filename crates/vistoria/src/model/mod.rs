//! Domain types shared by the repositories and the processing jobs.

pub mod checklist;
pub mod file;
pub mod inspection;
pub mod tariff;
pub mod template;

pub use checklist::{ChecklistEntry, ChecklistKey, ConditionStatus, NewChecklistEntry, Priority};
pub use file::{
    DetectedObject, FileAnalysis, FileKind, FileRecord, NewFileRecord, ProcessingStatus,
};
pub use inspection::{Inspection, InspectionKind, InspectionStatus, NewInspection, TemplateType};
pub use tariff::CostTariff;
pub use template::{ChecklistTemplate, NewTemplate, TemplateRoom};
