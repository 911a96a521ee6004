//! Entry/exit comparison of two inspections of the same property.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{round_cents, ReportStatus};
use crate::db::{checklist_repo, inspection_repo, Database};
use crate::error::{DomainError, VistoriaError};
use crate::model::{ChecklistEntry, ChecklistKey, ConditionStatus};

/// A (room, item) whose status differs between the two inspections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub room: String,
    pub item: String,
    pub from_status: ConditionStatus,
    pub to_status: ConditionStatus,
}

impl StatusChange {
    /// `ok` to `damaged` or `dirty`.
    pub fn is_deterioration(&self) -> bool {
        self.from_status == ConditionStatus::Ok && self.to_status.is_worn()
    }

    /// `damaged` or `dirty` back to `ok`.
    pub fn is_improvement(&self) -> bool {
        self.from_status.is_worn() && self.to_status == ConditionStatus::Ok
    }

    /// Became `damaged` from any other status.
    pub fn is_new_damage(&self) -> bool {
        self.to_status == ConditionStatus::Damaged && self.from_status != ConditionStatus::Damaged
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub before_inspection_id: i64,
    pub after_inspection_id: i64,
    pub total_changes: usize,
    pub deteriorated_items: usize,
    pub improved_items: usize,
    pub new_damage_items: usize,
    pub estimated_deterioration_cost: f64,
    pub changes: Vec<StatusChange>,
    pub deteriorated: Vec<StatusChange>,
    pub improved: Vec<StatusChange>,
    pub new_damages: Vec<StatusChange>,
    /// Keys only present in the earlier inspection. Not counted as changes.
    pub unmatched_before: Vec<ChecklistKey>,
    /// Keys only present in the later inspection. Not counted as changes.
    pub unmatched_after: Vec<ChecklistKey>,
    pub status: ReportStatus,
}

/// Compares two checklists keyed by (room, item).
///
/// Only keys present on both sides with different statuses are changes.
/// The categories are independent, so `ok` to `damaged` counts both as a
/// deterioration and as new damage.
pub fn compare_checklists(
    before_inspection_id: i64,
    before: &[ChecklistEntry],
    after_inspection_id: i64,
    after: &[ChecklistEntry],
    deterioration_unit_cost: f64,
) -> ComparisonReport {
    let before_map: BTreeMap<ChecklistKey, &ChecklistEntry> =
        before.iter().map(|e| (e.key(), e)).collect();
    let after_map: BTreeMap<ChecklistKey, &ChecklistEntry> =
        after.iter().map(|e| (e.key(), e)).collect();

    let mut changes = Vec::new();
    let mut unmatched_before = Vec::new();
    for (key, earlier) in &before_map {
        match after_map.get(key) {
            Some(later) if later.status != earlier.status => changes.push(StatusChange {
                room: earlier.room.clone(),
                item: earlier.item.clone(),
                from_status: earlier.status,
                to_status: later.status,
            }),
            Some(_) => {}
            None => unmatched_before.push(key.clone()),
        }
    }
    let unmatched_after: Vec<ChecklistKey> = after_map
        .keys()
        .filter(|key| !before_map.contains_key(*key))
        .cloned()
        .collect();

    let select = |pred: fn(&StatusChange) -> bool| -> Vec<StatusChange> {
        changes.iter().filter(|c| pred(c)).cloned().collect()
    };
    let deteriorated = select(StatusChange::is_deterioration);
    let improved = select(StatusChange::is_improvement);
    let new_damages = select(StatusChange::is_new_damage);

    ComparisonReport {
        before_inspection_id,
        after_inspection_id,
        total_changes: changes.len(),
        deteriorated_items: deteriorated.len(),
        improved_items: improved.len(),
        new_damage_items: new_damages.len(),
        estimated_deterioration_cost: round_cents(
            deterioration_unit_cost * deteriorated.len() as f64,
        ),
        changes,
        deteriorated,
        improved,
        new_damages,
        unmatched_before,
        unmatched_after,
        status: ReportStatus::Success,
    }
}

/// Loads both checklists and compares them. Fails if either inspection
/// does not exist.
pub fn compare_inspections(
    db: &Database,
    before_id: i64,
    after_id: i64,
    deterioration_unit_cost: f64,
) -> Result<ComparisonReport, VistoriaError> {
    let loaded = db.with_conn(|conn| {
        for id in [before_id, after_id] {
            if !inspection_repo::exists_in(conn, id)? {
                return Ok(Err(id));
            }
        }
        Ok(Ok((
            checklist_repo::list_for_inspection_in(conn, before_id)?,
            checklist_repo::list_for_inspection_in(conn, after_id)?,
        )))
    })?;

    let (before, after) = loaded.map_err(DomainError::InspectionNotFound)?;
    Ok(compare_checklists(
        before_id,
        &before,
        after_id,
        &after,
        deterioration_unit_cost,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;

    fn entry(inspection_id: i64, room: &str, item: &str, status: ConditionStatus) -> ChecklistEntry {
        ChecklistEntry {
            id: 0,
            inspection_id,
            room: room.to_string(),
            item: item.to_string(),
            status,
            notes: None,
            ai_analysis: None,
            repair_cost_estimate: 0.0,
            priority: Priority::Low,
        }
    }

    #[test]
    fn test_status_change_predicates() {
        let change = StatusChange {
            room: "bathroom".to_string(),
            item: "sink".to_string(),
            from_status: ConditionStatus::Dirty,
            to_status: ConditionStatus::Damaged,
        };
        assert!(!change.is_deterioration());
        assert!(!change.is_improvement());
        assert!(change.is_new_damage());
    }

    #[test]
    fn test_missing_to_ok_is_uncategorised_change() {
        let before = vec![entry(1, "hall", "lamp", ConditionStatus::Missing)];
        let after = vec![entry(2, "hall", "lamp", ConditionStatus::Ok)];

        let report = compare_checklists(1, &before, 2, &after, 100.0);
        assert_eq!(report.total_changes, 1);
        assert_eq!(report.deteriorated_items, 0);
        assert_eq!(report.improved_items, 0);
        assert_eq!(report.new_damage_items, 0);
    }

    #[test]
    fn test_costs_scale_with_deteriorations() {
        let before = vec![
            entry(1, "kitchen", "floor", ConditionStatus::Ok),
            entry(1, "kitchen", "wall", ConditionStatus::Ok),
            entry(1, "kitchen", "sink", ConditionStatus::Damaged),
        ];
        let after = vec![
            entry(2, "kitchen", "floor", ConditionStatus::Dirty),
            entry(2, "kitchen", "wall", ConditionStatus::Damaged),
            entry(2, "kitchen", "sink", ConditionStatus::Ok),
        ];

        let report = compare_checklists(1, &before, 2, &after, 100.0);
        assert_eq!(report.total_changes, 3);
        assert_eq!(report.deteriorated_items, 2);
        assert_eq!(report.improved_items, 1);
        assert_eq!(report.new_damage_items, 1);
        assert_eq!(report.estimated_deterioration_cost, 200.0);
        assert_eq!(report.new_damages[0].item, "wall");
    }

    #[test]
    fn test_unknown_inspection_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let err = compare_inspections(&db, 1, 2, 100.0).unwrap_err();
        assert!(matches!(
            err,
            VistoriaError::Domain(DomainError::InspectionNotFound(1))
        ));
    }
}
