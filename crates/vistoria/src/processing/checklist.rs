//! Checklist seeding: from a room-and-item template, and from the objects
//! detected in an inspection's photos.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info};
use serde::Serialize;

use crate::ai::{suggest_checklist_items, ChecklistSuggestion};
use crate::db::{checklist_repo, file_repo, inspection_repo, template_repo, Database};
use crate::error::DomainError;
use crate::model::{
    ConditionStatus, DetectedObject, FileKind, NewChecklistEntry, ProcessingStatus,
};

/// Entries created on an inspection from one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistSeed {
    pub inspection_id: i64,
    pub template_id: i64,
    /// Ids of the new entries, in template order.
    pub created: Vec<i64>,
    /// Template keys the inspection already had.
    pub skipped: usize,
}

/// Detected items for one room and the entries they added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSuggestion {
    pub room: String,
    pub suggestion: ChecklistSuggestion,
    pub created: Vec<i64>,
}

/// Creates one `ok` entry per (room, item) of a template.
///
/// Without `template_id` the default template for the inspection's
/// template type is used. Keys already on the inspection are left as they
/// are, so seeding twice creates nothing the second time. All inserts
/// share one transaction.
pub fn create_checklist_from_template(
    db: &Database,
    inspection_id: i64,
    template_id: Option<i64>,
) -> crate::Result<ChecklistSeed> {
    let inspection = inspection_repo::find_by_id(db, inspection_id)?
        .ok_or(DomainError::InspectionNotFound(inspection_id))?;
    let template = match template_id {
        Some(id) => template_repo::find_by_id(db, id)?
            .ok_or_else(|| DomainError::TemplateNotFound(id.to_string()))?,
        None => template_repo::find_default(db, inspection.template_type)?.ok_or_else(|| {
            DomainError::TemplateNotFound(inspection.template_type.to_string())
        })?,
    };

    let (created, skipped) = db.with_transaction(|tx| {
        let mut created = Vec::new();
        let mut skipped = 0;
        for key in template.keys() {
            let entry = NewChecklistEntry::new(key.room, key.item, ConditionStatus::Ok);
            match checklist_repo::insert_if_absent_in(tx, inspection_id, &entry)? {
                Some(id) => created.push(id),
                None => skipped += 1,
            }
        }
        Ok((created, skipped))
    })?;

    info!(
        "Inspection {} seeded from template '{}': {} entries created, {} already present",
        inspection_id,
        template.name,
        created.len(),
        skipped
    );
    Ok(ChecklistSeed {
        inspection_id,
        template_id: template.id,
        created,
        skipped,
    })
}

/// Adds an `ok` entry for every object detected in a room's photos that
/// the room does not list yet.
///
/// A photo belongs to the room of the checklist entry it is linked to.
/// Only completed photos are read; unlinked photos have no room and are
/// ignored. Rooms come back in name order.
pub fn extend_checklist_from_detections(
    db: &Database,
    inspection_id: i64,
) -> crate::Result<Vec<RoomSuggestion>> {
    if inspection_repo::find_by_id(db, inspection_id)?.is_none() {
        return Err(DomainError::InspectionNotFound(inspection_id).into());
    }

    let rooms: HashMap<i64, String> = checklist_repo::list_for_inspection(db, inspection_id)?
        .into_iter()
        .map(|entry| (entry.id, entry.room))
        .collect();

    let mut objects_by_room: BTreeMap<String, Vec<DetectedObject>> = BTreeMap::new();
    for record in file_repo::list_for_inspection(db, inspection_id)? {
        if record.kind != FileKind::Photo
            || record.processing_status != ProcessingStatus::Completed
        {
            continue;
        }
        let Some(room) = record.checklist_entry_id.and_then(|id| rooms.get(&id)) else {
            debug!("Photo {} is not linked to a room", record.id);
            continue;
        };
        objects_by_room
            .entry(room.clone())
            .or_default()
            .extend(record.detected_objects);
    }

    let suggestions = db.with_transaction(|tx| {
        let mut suggestions = Vec::with_capacity(objects_by_room.len());
        for (room, objects) in &objects_by_room {
            let suggestion = suggest_checklist_items(objects);
            let mut created = Vec::new();
            for item in &suggestion.detected_items {
                let entry =
                    NewChecklistEntry::new(room.as_str(), item.as_str(), ConditionStatus::Ok)
                        .with_notes("added from object detection");
                if let Some(id) = checklist_repo::insert_if_absent_in(tx, inspection_id, &entry)? {
                    created.push(id);
                }
            }
            suggestions.push(RoomSuggestion {
                room: room.clone(),
                suggestion,
                created,
            });
        }
        Ok(suggestions)
    })?;

    let added: usize = suggestions.iter().map(|s| s.created.len()).sum();
    info!(
        "Inspection {}: {} checklist entries added from detections in {} rooms",
        inspection_id,
        added,
        suggestions.len()
    );
    Ok(suggestions)
}
