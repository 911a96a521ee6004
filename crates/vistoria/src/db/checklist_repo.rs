//! Checklist repository: entries of the `checklist_entries` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{parse_column, Database, DatabaseError};
use crate::model::{ChecklistEntry, ConditionStatus, NewChecklistEntry, Priority};

fn from_row(row: &Row<'_>) -> Result<ChecklistEntry, rusqlite::Error> {
    Ok(ChecklistEntry {
        id: row.get("id")?,
        inspection_id: row.get("inspection_id")?,
        room: row.get("room")?,
        item: row.get("item")?,
        status: parse_column(row, "status")?,
        notes: row.get("notes")?,
        ai_analysis: row.get("ai_analysis")?,
        repair_cost_estimate: row.get("repair_cost_estimate")?,
        priority: parse_column(row, "priority")?,
    })
}

/// Adds an entry to an inspection and returns its id.
///
/// Fails with a constraint error if the (room, item) pair already exists
/// on that inspection.
pub fn insert(
    db: &Database,
    inspection_id: i64,
    entry: &NewChecklistEntry,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO checklist_entries (inspection_id, room, item, status, notes, priority)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                inspection_id,
                entry.room,
                entry.item,
                entry.status.as_str(),
                entry.notes,
                entry.priority.as_str(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Adds an entry unless its (room, item) pair is already on the inspection.
/// Returns the new id, or `None` when the pair existed.
pub fn insert_if_absent_in(
    conn: &Connection,
    inspection_id: i64,
    entry: &NewChecklistEntry,
) -> Result<Option<i64>, DatabaseError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO checklist_entries
         (inspection_id, room, item, status, notes, priority)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            inspection_id,
            entry.room,
            entry.item,
            entry.status.as_str(),
            entry.notes,
            entry.priority.as_str(),
        ],
    )?;
    Ok((inserted > 0).then(|| conn.last_insert_rowid()))
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<ChecklistEntry>, DatabaseError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row(
                "SELECT * FROM checklist_entries WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?;
        Ok(found)
    })
}

/// Lists all entries of one inspection ordered by room then item.
pub fn list_for_inspection(
    db: &Database,
    inspection_id: i64,
) -> Result<Vec<ChecklistEntry>, DatabaseError> {
    db.with_conn(|conn| list_for_inspection_in(conn, inspection_id))
}

pub fn list_for_inspection_in(
    conn: &Connection,
    inspection_id: i64,
) -> Result<Vec<ChecklistEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT * FROM checklist_entries WHERE inspection_id = ?1 ORDER BY room, item",
    )?;
    let rows = stmt
        .query_map(params![inspection_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Records a new observed condition for an entry.
pub fn update_status(
    db: &Database,
    id: i64,
    status: ConditionStatus,
    notes: Option<&str>,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE checklist_entries SET status = ?2, notes = COALESCE(?3, notes) WHERE id = ?1",
            params![id, status.as_str(), notes],
        )?;
        Ok(())
    })
}

/// Writes the AI analysis and derived priority onto an entry.
pub fn update_analysis_in(
    conn: &Connection,
    id: i64,
    analysis: &str,
    priority: Priority,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE checklist_entries SET ai_analysis = ?2, priority = ?3 WHERE id = ?1",
        params![id, analysis, priority.as_str()],
    )?;
    Ok(())
}

pub fn set_repair_cost_in(conn: &Connection, id: i64, cost: f64) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE checklist_entries SET repair_cost_estimate = ?2 WHERE id = ?1",
        params![id, cost],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::inspection_repo;
    use crate::model::{InspectionKind, NewInspection};

    fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let id =
            inspection_repo::insert(&db, &NewInspection::new("Rua A", InspectionKind::Entry))
                .unwrap();
        (db, id)
    }

    #[test]
    fn test_insert_and_list() {
        let (db, inspection_id) = setup();
        insert(
            &db,
            inspection_id,
            &NewChecklistEntry::new("kitchen", "sink", ConditionStatus::Ok),
        )
        .unwrap();
        insert(
            &db,
            inspection_id,
            &NewChecklistEntry::new("bathroom", "toilet", ConditionStatus::Damaged)
                .with_notes("cracked lid"),
        )
        .unwrap();

        let entries = list_for_inspection(&db, inspection_id).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].room, "bathroom");
        assert_eq!(entries[0].status, ConditionStatus::Damaged);
        assert_eq!(entries[0].notes.as_deref(), Some("cracked lid"));
        assert_eq!(entries[1].room, "kitchen");
        assert_eq!(entries[1].priority, Priority::Low);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let (db, inspection_id) = setup();
        let entry = NewChecklistEntry::new("kitchen", "sink", ConditionStatus::Ok);
        insert(&db, inspection_id, &entry).unwrap();
        assert!(insert(&db, inspection_id, &entry).is_err());
    }

    #[test]
    fn test_insert_if_absent_skips_existing_key() {
        let (db, inspection_id) = setup();
        let existing = insert(
            &db,
            inspection_id,
            &NewChecklistEntry::new("kitchen", "sink", ConditionStatus::Damaged),
        )
        .unwrap();

        let (skipped, added) = db
            .with_conn(|conn| {
                let skipped = insert_if_absent_in(
                    conn,
                    inspection_id,
                    &NewChecklistEntry::new("kitchen", "sink", ConditionStatus::Ok),
                )?;
                let added = insert_if_absent_in(
                    conn,
                    inspection_id,
                    &NewChecklistEntry::new("kitchen", "stove", ConditionStatus::Ok),
                )?;
                Ok((skipped, added))
            })
            .unwrap();

        assert!(skipped.is_none());
        assert!(added.is_some_and(|id| id != existing));
        let sink = find_by_id(&db, existing).unwrap().unwrap();
        assert_eq!(sink.status, ConditionStatus::Damaged);
    }

    #[test]
    fn test_update_status_keeps_notes() {
        let (db, inspection_id) = setup();
        let id = insert(
            &db,
            inspection_id,
            &NewChecklistEntry::new("kitchen", "sink", ConditionStatus::Ok).with_notes("clean"),
        )
        .unwrap();

        update_status(&db, id, ConditionStatus::Dirty, None).unwrap();
        let found = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(found.status, ConditionStatus::Dirty);
        assert_eq!(found.notes.as_deref(), Some("clean"));
    }

    #[test]
    fn test_update_analysis() {
        let (db, inspection_id) = setup();
        let id = insert(
            &db,
            inspection_id,
            &NewChecklistEntry::new("kitchen", "sink", ConditionStatus::Ok),
        )
        .unwrap();

        db.with_conn(|conn| update_analysis_in(conn, id, "visible leak", Priority::Critical))
            .unwrap();
        let found = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(found.ai_analysis.as_deref(), Some("visible leak"));
        assert_eq!(found.priority, Priority::Critical);
    }
}
