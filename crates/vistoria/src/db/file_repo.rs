//! File repository: uploaded artifacts in the `inspection_files` table.
//!
//! Rows are created at upload time and mutated in place by the
//! processing jobs. A re-run overwrites the previous derived content.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{now_rfc3339, parse_column, Database, DatabaseError};
use crate::model::{DetectedObject, FileAnalysis, FileRecord, NewFileRecord, ProcessingStatus};

fn from_row(row: &Row<'_>) -> Result<FileRecord, rusqlite::Error> {
    let detected_json: String = row.get("detected_objects")?;
    let detected_objects: Vec<DetectedObject> =
        serde_json::from_str(&detected_json).map_err(|e| {
            let index = row.as_ref().column_index("detected_objects").unwrap_or(0);
            rusqlite::Error::FromSqlConversionFailure(
                index,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

    Ok(FileRecord {
        id: row.get("id")?,
        inspection_id: row.get("inspection_id")?,
        checklist_entry_id: row.get("checklist_entry_id")?,
        kind: parse_column(row, "kind")?,
        file_path: row.get("file_path")?,
        original_filename: row.get("original_filename")?,
        ai_analysis: row.get("ai_analysis")?,
        transcription: row.get("transcription")?,
        ocr_text: row.get("ocr_text")?,
        detected_objects,
        processing_status: parse_column(row, "processing_status")?,
        attempts: row.get("attempts")?,
        last_error: row.get("last_error")?,
        uploaded_at: row.get("uploaded_at")?,
    })
}

/// Records an uploaded file. New rows start out `pending`.
pub fn register_upload(db: &Database, new: &NewFileRecord) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO inspection_files (inspection_id, checklist_entry_id, kind, file_path,
             original_filename, processing_status, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.inspection_id,
                new.checklist_entry_id,
                new.kind.as_str(),
                new.file_path,
                new.original_filename,
                ProcessingStatus::Pending.as_str(),
                now_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<FileRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row(
                "SELECT * FROM inspection_files WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?;
        Ok(found)
    })
}

/// Finds the record an inspection holds under `path`.
///
/// The same path may be registered under several inspections, so the
/// lookup is always scoped.
pub fn find_for_inspection_in(
    conn: &Connection,
    inspection_id: i64,
    path: &str,
) -> Result<Option<FileRecord>, DatabaseError> {
    let found = conn
        .query_row(
            "SELECT * FROM inspection_files WHERE inspection_id = ?1 AND file_path = ?2
             ORDER BY id LIMIT 1",
            params![inspection_id, path],
            from_row,
        )
        .optional()?;
    Ok(found)
}

pub fn find_for_inspection(
    db: &Database,
    inspection_id: i64,
    path: &str,
) -> Result<Option<FileRecord>, DatabaseError> {
    db.with_conn(|conn| find_for_inspection_in(conn, inspection_id, path))
}

pub fn list_for_inspection(
    db: &Database,
    inspection_id: i64,
) -> Result<Vec<FileRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM inspection_files WHERE inspection_id = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map(params![inspection_id], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Lists artifacts a crashed batch left `pending` or `processing`.
pub fn list_resumable(db: &Database) -> Result<Vec<FileRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM inspection_files WHERE processing_status IN (?1, ?2)
             ORDER BY inspection_id, id",
        )?;
        let rows = stmt
            .query_map(
                params![
                    ProcessingStatus::Pending.as_str(),
                    ProcessingStatus::Processing.as_str()
                ],
                from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Marks the inspection's records stored under one of `paths` as pending.
/// Returns the number of rows touched.
pub fn mark_pending(
    db: &Database,
    inspection_id: i64,
    paths: &[String],
) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "UPDATE inspection_files SET processing_status = ?3
             WHERE inspection_id = ?1 AND file_path = ?2",
        )?;
        let mut touched = 0;
        for path in paths {
            touched += stmt.execute(params![
                inspection_id,
                path,
                ProcessingStatus::Pending.as_str()
            ])?;
        }
        Ok(touched)
    })
}

/// Flags the start of an attempt: status `processing`, attempts + 1.
pub fn begin_attempt_in(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE inspection_files SET processing_status = ?2, attempts = attempts + 1,
         last_error = NULL WHERE id = ?1",
        params![id, ProcessingStatus::Processing.as_str()],
    )?;
    Ok(())
}

/// Marks the inspection's records under `path` whose file has disappeared
/// from disk.
pub fn mark_missing_in(
    conn: &Connection,
    inspection_id: i64,
    path: &str,
) -> Result<usize, DatabaseError> {
    let touched = conn.execute(
        "UPDATE inspection_files SET processing_status = ?3
         WHERE inspection_id = ?1 AND file_path = ?2",
        params![inspection_id, path, ProcessingStatus::Missing.as_str()],
    )?;
    Ok(touched)
}

pub fn mark_failed_in(conn: &Connection, id: i64, error: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE inspection_files SET processing_status = ?2, last_error = ?3 WHERE id = ?1",
        params![id, ProcessingStatus::Failed.as_str(), error],
    )?;
    Ok(())
}

/// Writes derived content and completes the record.
///
/// `warning` is kept in `last_error` when a collaborator failed and a
/// placeholder was stored instead.
pub fn complete_in(
    conn: &Connection,
    id: i64,
    analysis: &FileAnalysis,
    warning: Option<&str>,
) -> Result<(), DatabaseError> {
    let completed = ProcessingStatus::Completed.as_str();
    match analysis {
        FileAnalysis::Photo {
            analysis,
            detected_objects,
        } => {
            let detected =
                serde_json::to_string(detected_objects).map_err(|e| DatabaseError::Json {
                    column: "detected_objects",
                    source: e,
                })?;
            conn.execute(
                "UPDATE inspection_files SET ai_analysis = ?2, detected_objects = ?3,
                 processing_status = ?4, last_error = ?5 WHERE id = ?1",
                params![id, analysis, detected, completed, warning],
            )?;
        }
        FileAnalysis::Audio {
            transcription,
            summary,
        } => {
            conn.execute(
                "UPDATE inspection_files SET transcription = ?2,
                 ai_analysis = COALESCE(?3, ai_analysis),
                 processing_status = ?4, last_error = ?5 WHERE id = ?1",
                params![id, transcription, summary, completed, warning],
            )?;
        }
        FileAnalysis::Document { ocr_text } => {
            conn.execute(
                "UPDATE inspection_files SET ocr_text = ?2,
                 processing_status = ?3, last_error = ?4 WHERE id = ?1",
                params![id, ocr_text, completed, warning],
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::inspection_repo;
    use crate::model::{FileKind, InspectionKind, NewInspection};
    use std::path::Path;

    fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let id =
            inspection_repo::insert(&db, &NewInspection::new("Rua A", InspectionKind::Entry))
                .unwrap();
        (db, id)
    }

    #[test]
    fn test_register_and_find_for_inspection() {
        let (db, inspection_id) = setup();
        let id = register_upload(
            &db,
            &NewFileRecord::from_path(inspection_id, Path::new("/uploads/sink.jpg")),
        )
        .unwrap();

        let found = find_for_inspection(&db, inspection_id, "/uploads/sink.jpg")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.kind, FileKind::Photo);
        assert_eq!(found.processing_status, ProcessingStatus::Pending);
        assert_eq!(found.attempts, 0);
        assert!(found.detected_objects.is_empty());
        assert!(find_for_inspection(&db, inspection_id, "/uploads/other.jpg")
            .unwrap()
            .is_none());
        assert!(find_for_inspection(&db, inspection_id + 1, "/uploads/sink.jpg")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_attempt_lifecycle() {
        let (db, inspection_id) = setup();
        let id = register_upload(
            &db,
            &NewFileRecord::from_path(inspection_id, Path::new("/uploads/sink.jpg")),
        )
        .unwrap();

        let detected = vec![DetectedObject {
            label: "sink".to_string(),
            confidence: 0.91,
            source_label: "sink".to_string(),
        }];
        db.with_conn(|conn| {
            begin_attempt_in(conn, id)?;
            complete_in(
                conn,
                id,
                &FileAnalysis::Photo {
                    analysis: "clean sink".to_string(),
                    detected_objects: detected.clone(),
                },
                None,
            )
        })
        .unwrap();

        let found = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(found.processing_status, ProcessingStatus::Completed);
        assert_eq!(found.attempts, 1);
        assert_eq!(found.ai_analysis.as_deref(), Some("clean sink"));
        assert_eq!(found.detected_objects, detected);
    }

    #[test]
    fn test_resumable_listing() {
        let (db, inspection_id) = setup();
        for name in ["a.jpg", "b.mp3", "c.pdf"] {
            register_upload(
                &db,
                &NewFileRecord::from_path(inspection_id, &Path::new("/uploads").join(name)),
            )
            .unwrap();
        }
        db.with_conn(|conn| {
            mark_missing_in(conn, inspection_id, "/uploads/a.jpg")?;
            let b = find_for_inspection_in(conn, inspection_id, "/uploads/b.mp3")?.unwrap();
            begin_attempt_in(conn, b.id)
        })
        .unwrap();

        let resumable = list_resumable(&db).unwrap();
        let paths: Vec<_> = resumable.iter().map(|f| f.file_path.as_str()).collect();
        assert_eq!(paths, vec!["/uploads/b.mp3", "/uploads/c.pdf"]);
    }

    #[test]
    fn test_mark_pending_counts_rows() {
        let (db, inspection_id) = setup();
        register_upload(
            &db,
            &NewFileRecord::from_path(inspection_id, Path::new("/uploads/a.jpg")),
        )
        .unwrap();
        let touched = mark_pending(
            &db,
            inspection_id,
            &["/uploads/a.jpg".to_string(), "/uploads/unknown.jpg".to_string()],
        )
        .unwrap();
        assert_eq!(touched, 1);
    }

    #[test]
    fn test_shared_path_updates_stay_in_their_inspection() {
        let (db, first) = setup();
        let second =
            inspection_repo::insert(&db, &NewInspection::new("Rua A", InspectionKind::Exit))
                .unwrap();
        let path = Path::new("/uploads/shared.jpg");
        let first_id = register_upload(&db, &NewFileRecord::from_path(first, path)).unwrap();
        let second_id = register_upload(&db, &NewFileRecord::from_path(second, path)).unwrap();

        let marked = db
            .with_conn(|conn| mark_missing_in(conn, second, "/uploads/shared.jpg"))
            .unwrap();
        assert_eq!(marked, 1);
        assert_eq!(
            find_by_id(&db, first_id).unwrap().unwrap().processing_status,
            ProcessingStatus::Pending
        );
        assert_eq!(
            find_by_id(&db, second_id).unwrap().unwrap().processing_status,
            ProcessingStatus::Missing
        );

        let found = find_for_inspection(&db, second, "/uploads/shared.jpg")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, second_id);
    }
}
