//! Inspection repository: CRUD operations for the `inspections` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{now_rfc3339, parse_column, Database, DatabaseError};
use crate::error::{DomainError, VistoriaError};
use crate::model::{Inspection, InspectionStatus, NewInspection};

fn from_row(row: &Row<'_>) -> Result<Inspection, rusqlite::Error> {
    Ok(Inspection {
        id: row.get("id")?,
        property_address: row.get("property_address")?,
        landlord_name: row.get("landlord_name")?,
        tenant_name: row.get("tenant_name")?,
        kind: parse_column(row, "kind")?,
        status: parse_column(row, "status")?,
        template_type: parse_column(row, "template_type")?,
        region: row.get("region")?,
        total_cost_estimate: row.get("total_cost_estimate")?,
        created_at: row.get("created_at")?,
    })
}

/// Inserts a new inspection in `draft` status and returns its id.
pub fn insert(db: &Database, new: &NewInspection) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO inspections (property_address, landlord_name, tenant_name, kind,
             status, template_type, region, total_cost_estimate, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
            params![
                new.property_address,
                new.landlord_name,
                new.tenant_name,
                new.kind.as_str(),
                InspectionStatus::Draft.as_str(),
                new.template_type.as_str(),
                new.region,
                now_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Finds an inspection by its id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Inspection>, DatabaseError> {
    db.with_conn(|conn| find_by_id_in(conn, id))
}

pub fn find_by_id_in(conn: &Connection, id: i64) -> Result<Option<Inspection>, DatabaseError> {
    let found = conn
        .query_row(
            "SELECT * FROM inspections WHERE id = ?1",
            params![id],
            from_row,
        )
        .optional()?;
    Ok(found)
}

pub fn exists_in(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM inspections WHERE id = ?1",
        params![id],
        |r| r.get(0),
    )?;
    Ok(count > 0)
}

/// Overwrites the aggregate repair estimate. Returns false if no row matched.
pub fn set_total_cost_in(conn: &Connection, id: i64, total: f64) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE inspections SET total_cost_estimate = ?2 WHERE id = ?1",
        params![id, total],
    )?;
    Ok(changed > 0)
}

/// Moves an inspection forward in its lifecycle.
///
/// Backward or repeated transitions are rejected without touching the row.
pub fn update_status(
    db: &Database,
    id: i64,
    next: InspectionStatus,
) -> Result<Inspection, VistoriaError> {
    let updated = db.with_conn(|conn| {
        let Some(mut inspection) = find_by_id_in(conn, id)? else {
            return Ok(Err(DomainError::InspectionNotFound(id)));
        };
        match inspection.status.transition_to(next) {
            Ok(status) => {
                conn.execute(
                    "UPDATE inspections SET status = ?2 WHERE id = ?1",
                    params![id, status.as_str()],
                )?;
                inspection.status = status;
                Ok(Ok(inspection))
            }
            Err(e) => Ok(Err(e)),
        }
    })?;
    Ok(updated?)
}

/// Lists inspections recorded for a property address, oldest first.
pub fn list_for_property(
    db: &Database,
    property_address: &str,
) -> Result<Vec<Inspection>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM inspections WHERE property_address = ?1 ORDER BY created_at, id",
        )?;
        let rows = stmt
            .query_map(params![property_address], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
