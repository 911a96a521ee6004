//! Template repository: checklist layouts of the `templates` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{now_rfc3339, parse_column, Database, DatabaseError};
use crate::model::{ChecklistTemplate, NewTemplate, TemplateRoom, TemplateType};

fn from_row(row: &Row<'_>) -> Result<ChecklistTemplate, rusqlite::Error> {
    let rooms_json: String = row.get("rooms")?;
    let rooms: Vec<TemplateRoom> = serde_json::from_str(&rooms_json).map_err(|e| {
        let index = row.as_ref().column_index("rooms").unwrap_or(0);
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ChecklistTemplate {
        id: row.get("id")?,
        name: row.get("name")?,
        template_type: parse_column(row, "template_type")?,
        rooms,
        is_default: row.get("is_default")?,
        created_at: row.get("created_at")?,
    })
}

/// Stores a custom (non-default) template and returns its id.
pub fn insert(db: &Database, template: &NewTemplate) -> Result<i64, DatabaseError> {
    let rooms = serde_json::to_string(&template.rooms).map_err(|e| DatabaseError::Json {
        column: "rooms",
        source: e,
    })?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO templates (name, template_type, rooms, is_default, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![
                template.name,
                template.template_type.as_str(),
                rooms,
                now_rfc3339()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn find_by_id_in(conn: &Connection, id: i64) -> Result<Option<ChecklistTemplate>, DatabaseError> {
    let found = conn
        .query_row(
            "SELECT * FROM templates WHERE id = ?1",
            params![id],
            from_row,
        )
        .optional()?;
    Ok(found)
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<ChecklistTemplate>, DatabaseError> {
    db.with_conn(|conn| find_by_id_in(conn, id))
}

/// The seeded default for a template type, if there is one.
pub fn find_default_in(
    conn: &Connection,
    template_type: TemplateType,
) -> Result<Option<ChecklistTemplate>, DatabaseError> {
    let found = conn
        .query_row(
            "SELECT * FROM templates WHERE template_type = ?1 AND is_default = 1",
            params![template_type.as_str()],
            from_row,
        )
        .optional()?;
    Ok(found)
}

pub fn find_default(
    db: &Database,
    template_type: TemplateType,
) -> Result<Option<ChecklistTemplate>, DatabaseError> {
    db.with_conn(|conn| find_default_in(conn, template_type))
}

pub fn list(db: &Database) -> Result<Vec<ChecklistTemplate>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM templates ORDER BY id")?;
        let rows = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
