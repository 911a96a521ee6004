//! Tariff repository: the `repair_costs` price table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::model::CostTariff;

fn from_row(row: &Row<'_>) -> Result<CostTariff, rusqlite::Error> {
    Ok(CostTariff {
        region: row.get("region")?,
        item_type: row.get("item_type")?,
        repair_type: row.get("repair_type")?,
        unit: row.get("unit")?,
        cost_per_unit: row.get("cost_per_unit")?,
        description: row.get("description")?,
    })
}

/// Looks up the tariff for an item in a region. `item_type` is matched
/// lower-cased and trimmed.
pub fn find_in(
    conn: &Connection,
    region: &str,
    item_type: &str,
) -> Result<Option<CostTariff>, DatabaseError> {
    let found = conn
        .query_row(
            "SELECT * FROM repair_costs WHERE region = ?1 AND item_type = ?2",
            params![region, item_type.trim().to_lowercase()],
            from_row,
        )
        .optional()?;
    Ok(found)
}

pub fn find(
    db: &Database,
    region: &str,
    item_type: &str,
) -> Result<Option<CostTariff>, DatabaseError> {
    db.with_conn(|conn| find_in(conn, region, item_type))
}

pub fn list_for_region(db: &Database, region: &str) -> Result<Vec<CostTariff>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM repair_costs WHERE region = ?1 ORDER BY item_type")?;
        let rows = stmt
            .query_map(params![region], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Inserts or replaces the tariff for (region, item_type).
pub fn upsert(db: &Database, tariff: &CostTariff) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO repair_costs (region, item_type, repair_type, unit, cost_per_unit, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(region, item_type) DO UPDATE SET
                repair_type = excluded.repair_type,
                unit = excluded.unit,
                cost_per_unit = excluded.cost_per_unit,
                description = excluded.description",
            params![
                tariff.region,
                tariff.item_type.trim().to_lowercase(),
                tariff.repair_type,
                tariff.unit,
                tariff.cost_per_unit,
                tariff.description,
            ],
        )?;
        Ok(())
    })
}
