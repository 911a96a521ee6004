//! Database migration system.
//!
//! Tracks applied migrations in a `_migrations` table and applies
//! pending ones in order. ADD COLUMN migrations are skipped when the
//! column already exists so a partially migrated file can be reopened.

use rusqlite::Connection;

use super::error::DatabaseError;

/// A single migration definition.
struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
    kind: MigrationKind,
}

enum MigrationKind {
    /// Execute the SQL directly.
    Standard,
    /// ALTER TABLE ADD COLUMN, skipped if the column already exists.
    AddColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// All migrations in order. Each is applied at most once.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_inspections_table",
        sql: include_str!("sql/001_create_inspections.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 2,
        description: "create_checklist_entries_table",
        sql: include_str!("sql/002_create_checklist_entries.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 3,
        description: "create_inspection_files_table",
        sql: include_str!("sql/003_create_inspection_files.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 4,
        description: "create_repair_costs_table",
        sql: include_str!("sql/004_create_repair_costs.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 5,
        description: "create_jobs_table",
        sql: include_str!("sql/005_create_jobs.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 6,
        description: "add_region_to_inspections",
        sql: include_str!("sql/006_add_inspection_region.sql"),
        kind: MigrationKind::AddColumn {
            table: "inspections",
            column: "region",
        },
    },
    Migration {
        version: 7,
        description: "seed_portuguese_tariffs",
        sql: include_str!("sql/007_seed_portuguese_tariffs.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 8,
        description: "create_templates_table",
        sql: include_str!("sql/008_create_templates.sql"),
        kind: MigrationKind::Standard,
    },
];

/// Runs all pending migrations on the given connection.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        log::info!(
            "Running migration v{}: {}",
            migration.version,
            migration.description
        );

        let should_run = match &migration.kind {
            MigrationKind::Standard => true,
            MigrationKind::AddColumn { table, column } => !column_exists(conn, table, column)?,
        };

        if should_run {
            conn.execute_batch(migration.sql)
                .map_err(|e| DatabaseError::Migration {
                    version: migration.version,
                    reason: e.to_string(),
                })?;
        } else {
            log::info!(
                "Skipping migration v{} (condition not met)",
                migration.version
            );
        }

        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )?;
    }

    Ok(())
}

/// Checks whether a column exists on a table using `PRAGMA table_info`.
fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    // Identifiers are interpolated, so only alphanumerics and underscores pass.
    if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DatabaseError::Migration {
            version: 0,
            reason: format!("Invalid table name: {}", table),
        });
    }
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .any(|r| r.map(|name| name == column).unwrap_or(false));
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        run_all(&conn).unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let conn = migrated();
        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = migrated();
        run_all(&conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);

        // Seeded tariffs are not duplicated either.
        let tariffs: u32 = conn
            .query_row("SELECT COUNT(*) FROM repair_costs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(tariffs, 16);

        let templates: u32 = conn
            .query_row("SELECT COUNT(*) FROM templates WHERE is_default = 1", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(templates, 2);
    }

    #[test]
    fn test_portuguese_item_names_are_priced() {
        let conn = migrated();
        let cost: f64 = conn
            .query_row(
                "SELECT cost_per_unit FROM repair_costs WHERE region = 'RJ' AND item_type = ?1",
                ["vaso sanitário"],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(cost, 300.0);
    }

    #[test]
    fn test_column_exists_check() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE test_tbl (id TEXT, name TEXT);")
            .unwrap();

        assert!(column_exists(&conn, "test_tbl", "id").unwrap());
        assert!(column_exists(&conn, "test_tbl", "name").unwrap());
        assert!(!column_exists(&conn, "test_tbl", "missing").unwrap());
        assert!(column_exists(&conn, "bad;name", "id").is_err());
    }

    #[test]
    fn test_inspections_have_region() {
        let conn = migrated();
        assert!(column_exists(&conn, "inspections", "region").unwrap());
    }

    #[test]
    fn test_add_column_skipped_when_present() {
        let conn = Connection::open_in_memory().unwrap();
        // Simulate a database where the column was added by hand before v6 was recorded.
        conn.execute_batch(include_str!("sql/001_create_inspections.sql"))
            .unwrap();
        conn.execute_batch(include_str!("sql/006_add_inspection_region.sql"))
            .unwrap();
        run_all(&conn).unwrap();

        assert!(column_exists(&conn, "inspections", "region").unwrap());
    }

    #[test]
    fn test_checklist_key_is_unique_per_inspection() {
        let conn = migrated();
        conn.execute(
            "INSERT INTO inspections (property_address, kind, created_at) VALUES ('Rua A, 1', 'entry', '2026-01-01')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO checklist_entries (inspection_id, room, item) VALUES (1, 'bathroom', 'sink')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO checklist_entries (inspection_id, room, item) VALUES (1, 'bathroom', 'sink')",
            [],
        );
        assert!(dup.is_err());
    }
}
