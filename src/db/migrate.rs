use rusqlite::{Connection, OptionalExtension, Result};
use tracing::info;

/// Ensure that the `log` table exists. It also records applied migrations.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20250110_0001_create_entries",
        description: "Created entries table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS entries (
            date        TEXT PRIMARY KEY,        -- YYYY-MM-DD
            start_time  TEXT NOT NULL DEFAULT '', -- HH:MM or ''
            break_time  TEXT NOT NULL DEFAULT '', -- HH:MM or ''
            end_time    TEXT NOT NULL DEFAULT '', -- HH:MM or ''
            location    TEXT,
            updated_at  TEXT NOT NULL             -- ISO 8601
        );
        CREATE INDEX IF NOT EXISTS idx_entries_month ON entries(substr(date, 1, 7));
        "#,
    },
    Migration {
        version: "20250110_0002_create_kv_store",
        description: "Created kv_store table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS kv_store (
            key        TEXT PRIMARY KEY,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    },
];

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

/// Public entry point: run all pending migrations. Safe to call repeatedly.
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    ensure_log_table(conn)?;

    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }

        conn.execute_batch(m.sql)?;

        conn.execute(
            "INSERT INTO log (date, operation, target, message)
             VALUES (?1, 'migration_applied', ?2, ?3)",
            [
                chrono::Local::now().to_rfc3339().as_str(),
                m.version,
                m.description,
            ],
        )?;

        info!(version = m.version, "migration applied");
    }

    Ok(())
}
