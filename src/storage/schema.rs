//! Database schema definitions.
//!
//! The store has exactly one table. It is created when absent and never
//! altered afterwards; there is no migration step.

use rusqlite::{Connection, Result};

/// The complete SQL schema.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL
);
";

/// Apply connection pragmas and the schema.
///
/// Idempotent because the DDL uses `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    // Commits stay in the -wal file until a checkpoint
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;

    Ok(())
}
