//! Surrogate id allocation.

use rusqlite::Connection;

use crate::catalog::EntityKind;
use crate::error::{Error, Result};

/// Next free id for `kind`: one past the current maximum, or `1` for an
/// empty table.
///
/// Ids of deleted rows are never reclaimed explicitly; they come back only
/// when they were the maximum. Assumes a single writer.
pub fn next_id(conn: &Connection, kind: EntityKind) -> Result<i64> {
    if !kind.is_keyed() {
        return Err(Error::NotKeyed(kind));
    }

    let sql = format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {}", kind.table());
    let id = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(id)
}
