//! Free-form read-only queries.
//!
//! Only available when the store was opened with `allow_raw_sql`, and only
//! for statements SQLite reports as read-only that return columns. Mutations always go through
//! the typed store and the cascade executor.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::result::RowSet;
use crate::storage::Store;

impl Store {
    /// Whether raw queries are enabled.
    pub fn raw_sql_enabled(&self) -> bool {
        self.config().allow_raw_sql
    }

    /// Run one read-only statement and collect its rows.
    ///
    /// Preparation and execution failures come back as [`Error::Query`] so
    /// the caller can report them and carry on.
    pub fn raw_query(&self, sql: &str) -> Result<RowSet> {
        if !self.raw_sql_enabled() {
            return Err(Error::CapabilityDenied);
        }

        let sql = sql.trim();
        debug!(sql, "raw query");

        let mut stmt = self
            .conn()
            .prepare(sql)
            .map_err(|e| Error::Query(e.to_string()))?;
        // Transaction control is read-only to SQLite but yields no columns.
        if !stmt.readonly() || stmt.column_count() == 0 {
            return Err(Error::ReadOnlyViolation);
        }

        let rows = RowSet::collect(&mut stmt, []).map_err(|e| Error::Query(e.to_string()));
        drop(stmt);

        if !self.conn().is_autocommit() {
            warn!(sql, "raw query left a transaction open, rolling back");
            self.conn().execute_batch("ROLLBACK")?;
            return Err(Error::ReadOnlyViolation);
        }
        rows
    }
}
