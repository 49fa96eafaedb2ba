//! Tabular results returned by views and raw queries.

use rusqlite::{Params, Statement};
use serde::Serialize;

use crate::value::Value;

/// Column names plus rows of values, in query order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    /// Create an empty result with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at `row` in the named column.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Run a prepared statement and collect every row.
    pub(crate) fn collect<P: Params>(stmt: &mut Statement<'_>, params: P) -> rusqlite::Result<Self> {
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query(params)?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(Value::from(row.get_ref(i)?));
            }
            rows.push(values);
        }

        Ok(Self { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_collect_rows() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn
            .prepare("SELECT 1 AS a, 'x' AS b UNION ALL SELECT 2, NULL")
            .unwrap();
        let set = RowSet::collect(&mut stmt, []).unwrap();

        assert_eq!(set.columns, vec!["a", "b"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0, "b"), Some(&Value::from("x")));
        assert_eq!(set.get(1, "b"), Some(&Value::Null));
        assert_eq!(set.get(1, "missing"), None);
    }
}
