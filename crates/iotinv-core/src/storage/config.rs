//! Store configuration.

use std::path::{Path, PathBuf};

/// Default database file, relative to the working directory.
pub const DEFAULT_DATABASE_PATH: &str = "IoT.db";

/// Configuration for opening a [`Store`](super::Store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database file. `None` opens a private in-memory database.
    pub path: Option<PathBuf>,

    /// Create missing tables on open.
    pub create_schema: bool,

    /// Create the optional `connection` table along with the others.
    pub with_connections: bool,

    /// Allow free-form read-only queries through [`Store::raw_query`](super::Store::raw_query).
    pub allow_raw_sql: bool,
}

impl StoreConfig {
    /// Configuration for a database file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            create_schema: true,
            with_connections: true,
            allow_raw_sql: false,
        }
    }

    /// Configuration for an in-memory database.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            ..Self::new(DEFAULT_DATABASE_PATH)
        }
    }

    /// Do not create missing tables.
    pub fn without_schema(mut self) -> Self {
        self.create_schema = false;
        self
    }

    /// Choose whether the `connection` table is created.
    pub fn with_connections(mut self, enabled: bool) -> Self {
        self.with_connections = enabled;
        self
    }

    /// Enable the raw read-only query escape hatch.
    pub fn with_raw_sql(mut self) -> Self {
        self.allow_raw_sql = true;
        self
    }

    /// Whether this configuration targets an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.path.is_none()
    }

    /// Database file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_PATH)
    }
}
