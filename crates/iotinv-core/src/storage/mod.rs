//! Storage layer over SQLite.

mod config;
mod engine;
pub mod ids;
pub mod schema;

pub use config::{StoreConfig, DEFAULT_DATABASE_PATH};
pub use engine::{DanglingRef, Store};
