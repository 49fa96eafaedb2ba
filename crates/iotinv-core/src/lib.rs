//! iotinv core: inventory of an IoT deployment over SQLite.
//!
//! Buildings, rooms, gateways, servers, sensors, sensor types, network
//! types and applications live in plain tables with integer surrogate keys
//! and no declared foreign keys. This crate keeps them consistent:
//!
//! - [`catalog`] describes the entity kinds and who references whom.
//! - [`storage`] provides typed inserts, updates and lookups that check
//!   parent references, plus `max + 1` id allocation.
//! - [`cascade`] deletes a row together with everything depending on it.
//! - [`topology`] regroups flat joins into nested server and application views.
//! - [`views`] and [`raw`] cover read-only display queries.

pub mod cascade;
pub mod catalog;
pub mod error;
pub mod model;
pub mod raw;
pub mod result;
pub mod storage;
pub mod topology;
pub mod value;
pub mod views;

pub use cascade::{plan, CascadeExecutor, CascadeResult, CascadeStep};
pub use catalog::{EntityKind, RelationDef};
pub use error::{CascadeError, Error, Result};
pub use model::{
    Application, Building, Choice, Connection, Gateway, NetworkType, Record, Room, Sensor,
    SensorType, Server,
};
pub use result::RowSet;
pub use storage::{DanglingRef, Store, StoreConfig, DEFAULT_DATABASE_PATH};
pub use topology::{Topology, TopologyLine};
pub use value::Value;
pub use views::View;
