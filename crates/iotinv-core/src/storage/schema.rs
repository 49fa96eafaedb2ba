//! Table definitions.
//!
//! No `REFERENCES` clauses: referential integrity is kept by the store's
//! parent checks and by the cascade executor.

use rusqlite::{Connection, OptionalExtension};

/// The eight keyed tables and their lookup indexes.
pub const INVENTORY_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS building (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS room (
    id INTEGER PRIMARY KEY,
    building_id INTEGER NOT NULL,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS network_type (
    id INTEGER PRIMARY KEY,
    technology TEXT NOT NULL,
    bit_rate INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS server (
    id INTEGER PRIMARY KEY,
    ip_address TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS gateway (
    id INTEGER PRIMARY KEY,
    room_id INTEGER NOT NULL,
    server_id INTEGER NOT NULL,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sensor_type (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    unit TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sensor (
    id INTEGER PRIMARY KEY,
    room_id INTEGER NOT NULL,
    gateway_id INTEGER NOT NULL,
    type_id INTEGER NOT NULL,
    network_id INTEGER NOT NULL,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS application (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_room_building ON room(building_id);
CREATE INDEX IF NOT EXISTS idx_gateway_room ON gateway(room_id);
CREATE INDEX IF NOT EXISTS idx_gateway_server ON gateway(server_id);
CREATE INDEX IF NOT EXISTS idx_sensor_room ON sensor(room_id);
CREATE INDEX IF NOT EXISTS idx_sensor_gateway ON sensor(gateway_id);
CREATE INDEX IF NOT EXISTS idx_sensor_type ON sensor(type_id);
CREATE INDEX IF NOT EXISTS idx_sensor_network ON sensor(network_id);
"#;

/// The optional application ↔ server association table.
pub const CONNECTION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS connection (
    application_id INTEGER NOT NULL,
    server_id INTEGER NOT NULL,
    PRIMARY KEY (application_id, server_id)
);

CREATE INDEX IF NOT EXISTS idx_connection_server ON connection(server_id);
"#;

/// Create any missing tables.
pub fn install(conn: &Connection, with_connections: bool) -> rusqlite::Result<()> {
    conn.execute_batch(INVENTORY_SCHEMA)?;
    if with_connections {
        conn.execute_batch(CONNECTION_SCHEMA)?;
    }
    Ok(())
}

/// Check whether a table exists.
pub fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}
