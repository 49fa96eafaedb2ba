//! Typed records for each entity kind.
//!
//! A record built with `new` carries id `0` until the store assigns one on
//! insert.

use rusqlite::types::Value as SqlValue;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::catalog::EntityKind;

/// A row of a keyed entity table.
pub trait Record: Sized {
    /// Kind stored by this record.
    const KIND: EntityKind;

    /// Surrogate id (`0` when not yet inserted).
    fn id(&self) -> i64;

    /// Replace the surrogate id.
    fn set_id(&mut self, id: i64);

    /// Column values in `KIND.columns()` order.
    fn values(&self) -> Vec<SqlValue>;

    /// Decode a row laid out as `id` followed by `KIND.columns()`.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Foreign keys as `(column, parent id)` pairs.
    fn references(&self) -> Vec<(&'static str, i64)> {
        Vec::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub id: i64,
    pub name: String,
}

impl Building {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }
}

impl Record for Building {
    const KIND: EntityKind = EntityKind::Building;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![SqlValue::Text(self.name.clone())]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub building_id: i64,
    pub name: String,
}

impl Room {
    pub fn new(building_id: i64, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            building_id,
            name: name.into(),
        }
    }
}

impl Record for Room {
    const KIND: EntityKind = EntityKind::Room;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Integer(self.building_id),
            SqlValue::Text(self.name.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            building_id: row.get(1)?,
            name: row.get(2)?,
        })
    }

    fn references(&self) -> Vec<(&'static str, i64)> {
        vec![("building_id", self.building_id)]
    }
}

/// A radio or wired network technology (WiFi, LoRaWAN, Sigfox, NB-IoT, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkType {
    pub id: i64,
    pub technology: String,
    pub bit_rate: i64,
}

impl NetworkType {
    pub fn new(technology: impl Into<String>, bit_rate: i64) -> Self {
        Self {
            id: 0,
            technology: technology.into(),
            bit_rate,
        }
    }
}

impl Record for NetworkType {
    const KIND: EntityKind = EntityKind::NetworkType;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.technology.clone()),
            SqlValue::Integer(self.bit_rate),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            technology: row.get(1)?,
            bit_rate: row.get(2)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub id: i64,
    pub ip_address: String,
}

impl Server {
    pub fn new(ip_address: impl Into<String>) -> Self {
        Self {
            id: 0,
            ip_address: ip_address.into(),
        }
    }
}

impl Record for Server {
    const KIND: EntityKind = EntityKind::Server;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![SqlValue::Text(self.ip_address.clone())]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            ip_address: row.get(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gateway {
    pub id: i64,
    pub room_id: i64,
    pub server_id: i64,
    pub name: String,
}

impl Gateway {
    pub fn new(room_id: i64, server_id: i64, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            room_id,
            server_id,
            name: name.into(),
        }
    }
}

impl Record for Gateway {
    const KIND: EntityKind = EntityKind::Gateway;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Integer(self.room_id),
            SqlValue::Integer(self.server_id),
            SqlValue::Text(self.name.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            room_id: row.get(1)?,
            server_id: row.get(2)?,
            name: row.get(3)?,
        })
    }

    fn references(&self) -> Vec<(&'static str, i64)> {
        vec![("room_id", self.room_id), ("server_id", self.server_id)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorType {
    pub id: i64,
    pub name: String,
    pub unit: String,
}

impl SensorType {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            unit: unit.into(),
        }
    }
}

impl Record for SensorType {
    const KIND: EntityKind = EntityKind::SensorType;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.name.clone()),
            SqlValue::Text(self.unit.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            unit: row.get(2)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: i64,
    pub room_id: i64,
    pub gateway_id: i64,
    pub type_id: i64,
    pub network_id: i64,
    pub name: String,
}

impl Sensor {
    pub fn new(
        room_id: i64,
        gateway_id: i64,
        type_id: i64,
        network_id: i64,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            room_id,
            gateway_id,
            type_id,
            network_id,
            name: name.into(),
        }
    }
}

impl Record for Sensor {
    const KIND: EntityKind = EntityKind::Sensor;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Integer(self.room_id),
            SqlValue::Integer(self.gateway_id),
            SqlValue::Integer(self.type_id),
            SqlValue::Integer(self.network_id),
            SqlValue::Text(self.name.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            room_id: row.get(1)?,
            gateway_id: row.get(2)?,
            type_id: row.get(3)?,
            network_id: row.get(4)?,
            name: row.get(5)?,
        })
    }

    fn references(&self) -> Vec<(&'static str, i64)> {
        vec![
            ("room_id", self.room_id),
            ("gateway_id", self.gateway_id),
            ("type_id", self.type_id),
            ("network_id", self.network_id),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub name: String,
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }
}

impl Record for Application {
    const KIND: EntityKind = EntityKind::Application;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![SqlValue::Text(self.name.clone())]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

/// Link between an application and a server it talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub application_id: i64,
    pub server_id: i64,
}

impl Connection {
    pub fn new(application_id: i64, server_id: i64) -> Self {
        Self {
            application_id,
            server_id,
        }
    }
}

/// An `(id, label)` pair offered when the user picks a parent row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: i64,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_layout<R: Record>(record: &R) {
        assert_eq!(record.values().len(), R::KIND.columns().len());
        for (field, _) in record.references() {
            assert!(R::KIND.columns().contains(&field));
        }
    }

    #[test]
    fn test_values_match_columns() {
        check_layout(&Building::new("B1"));
        check_layout(&Room::new(1, "R1"));
        check_layout(&NetworkType::new("LoRaWAN", 50));
        check_layout(&Server::new("10.0.0.1"));
        check_layout(&Gateway::new(1, 1, "G1"));
        check_layout(&SensorType::new("Temperature", "C"));
        check_layout(&Sensor::new(1, 1, 1, 1, "S1"));
        check_layout(&Application::new("Dashboard"));
    }

    #[test]
    fn test_new_records_are_unassigned() {
        assert_eq!(Sensor::new(1, 2, 3, 4, "S1").id(), 0);
        let mut room = Room::new(7, "R1");
        room.set_id(3);
        assert_eq!(room.id, 3);
        assert_eq!(room.references(), vec![("building_id", 7)]);
    }
}
