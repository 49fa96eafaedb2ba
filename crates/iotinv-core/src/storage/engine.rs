//! SQLite-backed entity store.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::config::StoreConfig;
use super::{ids, schema};
use crate::catalog::{relation_for, relations, EntityKind};
use crate::error::{Error, Result};
use crate::model::{self, Choice, Record};

/// A row whose foreign key points at a missing parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingRef {
    /// Kind of the offending row.
    pub entity: EntityKind,
    /// Row key (`id`, or `application_id/server_id` for connections).
    pub row: String,
    /// Foreign key column.
    pub field: &'static str,
    /// Kind of the missing parent.
    pub parent: EntityKind,
    /// Id the row points at.
    pub parent_id: i64,
}

/// Typed access to the inventory tables.
pub struct Store {
    conn: Connection,
    config: StoreConfig,
}

impl Store {
    /// Open the store described by `config`.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let conn = match config.path() {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };

        if config.create_schema {
            schema::install(&conn, config.with_connections)?;
        }

        info!(
            path = ?config.path(),
            create_schema = config.create_schema,
            raw_sql = config.allow_raw_sql,
            "inventory store opened"
        );

        Ok(Self { conn, config })
    }

    /// Open a fresh in-memory store with every table installed.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(StoreConfig::in_memory())
    }

    /// Configuration the store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Next surrogate id for `kind`.
    pub fn next_id(&self, kind: EntityKind) -> Result<i64> {
        ids::next_id(&self.conn, kind)
    }

    /// Insert a record, assigning its id.
    ///
    /// Every foreign key must point at an existing parent, otherwise nothing
    /// is written and [`Error::MissingParent`] is returned.
    pub fn insert<R: Record>(&self, mut record: R) -> Result<R> {
        self.check_references(&record)?;

        let tx = self.conn.unchecked_transaction()?;
        let id = ids::next_id(&tx, R::KIND)?;
        record.set_id(id);

        let columns = R::KIND.columns();
        let placeholders: Vec<String> = (1..=columns.len() + 1)
            .map(|i| format!("?{}", i))
            .collect();
        let sql = format!(
            "INSERT INTO {} (id, {}) VALUES ({})",
            R::KIND.table(),
            columns.join(", "),
            placeholders.join(", ")
        );
        let values = std::iter::once(SqlValue::Integer(id)).chain(record.values());
        tx.execute(&sql, params_from_iter(values))?;
        tx.commit()?;

        debug!(entity = %R::KIND, id, "inserted");
        Ok(record)
    }

    /// Rewrite every column of an existing record.
    pub fn update<R: Record>(&self, record: &R) -> Result<()> {
        let id = record.id();
        if !self.exists(R::KIND, id)? {
            return Err(Error::NotFound {
                entity: R::KIND,
                id,
            });
        }
        self.check_references(record)?;

        let columns = R::KIND.columns();
        let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{} = ?{}", col, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            R::KIND.table(),
            assignments.join(", "),
            columns.len() + 1
        );
        let values = record
            .values()
            .into_iter()
            .chain(std::iter::once(SqlValue::Integer(id)));
        self.conn.execute(&sql, params_from_iter(values))?;

        debug!(entity = %R::KIND, id, "updated");
        Ok(())
    }

    /// Fetch one record by id.
    pub fn get<R: Record>(&self, id: i64) -> Result<Option<R>> {
        let sql = format!(
            "SELECT id, {} FROM {} WHERE id = ?1",
            R::KIND.columns().join(", "),
            R::KIND.table()
        );
        let record = self.conn.query_row(&sql, [id], R::from_row).optional()?;
        Ok(record)
    }

    /// Fetch every record of a kind, ordered by id.
    pub fn list<R: Record>(&self) -> Result<Vec<R>> {
        let sql = format!(
            "SELECT id, {} FROM {} ORDER BY id",
            R::KIND.columns().join(", "),
            R::KIND.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], R::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Check whether a keyed row exists.
    pub fn exists(&self, kind: EntityKind, id: i64) -> Result<bool> {
        if !kind.is_keyed() {
            return Err(Error::NotKeyed(kind));
        }
        let sql = format!("SELECT 1 FROM {} WHERE id = ?1", kind.table());
        let found = self.conn.query_row(&sql, [id], |_| Ok(())).optional()?;
        Ok(found.is_some())
    }

    /// Number of rows of a kind. An absent connection table counts as empty.
    pub fn count(&self, kind: EntityKind) -> Result<usize> {
        if kind == EntityKind::Connection && !self.has_connections()? {
            return Ok(0);
        }
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// `(id, label)` pairs for every row of a kind, ordered by label.
    pub fn choices(&self, kind: EntityKind) -> Result<Vec<Choice>> {
        let label = kind.label_expr().ok_or(Error::NotKeyed(kind))?;
        let sql = format!(
            "SELECT id, {label} AS label FROM {} ORDER BY label, id",
            kind.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let choices = stmt
            .query_map([], |row| {
                Ok(Choice {
                    id: row.get(0)?,
                    label: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(choices)
    }

    /// Whether the optional `connection` table exists.
    pub fn has_connections(&self) -> Result<bool> {
        Ok(schema::table_exists(&self.conn, EntityKind::Connection.table())?)
    }

    /// Link an application to a server.
    ///
    /// Returns `false` when the pair was already linked.
    pub fn link(&self, application_id: i64, server_id: i64) -> Result<bool> {
        self.require_connections()?;
        for (parent, id) in [
            (EntityKind::Application, application_id),
            (EntityKind::Server, server_id),
        ] {
            if !self.exists(parent, id)? {
                return Err(Error::MissingParent {
                    entity: EntityKind::Connection,
                    parent,
                    id,
                });
            }
        }

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO connection (application_id, server_id) VALUES (?1, ?2)",
            params![application_id, server_id],
        )?;
        debug!(application_id, server_id, inserted, "linked");
        Ok(inserted > 0)
    }

    /// Remove a link. Returns `false` when it did not exist.
    pub fn unlink(&self, application_id: i64, server_id: i64) -> Result<bool> {
        self.require_connections()?;
        let removed = self.conn.execute(
            "DELETE FROM connection WHERE application_id = ?1 AND server_id = ?2",
            params![application_id, server_id],
        )?;
        Ok(removed > 0)
    }

    /// Every application ↔ server link. Empty when the table is absent.
    pub fn connections(&self) -> Result<Vec<model::Connection>> {
        if !self.has_connections()? {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            "SELECT application_id, server_id FROM connection ORDER BY application_id, server_id",
        )?;
        let links = stmt
            .query_map([], |row| {
                Ok(model::Connection::new(row.get(0)?, row.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(links)
    }

    /// List every row whose foreign key points at a missing parent.
    ///
    /// Empty on a consistent store.
    pub fn dangling_references(&self) -> Result<Vec<DanglingRef>> {
        let has_connections = self.has_connections()?;
        let mut dangling = Vec::new();

        for rel in relations() {
            if rel.from_entity == EntityKind::Connection && !has_connections {
                continue;
            }

            let row_key = if rel.from_entity.is_keyed() {
                "CAST(c.id AS TEXT)"
            } else {
                "c.application_id || '/' || c.server_id"
            };
            let sql = format!(
                "SELECT {row_key}, c.{field} FROM {child} c \
                 LEFT JOIN {parent} p ON p.id = c.{field} \
                 WHERE p.id IS NULL",
                field = rel.from_field,
                child = rel.from_entity.table(),
                parent = rel.to_entity.table(),
            );

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| {
                Ok(DanglingRef {
                    entity: rel.from_entity,
                    row: row.get(0)?,
                    field: rel.from_field,
                    parent: rel.to_entity,
                    parent_id: row.get(1)?,
                })
            })?;
            for entry in rows {
                dangling.push(entry?);
            }
        }

        if !dangling.is_empty() {
            warn!(count = dangling.len(), "dangling references found");
        }
        Ok(dangling)
    }

    fn check_references<R: Record>(&self, record: &R) -> Result<()> {
        for (field, parent_id) in record.references() {
            let rel = relation_for(R::KIND, field).ok_or_else(|| {
                Error::Config(format!("{} has no relation on '{}'", R::KIND, field))
            })?;
            if !self.exists(rel.to_entity, parent_id)? {
                return Err(Error::MissingParent {
                    entity: R::KIND,
                    parent: rel.to_entity,
                    id: parent_id,
                });
            }
        }
        Ok(())
    }

    fn require_connections(&self) -> Result<()> {
        if self.has_connections()? {
            Ok(())
        } else {
            Err(Error::Config("the connection table does not exist".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Building, Gateway, NetworkType, Room, Sensor, SensorType, Server};

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let store = Store::open_in_memory().unwrap();
        let a = store.insert(Building::new("A")).unwrap();
        let b = store.insert(Building::new("B")).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(store.count(EntityKind::Building).unwrap(), 2);
        assert_eq!(store.list::<Building>().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_insert_rejects_missing_parent() {
        let store = Store::open_in_memory().unwrap();
        let err = store.insert(Room::new(42, "R1")).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingParent {
                entity: EntityKind::Room,
                parent: EntityKind::Building,
                id: 42
            }
        ));
        assert_eq!(store.count(EntityKind::Room).unwrap(), 0);
    }

    #[test]
    fn test_get_and_update() {
        let store = Store::open_in_memory().unwrap();
        let lora = store.insert(NetworkType::new("LoRaWAN", 50)).unwrap();

        let mut fetched: NetworkType = store.get(lora.id).unwrap().unwrap();
        assert_eq!(fetched, lora);

        fetched.bit_rate = 27;
        store.update(&fetched).unwrap();
        let again: NetworkType = store.get(lora.id).unwrap().unwrap();
        assert_eq!(again.bit_rate, 27);
        assert_eq!(again.technology, "LoRaWAN");
    }

    #[test]
    fn test_update_missing_row() {
        let store = Store::open_in_memory().unwrap();
        let mut ghost = Server::new("10.0.0.9");
        ghost.id = 5;
        assert!(matches!(
            store.update(&ghost),
            Err(Error::NotFound {
                entity: EntityKind::Server,
                id: 5
            })
        ));
    }

    #[test]
    fn test_update_rebinds_to_existing_parent_only() {
        let store = Store::open_in_memory().unwrap();
        let b1 = store.insert(Building::new("B1")).unwrap();
        let b2 = store.insert(Building::new("B2")).unwrap();
        let mut room = store.insert(Room::new(b1.id, "R1")).unwrap();

        room.building_id = b2.id;
        store.update(&room).unwrap();
        assert_eq!(store.get::<Room>(room.id).unwrap().unwrap().building_id, b2.id);

        room.building_id = 99;
        assert!(store.update(&room).is_err());
        assert_eq!(store.get::<Room>(room.id).unwrap().unwrap().building_id, b2.id);
    }

    #[test]
    fn test_choices_are_labelled_and_sorted() {
        let store = Store::open_in_memory().unwrap();
        store.insert(SensorType::new("Temperature", "C")).unwrap();
        store.insert(SensorType::new("Humidity", "%")).unwrap();

        let choices = store.choices(EntityKind::SensorType).unwrap();
        let labels: Vec<_> = choices.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Humidity (%)", "Temperature (C)"]);
        assert_eq!(choices[0].id, 2);
    }

    #[test]
    fn test_link_and_unlink() {
        let store = Store::open_in_memory().unwrap();
        let app = store.insert(crate::model::Application::new("Dashboard")).unwrap();
        let srv = store.insert(Server::new("10.0.0.1")).unwrap();

        assert!(store.link(app.id, srv.id).unwrap());
        assert!(!store.link(app.id, srv.id).unwrap());
        assert_eq!(store.connections().unwrap().len(), 1);

        assert!(store.unlink(app.id, srv.id).unwrap());
        assert!(!store.unlink(app.id, srv.id).unwrap());
        assert!(store.link(app.id, 77).is_err());
    }

    #[test]
    fn test_connections_absent() {
        let store = Store::open(StoreConfig::in_memory().with_connections(false)).unwrap();
        assert!(!store.has_connections().unwrap());
        assert!(store.connections().unwrap().is_empty());
        assert_eq!(store.count(EntityKind::Connection).unwrap(), 0);
        assert!(matches!(store.link(1, 1), Err(Error::Config(_))));
    }

    #[test]
    fn test_dangling_references() {
        let store = Store::open_in_memory().unwrap();
        let b = store.insert(Building::new("B1")).unwrap();
        let r = store.insert(Room::new(b.id, "R1")).unwrap();
        let s = store.insert(Server::new("10.0.0.1")).unwrap();
        let g = store.insert(Gateway::new(r.id, s.id, "G1")).unwrap();
        let t = store.insert(SensorType::new("Temperature", "C")).unwrap();
        let n = store.insert(NetworkType::new("WiFi", 100)).unwrap();
        store.insert(Sensor::new(r.id, g.id, t.id, n.id, "S1")).unwrap();
        assert!(store.dangling_references().unwrap().is_empty());

        // Bypass the cascade on purpose.
        store
            .conn()
            .execute("DELETE FROM gateway WHERE id = ?1", [g.id])
            .unwrap();
        let dangling = store.dangling_references().unwrap();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].entity, EntityKind::Sensor);
        assert_eq!(dangling[0].field, "gateway_id");
        assert_eq!(dangling[0].parent_id, g.id);
    }
}
