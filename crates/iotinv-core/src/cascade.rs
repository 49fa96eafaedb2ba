//! Cascade executor for application-managed referential integrity.
//!
//! The store declares no foreign keys, so deleting a parent means deleting
//! its dependents first. Each entity kind has a fixed plan of steps:
//!
//! - `Sweep`: delete every leaf row (sensor or connection) whose column
//!   points at the target.
//! - `Descend`: enumerate the child rows pointing at the target and run the
//!   child's own plan for each one, which ends by deleting that child.
//!
//! After its steps the target row itself is removed. The whole cascade runs
//! in one transaction, so a failing step leaves no partial removal behind.

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::EntityKind;
use crate::error::{CascadeError, Error, Result};
use crate::storage::Store;

/// One step of a delete plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStep {
    /// Delete leaf rows of `child` whose `column` equals the target id.
    Sweep {
        child: EntityKind,
        column: &'static str,
    },
    /// Run the plan of every `child` row whose `column` equals the target id.
    Descend {
        child: EntityKind,
        column: &'static str,
    },
}

impl CascadeStep {
    /// Kind removed by this step.
    pub fn child(&self) -> EntityKind {
        match *self {
            CascadeStep::Sweep { child, .. } | CascadeStep::Descend { child, .. } => child,
        }
    }

    /// Foreign key column followed by this step.
    pub fn column(&self) -> &'static str {
        match *self {
            CascadeStep::Sweep { column, .. } | CascadeStep::Descend { column, .. } => column,
        }
    }
}

const fn sweep(child: EntityKind, column: &'static str) -> CascadeStep {
    CascadeStep::Sweep { child, column }
}

const fn descend(child: EntityKind, column: &'static str) -> CascadeStep {
    CascadeStep::Descend { child, column }
}

const GATEWAY_PLAN: [CascadeStep; 1] = [sweep(EntityKind::Sensor, "gateway_id")];
const ROOM_PLAN: [CascadeStep; 2] = [
    descend(EntityKind::Gateway, "room_id"),
    // A sensor may sit in this room behind a gateway of another room.
    sweep(EntityKind::Sensor, "room_id"),
];
const BUILDING_PLAN: [CascadeStep; 1] = [descend(EntityKind::Room, "building_id")];
const SERVER_PLAN: [CascadeStep; 2] = [
    sweep(EntityKind::Connection, "server_id"),
    descend(EntityKind::Gateway, "server_id"),
];
const APPLICATION_PLAN: [CascadeStep; 1] = [sweep(EntityKind::Connection, "application_id")];
const SENSOR_TYPE_PLAN: [CascadeStep; 1] = [sweep(EntityKind::Sensor, "type_id")];
const NETWORK_TYPE_PLAN: [CascadeStep; 1] = [sweep(EntityKind::Sensor, "network_id")];

/// Ordered dependent deletions for `kind`, run before the row itself goes.
pub fn plan(kind: EntityKind) -> &'static [CascadeStep] {
    match kind {
        EntityKind::Building => &BUILDING_PLAN,
        EntityKind::Room => &ROOM_PLAN,
        EntityKind::Gateway => &GATEWAY_PLAN,
        EntityKind::Server => &SERVER_PLAN,
        EntityKind::Application => &APPLICATION_PLAN,
        EntityKind::SensorType => &SENSOR_TYPE_PLAN,
        EntityKind::NetworkType => &NETWORK_TYPE_PLAN,
        EntityKind::Sensor | EntityKind::Connection => &[],
    }
}

/// Result of a cascade delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeResult {
    /// Kind that was asked for.
    pub entity: EntityKind,
    /// Id that was asked for.
    pub id: i64,
    /// Whether the target existed. `false` means nothing was deleted.
    pub found: bool,
    /// Every keyed row removed, dependents first, the target last.
    pub deleted_entities: Vec<(EntityKind, i64)>,
    /// Connection rows removed.
    pub deleted_connections: usize,
}

impl CascadeResult {
    fn new(entity: EntityKind, id: i64) -> Self {
        Self {
            entity,
            id,
            found: false,
            deleted_entities: Vec::new(),
            deleted_connections: 0,
        }
    }

    /// Total number of rows removed, target included.
    pub fn affected_count(&self) -> usize {
        self.deleted_entities.len() + self.deleted_connections
    }

    /// Number of rows removed besides the target.
    pub fn dependent_count(&self) -> usize {
        self.affected_count().saturating_sub(usize::from(self.found))
    }

    /// Whether any dependent row was removed.
    pub fn has_dependents(&self) -> bool {
        self.dependent_count() > 0
    }

    /// Number of removed rows of one kind.
    pub fn count_of(&self, kind: EntityKind) -> usize {
        if kind == EntityKind::Connection {
            return self.deleted_connections;
        }
        self.deleted_entities.iter().filter(|(k, _)| *k == kind).count()
    }

    /// Whether `(kind, id)` was removed.
    pub fn contains(&self, kind: EntityKind, id: i64) -> bool {
        self.deleted_entities.contains(&(kind, id))
    }
}

/// Executes delete plans against a store.
pub struct CascadeExecutor<'a> {
    store: &'a Store,
}

impl<'a> CascadeExecutor<'a> {
    /// Create a new cascade executor.
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Delete `(kind, id)` and everything that depends on it.
    ///
    /// A missing target is not an error: the result comes back with
    /// `found == false` and nothing is written.
    pub fn process_delete(&self, kind: EntityKind, id: i64) -> Result<CascadeResult> {
        if !kind.is_keyed() {
            return Err(Error::NotKeyed(kind));
        }

        let mut result = CascadeResult::new(kind, id);
        if !self.store.exists(kind, id)? {
            info!(entity = %kind, id, "nothing to delete");
            return Ok(result);
        }
        result.found = true;

        let has_connections = self.store.has_connections()?;
        let tx = self.store.conn().unchecked_transaction()?;
        self.delete_recursive(&tx, kind, id, has_connections, &mut result)?;
        tx.commit()?;

        info!(
            entity = %kind,
            id,
            affected = result.affected_count(),
            dependents = result.dependent_count(),
            "cascade delete complete"
        );
        Ok(result)
    }

    fn delete_recursive(
        &self,
        conn: &Connection,
        kind: EntityKind,
        id: i64,
        has_connections: bool,
        result: &mut CascadeResult,
    ) -> Result<()> {
        for (step_no, step) in plan(kind).iter().enumerate() {
            let child = step.child();
            let column = step.column();
            let step_failed = |source| CascadeError::StepFailed {
                entity: kind,
                id,
                step: step_no,
                child,
                source,
            };

            match *step {
                CascadeStep::Sweep { .. } if child == EntityKind::Connection => {
                    if !has_connections {
                        continue;
                    }
                    let removed = delete_where(conn, child, column, id).map_err(step_failed)?;
                    result.deleted_connections += removed;
                    debug!(entity = %kind, id, step = step_no, %child, removed, "swept");
                }
                CascadeStep::Sweep { .. } => {
                    let ids = referencing_ids(conn, child, column, id).map_err(step_failed)?;
                    delete_where(conn, child, column, id).map_err(step_failed)?;
                    debug!(entity = %kind, id, step = step_no, %child, removed = ids.len(), "swept");
                    result
                        .deleted_entities
                        .extend(ids.into_iter().map(|child_id| (child, child_id)));
                }
                CascadeStep::Descend { .. } => {
                    let ids = referencing_ids(conn, child, column, id).map_err(step_failed)?;
                    debug!(entity = %kind, id, step = step_no, %child, count = ids.len(), "descending");
                    for child_id in ids {
                        self.delete_recursive(conn, child, child_id, has_connections, result)?;
                    }
                }
            }
        }

        let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table());
        conn.execute(&sql, [id])
            .map_err(|source| CascadeError::TargetFailed {
                entity: kind,
                id,
                source,
            })?;
        result.deleted_entities.push((kind, id));
        Ok(())
    }
}

impl Store {
    /// Cascade-delete `(kind, id)`. See [`CascadeExecutor::process_delete`].
    pub fn delete(&self, kind: EntityKind, id: i64) -> Result<CascadeResult> {
        CascadeExecutor::new(self).process_delete(kind, id)
    }
}

fn referencing_ids(
    conn: &Connection,
    child: EntityKind,
    column: &str,
    target: i64,
) -> rusqlite::Result<Vec<i64>> {
    let sql = format!(
        "SELECT id FROM {} WHERE {} = ?1 ORDER BY id",
        child.table(),
        column
    );
    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map([target], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}

fn delete_where(
    conn: &Connection,
    child: EntityKind,
    column: &str,
    target: i64,
) -> rusqlite::Result<usize> {
    let sql = format!("DELETE FROM {} WHERE {} = ?1", child.table(), column);
    conn.execute(&sql, [target])
}
