//! Foreign-key relations between entity kinds.
//!
//! The store declares no `REFERENCES` clauses; this table is the only
//! description of who points at whom. Inserts and updates check it, the
//! integrity audit walks it, and the cascade plans are verified against it.

use super::entity::EntityKind;

/// A required reference from a child column to a parent's `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDef {
    /// Relation name (unique within the catalog).
    pub name: &'static str,
    /// Child entity holding the foreign key.
    pub from_entity: EntityKind,
    /// Foreign key column on the child.
    pub from_field: &'static str,
    /// Parent entity.
    pub to_entity: EntityKind,
}

impl RelationDef {
    const fn new(
        name: &'static str,
        from_entity: EntityKind,
        from_field: &'static str,
        to_entity: EntityKind,
    ) -> Self {
        Self {
            name,
            from_entity,
            from_field,
            to_entity,
        }
    }
}

static RELATIONS: [RelationDef; 9] = [
    RelationDef::new("room_building", EntityKind::Room, "building_id", EntityKind::Building),
    RelationDef::new("gateway_room", EntityKind::Gateway, "room_id", EntityKind::Room),
    RelationDef::new("gateway_server", EntityKind::Gateway, "server_id", EntityKind::Server),
    RelationDef::new("sensor_room", EntityKind::Sensor, "room_id", EntityKind::Room),
    RelationDef::new("sensor_gateway", EntityKind::Sensor, "gateway_id", EntityKind::Gateway),
    RelationDef::new("sensor_type", EntityKind::Sensor, "type_id", EntityKind::SensorType),
    RelationDef::new("sensor_network", EntityKind::Sensor, "network_id", EntityKind::NetworkType),
    RelationDef::new(
        "connection_application",
        EntityKind::Connection,
        "application_id",
        EntityKind::Application,
    ),
    RelationDef::new("connection_server", EntityKind::Connection, "server_id", EntityKind::Server),
];

/// Every relation in the inventory.
pub fn relations() -> &'static [RelationDef] {
    &RELATIONS
}

/// Relations whose child is `kind` (the references `kind` must satisfy).
pub fn relations_from(kind: EntityKind) -> impl Iterator<Item = &'static RelationDef> {
    RELATIONS.iter().filter(move |r| r.from_entity == kind)
}

/// Relations whose parent is `kind` (the rows that depend on `kind`).
pub fn relations_to(kind: EntityKind) -> impl Iterator<Item = &'static RelationDef> {
    RELATIONS.iter().filter(move |r| r.to_entity == kind)
}

/// Look up the relation carried by `field` on `kind`.
pub fn relation_for(kind: EntityKind, field: &str) -> Option<&'static RelationDef> {
    relations_from(kind).find(|r| r.from_field == field)
}
