//! Inventory catalog: entity kinds and the relation graph between them.

mod entity;
mod relation;

pub use entity::EntityKind;
pub use relation::{relation_for, relations, relations_from, relations_to, RelationDef};
