//! Entity kinds and their table layout.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The nine kinds of rows stored in the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Building,
    Room,
    NetworkType,
    Server,
    Gateway,
    SensorType,
    Sensor,
    Application,
    /// Application ↔ Server link. Keyed by its two references only.
    Connection,
}

impl EntityKind {
    /// Every kind, parents before children.
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Building,
        EntityKind::Room,
        EntityKind::NetworkType,
        EntityKind::Server,
        EntityKind::Gateway,
        EntityKind::SensorType,
        EntityKind::Sensor,
        EntityKind::Application,
        EntityKind::Connection,
    ];

    /// Kinds that carry a surrogate `id` column, in menu order.
    pub const KEYED: [EntityKind; 8] = [
        EntityKind::Building,
        EntityKind::Room,
        EntityKind::Sensor,
        EntityKind::Gateway,
        EntityKind::Server,
        EntityKind::Application,
        EntityKind::SensorType,
        EntityKind::NetworkType,
    ];

    /// SQL table name.
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Building => "building",
            EntityKind::Room => "room",
            EntityKind::NetworkType => "network_type",
            EntityKind::Server => "server",
            EntityKind::Gateway => "gateway",
            EntityKind::SensorType => "sensor_type",
            EntityKind::Sensor => "sensor",
            EntityKind::Application => "application",
            EntityKind::Connection => "connection",
        }
    }

    /// Whether rows of this kind have a surrogate `id`.
    pub fn is_keyed(self) -> bool {
        self != EntityKind::Connection
    }

    /// Stored columns other than `id`, in insert order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            EntityKind::Building => &["name"],
            EntityKind::Room => &["building_id", "name"],
            EntityKind::NetworkType => &["technology", "bit_rate"],
            EntityKind::Server => &["ip_address"],
            EntityKind::Gateway => &["room_id", "server_id", "name"],
            EntityKind::SensorType => &["name", "unit"],
            EntityKind::Sensor => &["room_id", "gateway_id", "type_id", "network_id", "name"],
            EntityKind::Application => &["name"],
            EntityKind::Connection => &["application_id", "server_id"],
        }
    }

    /// SQL expression used to label a row when offering it as a choice.
    pub fn label_expr(self) -> Option<&'static str> {
        match self {
            EntityKind::Building
            | EntityKind::Room
            | EntityKind::Gateway
            | EntityKind::Sensor
            | EntityKind::Application => Some("name"),
            EntityKind::NetworkType => Some("technology"),
            EntityKind::Server => Some("ip_address"),
            EntityKind::SensorType => Some("name || ' (' || unit || ')'"),
            EntityKind::Connection => None,
        }
    }

    /// Human readable name.
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Building => "building",
            EntityKind::Room => "room",
            EntityKind::NetworkType => "network type",
            EntityKind::Server => "server",
            EntityKind::Gateway => "gateway",
            EntityKind::SensorType => "sensor type",
            EntityKind::Sensor => "sensor",
            EntityKind::Application => "application",
            EntityKind::Connection => "connection",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.table() == normalized)
            .ok_or_else(|| format!("unknown entity kind '{}'", s))
    }
}
