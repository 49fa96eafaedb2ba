//! Joined, read-only display queries.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Result;
use crate::result::RowSet;
use crate::storage::Store;

/// A tabular display view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Buildings,
    Rooms,
    Sensors,
    Gateways,
    Servers,
    Applications,
    SensorTypes,
    NetworkTypes,
    Connections,
}

impl View {
    /// Every view, in menu order.
    pub const ALL: [View; 9] = [
        View::Buildings,
        View::Rooms,
        View::Sensors,
        View::Gateways,
        View::Servers,
        View::Applications,
        View::SensorTypes,
        View::NetworkTypes,
        View::Connections,
    ];

    pub fn name(self) -> &'static str {
        match self {
            View::Buildings => "buildings",
            View::Rooms => "rooms",
            View::Sensors => "sensors",
            View::Gateways => "gateways",
            View::Servers => "servers",
            View::Applications => "applications",
            View::SensorTypes => "types",
            View::NetworkTypes => "networks",
            View::Connections => "connections",
        }
    }

    fn sql(self) -> &'static str {
        match self {
            View::Buildings => "SELECT name AS \"Building\" FROM building ORDER BY name",
            View::Rooms => {
                "SELECT r.name AS \"Room\", b.name AS \"Building\"
                 FROM room r
                 JOIN building b ON b.id = r.building_id
                 ORDER BY b.name, r.name"
            }
            View::Sensors => {
                "SELECT c.name AS \"Sensor\",
                        t.name AS \"Type\",
                        t.unit AS \"Unit\",
                        r.name AS \"Room\",
                        b.name AS \"Building\",
                        n.technology AS \"Network\",
                        g.name AS \"Gateway\",
                        sv.ip_address AS \"Server\"
                 FROM sensor c
                 JOIN sensor_type t ON t.id = c.type_id
                 JOIN room r ON r.id = c.room_id
                 JOIN building b ON b.id = r.building_id
                 JOIN network_type n ON n.id = c.network_id
                 LEFT JOIN gateway g ON g.id = c.gateway_id
                 LEFT JOIN server sv ON sv.id = g.server_id
                 ORDER BY b.name, r.name, c.name"
            }
            View::Gateways => {
                "SELECT g.name AS \"Gateway\",
                        r.name AS \"Room\",
                        b.name AS \"Building\",
                        sv.ip_address AS \"Server\"
                 FROM gateway g
                 JOIN room r ON r.id = g.room_id
                 JOIN building b ON b.id = r.building_id
                 LEFT JOIN server sv ON sv.id = g.server_id
                 ORDER BY b.name, r.name, g.name"
            }
            View::Servers => {
                "SELECT sv.ip_address AS \"Server\",
                        (SELECT COUNT(*) FROM gateway g WHERE g.server_id = sv.id) AS \"Gateways\"
                 FROM server sv
                 ORDER BY sv.ip_address"
            }
            View::Applications => "SELECT name AS \"Application\" FROM application ORDER BY name",
            View::SensorTypes => {
                "SELECT name AS \"Type\", unit AS \"Unit\" FROM sensor_type ORDER BY name"
            }
            View::NetworkTypes => {
                "SELECT technology AS \"Network\", bit_rate AS \"Bit rate\"
                 FROM network_type
                 ORDER BY technology"
            }
            View::Connections => {
                "SELECT a.name AS \"Application\", sv.ip_address AS \"Server\"
                 FROM connection x
                 JOIN application a ON a.id = x.application_id
                 JOIN server sv ON sv.id = x.server_id
                 ORDER BY a.name, sv.ip_address"
            }
        }
    }

    /// Run the view. The connections view is empty without its table.
    pub fn query(self, store: &Store) -> Result<RowSet> {
        if self == View::Connections && !store.has_connections()? {
            return Ok(RowSet::new(vec![
                "Application".to_string(),
                "Server".to_string(),
            ]));
        }

        let mut stmt = store.conn().prepare(self.sql())?;
        Ok(RowSet::collect(&mut stmt, [])?)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        View::ALL
            .into_iter()
            .find(|v| v.name() == wanted)
            .ok_or_else(|| format!("unknown view '{}'", s))
    }
}
