//! Nested topology views rebuilt from flat join rows.
//!
//! Both views are a single fold over rows sorted by their grouping keys. The
//! fold carries the current group ids and emits a header whenever one of
//! them changes, so each server, gateway, and application appears once no
//! matter how many sensor rows sit under it.

use std::fmt;

use rusqlite::Row;
use serde::Serialize;

use crate::error::Result;
use crate::storage::Store;

/// An `(id, name)` cell from a joined row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Named {
    pub id: i64,
    pub name: String,
}

impl Named {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One row of `server ⟕ gateway ⟕ sensor ⟕ network_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfraRow {
    pub server: Named,
    pub gateway: Option<Named>,
    pub sensor: Option<Named>,
    pub network: Option<String>,
}

/// One row of `application ⟕ connection ⟕ server ⟕ gateway ⟕ sensor ⟕ sensor_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRow {
    pub application: Named,
    pub server: Option<Named>,
    pub sensor: Option<Named>,
    pub sensor_type: Option<String>,
    pub unit: Option<String>,
}

/// A rendered line of a topology view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyLine {
    Server { ip_address: String },
    Gateway { name: String },
    Sensor { name: String, network: String },
    /// The server above has no gateway at all.
    NoGateway,
    Application { name: String },
    LinkedServer { ip_address: String },
    Reading { sensor: String, sensor_type: String, unit: String },
    /// No application exists.
    NoApplication,
}

impl TopologyLine {
    /// Nesting depth, used for indentation.
    pub fn depth(&self) -> usize {
        match self {
            TopologyLine::Server { .. }
            | TopologyLine::Application { .. }
            | TopologyLine::NoApplication => 0,
            TopologyLine::Gateway { .. }
            | TopologyLine::NoGateway
            | TopologyLine::LinkedServer { .. } => 1,
            TopologyLine::Sensor { .. } | TopologyLine::Reading { .. } => 2,
        }
    }
}

impl fmt::Display for TopologyLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", "  ".repeat(self.depth()))?;
        match self {
            TopologyLine::Server { ip_address } | TopologyLine::LinkedServer { ip_address } => {
                write!(f, "Server : {}", ip_address)
            }
            TopologyLine::Gateway { name } => write!(f, "Gateway : {}", name),
            TopologyLine::Sensor { name, network } => write!(f, "Sensor : {} ({})", name, network),
            TopologyLine::NoGateway => f.write_str("(no gateway)"),
            TopologyLine::Application { name } => write!(f, "Application : {}", name),
            TopologyLine::Reading {
                sensor,
                sensor_type,
                unit,
            } => write!(f, "Sensor : {} / {} ({})", sensor, sensor_type, unit),
            TopologyLine::NoApplication => f.write_str("(no linked application)"),
        }
    }
}

#[derive(Default)]
struct InfraFold {
    lines: Vec<TopologyLine>,
    server: Option<i64>,
    gateway: Option<i64>,
    saw_gateway: bool,
}

impl InfraFold {
    fn push(mut self, row: &InfraRow) -> Self {
        if self.server != Some(row.server.id) {
            self.close_server();
            self.lines.push(TopologyLine::Server {
                ip_address: row.server.name.clone(),
            });
            self.server = Some(row.server.id);
            self.gateway = None;
            self.saw_gateway = false;
        }

        let Some(gateway) = &row.gateway else {
            return self;
        };
        if self.gateway != Some(gateway.id) {
            self.lines.push(TopologyLine::Gateway {
                name: gateway.name.clone(),
            });
            self.gateway = Some(gateway.id);
            self.saw_gateway = true;
        }

        if let Some(sensor) = &row.sensor {
            self.lines.push(TopologyLine::Sensor {
                name: sensor.name.clone(),
                network: row.network.clone().unwrap_or_else(|| "?".to_string()),
            });
        }
        self
    }

    fn close_server(&mut self) {
        if self.server.is_some() && !self.saw_gateway {
            self.lines.push(TopologyLine::NoGateway);
        }
    }

    fn finish(mut self) -> Vec<TopologyLine> {
        self.close_server();
        self.lines
    }
}

/// Group server rows into `Server → Gateway → Sensor` lines.
///
/// Rows must be sorted by server, then gateway, then sensor.
pub fn build_infrastructure<'a, I>(rows: I) -> Vec<TopologyLine>
where
    I: IntoIterator<Item = &'a InfraRow>,
{
    rows.into_iter()
        .fold(InfraFold::default(), InfraFold::push)
        .finish()
}

#[derive(Default)]
struct AppFold {
    lines: Vec<TopologyLine>,
    application: Option<i64>,
    server: Option<i64>,
}

impl AppFold {
    fn push(mut self, row: &AppRow) -> Self {
        if self.application != Some(row.application.id) {
            self.lines.push(TopologyLine::Application {
                name: row.application.name.clone(),
            });
            self.application = Some(row.application.id);
            self.server = None;
        }

        let Some(server) = &row.server else {
            return self;
        };
        if self.server != Some(server.id) {
            self.lines.push(TopologyLine::LinkedServer {
                ip_address: server.name.clone(),
            });
            self.server = Some(server.id);
        }

        if let Some(sensor) = &row.sensor {
            self.lines.push(TopologyLine::Reading {
                sensor: sensor.name.clone(),
                sensor_type: row.sensor_type.clone().unwrap_or_else(|| "?".to_string()),
                unit: row.unit.clone().unwrap_or_else(|| "?".to_string()),
            });
        }
        self
    }

    fn finish(mut self) -> Vec<TopologyLine> {
        if self.application.is_none() {
            self.lines.push(TopologyLine::NoApplication);
        }
        self.lines
    }
}

/// Group application rows into `Application → Server → Sensor / Type` lines.
///
/// Rows must be sorted by application, then server, then sensor.
pub fn build_applications<'a, I>(rows: I) -> Vec<TopologyLine>
where
    I: IntoIterator<Item = &'a AppRow>,
{
    rows.into_iter()
        .fold(AppFold::default(), AppFold::push)
        .finish()
}

const INFRA_SQL: &str = "
    SELECT sv.id, sv.ip_address, g.id, g.name, c.id, c.name, r.technology
    FROM server sv
    LEFT JOIN gateway g ON g.server_id = sv.id
    LEFT JOIN sensor c ON c.gateway_id = g.id
    LEFT JOIN network_type r ON r.id = c.network_id
    ORDER BY sv.ip_address, sv.id, g.name, g.id, c.name, c.id
";

const APP_SQL: &str = "
    SELECT a.id, a.name, sv.id, sv.ip_address, c.id, c.name, t.name, t.unit
    FROM application a
    LEFT JOIN connection x ON x.application_id = a.id
    LEFT JOIN server sv ON sv.id = x.server_id
    LEFT JOIN gateway g ON g.server_id = sv.id
    LEFT JOIN sensor c ON c.gateway_id = g.id
    LEFT JOIN sensor_type t ON t.id = c.type_id
    ORDER BY a.name, a.id, sv.ip_address, sv.id, c.name, c.id
";

fn named(row: &Row<'_>, id: usize, name: usize) -> rusqlite::Result<Option<Named>> {
    let id: Option<i64> = row.get(id)?;
    let name: Option<String> = row.get(name)?;
    Ok(id.map(|id| Named::new(id, name.unwrap_or_default())))
}

/// Read the sorted server join.
pub fn load_infrastructure(store: &Store) -> Result<Vec<InfraRow>> {
    let mut stmt = store.conn().prepare(INFRA_SQL)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(InfraRow {
                server: Named::new(row.get(0)?, row.get::<_, String>(1)?),
                gateway: named(row, 2, 3)?,
                sensor: named(row, 4, 5)?,
                network: row.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Read the sorted application join, or `None` without a connection table.
pub fn load_applications(store: &Store) -> Result<Option<Vec<AppRow>>> {
    if !store.has_connections()? {
        return Ok(None);
    }

    let mut stmt = store.conn().prepare(APP_SQL)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AppRow {
                application: Named::new(row.get(0)?, row.get::<_, String>(1)?),
                server: named(row, 2, 3)?,
                sensor: named(row, 4, 5)?,
                sensor_type: row.get(6)?,
                unit: row.get(7)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Some(rows))
}

/// Both topology views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub infrastructure: Vec<TopologyLine>,
    /// `None` when the store has no connection table.
    pub applications: Option<Vec<TopologyLine>>,
}

impl Topology {
    /// Load and group both views.
    pub fn load(store: &Store) -> Result<Self> {
        let infrastructure = build_infrastructure(&load_infrastructure(store)?);
        let applications = load_applications(store)?.map(|rows| build_applications(&rows));
        Ok(Self {
            infrastructure,
            applications,
        })
    }

    /// Render both views as indented text.
    pub fn render(&self) -> String {
        let mut out = String::from("== Topology: Server → Gateway → Sensor ==\n");
        out.push_str(&render_lines(&self.infrastructure));

        if let Some(apps) = &self.applications {
            out.push_str("\n\n== Topology: Application → Server → Sensor / Type ==\n");
            out.push_str(&render_lines(apps));
        }
        out
    }
}

/// Join lines with newlines.
pub fn render_lines(lines: &[TopologyLine]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infra(
        server: (i64, &str),
        gateway: Option<(i64, &str)>,
        sensor: Option<(i64, &str, &str)>,
    ) -> InfraRow {
        InfraRow {
            server: Named::new(server.0, server.1),
            gateway: gateway.map(|(id, name)| Named::new(id, name)),
            sensor: sensor.map(|(id, name, _)| Named::new(id, name)),
            network: sensor.map(|(_, _, net)| net.to_string()),
        }
    }

    fn server(ip: &str) -> TopologyLine {
        TopologyLine::Server {
            ip_address: ip.to_string(),
        }
    }

    fn gateway(name: &str) -> TopologyLine {
        TopologyLine::Gateway {
            name: name.to_string(),
        }
    }

    fn sensor(name: &str, network: &str) -> TopologyLine {
        TopologyLine::Sensor {
            name: name.to_string(),
            network: network.to_string(),
        }
    }

    #[test]
    fn test_server_without_gateway() {
        let rows = vec![infra((1, "10.0.0.1"), None, None)];
        assert_eq!(
            build_infrastructure(&rows),
            vec![server("10.0.0.1"), TopologyLine::NoGateway]
        );
    }

    #[test]
    fn test_gateway_without_sensor_after_one_with() {
        let rows = vec![
            infra((1, "10.0.0.1"), Some((1, "G1")), Some((1, "S1", "WiFi"))),
            infra((1, "10.0.0.1"), Some((2, "G2")), None),
        ];
        assert_eq!(
            build_infrastructure(&rows),
            vec![server("10.0.0.1"), gateway("G1"), sensor("S1", "WiFi"), gateway("G2")]
        );
    }

    #[test]
    fn test_sensors_share_gateway_header() {
        let rows = vec![
            infra((1, "10.0.0.1"), Some((1, "G1")), Some((1, "S1", "WiFi"))),
            infra((1, "10.0.0.1"), Some((1, "G1")), Some((2, "S2", "LoRaWAN"))),
        ];
        assert_eq!(
            build_infrastructure(&rows),
            vec![
                server("10.0.0.1"),
                gateway("G1"),
                sensor("S1", "WiFi"),
                sensor("S2", "LoRaWAN")
            ]
        );
    }

    #[test]
    fn test_no_gateway_marker_mid_stream_and_trailing() {
        let rows = vec![
            infra((1, "10.0.0.1"), None, None),
            infra((2, "10.0.0.2"), Some((1, "G1")), None),
            infra((3, "10.0.0.3"), None, None),
        ];
        assert_eq!(
            build_infrastructure(&rows),
            vec![
                server("10.0.0.1"),
                TopologyLine::NoGateway,
                server("10.0.0.2"),
                gateway("G1"),
                server("10.0.0.3"),
                TopologyLine::NoGateway,
            ]
        );
    }

    #[test]
    fn test_same_ip_distinct_servers() {
        let rows = vec![
            infra((1, "10.0.0.1"), Some((1, "G1")), None),
            infra((2, "10.0.0.1"), None, None),
        ];
        let lines = build_infrastructure(&rows);
        assert_eq!(lines.iter().filter(|l| matches!(l, TopologyLine::Server { .. })).count(), 2);
        assert_eq!(lines.last(), Some(&TopologyLine::NoGateway));
    }

    #[test]
    fn test_empty_infrastructure() {
        assert!(build_infrastructure(&Vec::new()).is_empty());
    }

    #[test]
    fn test_application_grouping() {
        let app = |id, name: &str| Named::new(id, name);
        let rows = vec![
            AppRow {
                application: app(1, "Dashboard"),
                server: Some(Named::new(1, "10.0.0.1")),
                sensor: Some(Named::new(1, "S1")),
                sensor_type: Some("Temperature".into()),
                unit: Some("C".into()),
            },
            AppRow {
                application: app(1, "Dashboard"),
                server: Some(Named::new(1, "10.0.0.1")),
                sensor: Some(Named::new(2, "S2")),
                sensor_type: Some("Humidity".into()),
                unit: Some("%".into()),
            },
            AppRow {
                application: app(2, "Idle"),
                server: None,
                sensor: None,
                sensor_type: None,
                unit: None,
            },
        ];

        let rendered = render_lines(&build_applications(&rows));
        assert_eq!(
            rendered,
            "Application : Dashboard\n  Server : 10.0.0.1\n    Sensor : S1 / Temperature (C)\n    Sensor : S2 / Humidity (%)\nApplication : Idle"
        );
    }

    #[test]
    fn test_no_application_marker() {
        assert_eq!(build_applications(&Vec::new()), vec![TopologyLine::NoApplication]);
    }

    #[test]
    fn test_display_indentation() {
        assert_eq!(server("10.0.0.1").to_string(), "Server : 10.0.0.1");
        assert_eq!(gateway("G1").to_string(), "  Gateway : G1");
        assert_eq!(sensor("S1", "?").to_string(), "    Sensor : S1 (?)");
        assert_eq!(TopologyLine::NoGateway.to_string(), "  (no gateway)");
    }
}
