//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use iotinv_core::{StoreConfig, View, DEFAULT_DATABASE_PATH};

use crate::formatter::OutputFormat;

/// Something `--show` can print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShowTarget {
    Buildings,
    Rooms,
    Sensors,
    Gateways,
    Servers,
    Applications,
    #[value(name = "types")]
    SensorTypes,
    #[value(name = "networks")]
    NetworkTypes,
    Connections,
    Topology,
}

impl ShowTarget {
    /// The tabular view behind this target; `None` for the topology.
    pub fn view(self) -> Option<View> {
        match self {
            ShowTarget::Buildings => Some(View::Buildings),
            ShowTarget::Rooms => Some(View::Rooms),
            ShowTarget::Sensors => Some(View::Sensors),
            ShowTarget::Gateways => Some(View::Gateways),
            ShowTarget::Servers => Some(View::Servers),
            ShowTarget::Applications => Some(View::Applications),
            ShowTarget::SensorTypes => Some(View::SensorTypes),
            ShowTarget::NetworkTypes => Some(View::NetworkTypes),
            ShowTarget::Connections => Some(View::Connections),
            ShowTarget::Topology => None,
        }
    }
}

/// IoT inventory shell
#[derive(Parser, Debug)]
#[command(name = "iotinv")]
#[command(version, about = "Browse and edit an IoT deployment inventory")]
pub struct Args {
    /// SQLite database file
    #[arg(short = 'd', long, default_value = DEFAULT_DATABASE_PATH)]
    pub database: PathBuf,

    /// Use a throwaway in-memory database
    #[arg(long, conflicts_with = "database")]
    pub memory: bool,

    /// Do not create missing tables
    #[arg(long)]
    pub no_init: bool,

    /// Do not create the application/server connection table
    #[arg(long)]
    pub without_connections: bool,

    /// Enable the read-only SQL query menu entry
    #[arg(long)]
    pub allow_raw_sql: bool,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Print one view and exit
    #[arg(long, value_enum)]
    pub show: Option<ShowTarget>,
}

impl Args {
    /// Convert command-line arguments to store configuration.
    pub fn into_config(self) -> StoreConfig {
        let mut config = if self.memory {
            StoreConfig::in_memory()
        } else {
            StoreConfig::new(self.database)
        };

        config = config.with_connections(!self.without_connections);
        if self.no_init {
            config = config.without_schema();
        }
        if self.allow_raw_sql {
            config = config.with_raw_sql();
        }
        config
    }
}
