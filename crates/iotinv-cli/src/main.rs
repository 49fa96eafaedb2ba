//! iotinv command-line shell
//!
//! Browse, insert, update and delete the rows of an IoT deployment
//! inventory, or print one view and exit.

mod commands;
mod completer;
mod config;
mod error;
mod formatter;
mod prompt;
mod repl;
mod session;

use clap::Parser;
use config::{Args, ShowTarget};
use error::CliResult;
use formatter::OutputFormat;
use iotinv_core::{Store, Topology};

fn main() {
    // Logs go to stderr so they never interleave with menus or --show output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("iotinv=warn")),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> CliResult<()> {
    let format = args.format;
    let show = args.show;
    let config = args.into_config();

    tracing::info!(
        database = ?config.path(),
        create_schema = config.create_schema,
        with_connections = config.with_connections,
        raw_sql = config.allow_raw_sql,
        "configuration loaded"
    );

    let store = Store::open(config)?;

    match show {
        // One-shot mode: print one view and exit
        Some(target) => run_show(&store, target, format),
        // Interactive mode
        None => repl::run(&store, format),
    }
}

/// Print one view.
fn run_show(store: &Store, target: ShowTarget, format: OutputFormat) -> CliResult<()> {
    let formatter = formatter::create_formatter(format);
    let output = match target.view() {
        Some(view) => formatter.format_rows(&view.query(store)?),
        None => formatter.format_topology(&Topology::load(store)?),
    };
    println!("{}", output);
    Ok(())
}
