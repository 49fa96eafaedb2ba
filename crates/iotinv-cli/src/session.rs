//! Menu-driven CRUD session.
//!
//! Every mutation picks its references from the rows that currently exist,
//! so the store only ever sees ids the user was offered. Errors caused by
//! input are printed and the menu carries on; store failures end the
//! session.

use std::io::Write;

use iotinv_core::{
    Application, Building, EntityKind, Error, Gateway, NetworkType, Record, Room, Sensor,
    SensorType, Server, Store, Topology, View,
};
use tracing::debug;

use crate::commands::{self, CommandResult};
use crate::error::CliResult;
use crate::formatter::{self, capitalize, create_formatter, OutputFormat};
use crate::prompt::{Input, Prompt};

/// History entries listed by `.history`.
const HISTORY_SHOWN: usize = 20;

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

/// Top-level menu entries.
const MAIN_MENU: [&str; 4] = ["Display", "Insert", "Update", "Delete"];

/// An entry of the display menu.
#[derive(Debug, Clone, Copy)]
enum Show {
    View(View),
    Topology,
    RawQuery,
}

/// Interactive session over one store.
pub struct Session<'a, P, W> {
    store: &'a Store,
    prompt: P,
    out: W,
    format: OutputFormat,
    quit: bool,
}

impl<'a, P: Prompt, W: Write> Session<'a, P, W> {
    pub fn new(store: &'a Store, prompt: P, out: W, format: OutputFormat) -> Self {
        Self {
            store,
            prompt,
            out,
            format,
            quit: false,
        }
    }

    /// Hand back the prompt and output.
    pub fn into_parts(self) -> (P, W) {
        (self.prompt, self.out)
    }

    /// Run the main menu until the user quits.
    pub fn run(&mut self) -> CliResult<()> {
        while let Some(choice) = self.menu(None, &MAIN_MENU, "Quit")? {
            let outcome = match choice {
                0 => self.display_menu(),
                1 => self.insert_menu(),
                2 => self.update_menu(),
                _ => self.delete_menu(),
            };
            outcome?;
        }
        self.say("Goodbye!")
    }

    fn display_menu(&mut self) -> CliResult<()> {
        let mut entries: Vec<Show> = View::ALL.into_iter().map(Show::View).collect();
        entries.push(Show::Topology);
        if self.store.raw_sql_enabled() {
            entries.push(Show::RawQuery);
        }
        let labels: Vec<String> = entries
            .iter()
            .map(|entry| match entry {
                Show::View(view) => capitalize(view.name()),
                Show::Topology => "Topology".to_string(),
                Show::RawQuery => "Read-only SQL query".to_string(),
            })
            .collect();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();

        while let Some(choice) = self.menu(Some("Display"), &labels, "Back")? {
            let result = self.show(entries[choice]);
            self.settle(result)?;
        }
        Ok(())
    }

    fn insert_menu(&mut self) -> CliResult<()> {
        let mut kinds = EntityKind::KEYED.to_vec();
        if self.store.has_connections()? {
            kinds.push(EntityKind::Connection);
        }
        let labels: Vec<String> = kinds
            .iter()
            .map(|kind| match kind {
                EntityKind::Connection => "Connection (application ↔ server)".to_string(),
                kind => capitalize(kind.name()),
            })
            .collect();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();

        while let Some(choice) = self.menu(Some("Insert"), &labels, "Back")? {
            let result = self.insert(kinds[choice]);
            self.settle(result)?;
        }
        Ok(())
    }

    fn update_menu(&mut self) -> CliResult<()> {
        let labels = keyed_labels();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();

        while let Some(choice) = self.menu(Some("Update"), &labels, "Back")? {
            let result = self.update(EntityKind::KEYED[choice]);
            self.settle(result)?;
        }
        Ok(())
    }

    fn delete_menu(&mut self) -> CliResult<()> {
        let labels = keyed_labels();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();

        while let Some(choice) = self.menu(Some("Delete"), &labels, "Back")? {
            let result = self.delete(EntityKind::KEYED[choice]);
            self.settle(result)?;
        }
        Ok(())
    }

    fn show(&mut self, entry: Show) -> CliResult<()> {
        let formatter = create_formatter(self.format);
        let output = match entry {
            Show::View(view) => formatter.format_rows(&view.query(self.store)?),
            Show::Topology => formatter.format_topology(&Topology::load(self.store)?),
            Show::RawQuery => {
                let Some(sql) = self.ask_text("SQL> ")? else {
                    return Ok(());
                };
                formatter.format_rows(&self.store.raw_query(&sql)?)
            }
        };
        writeln!(self.out, "{}", output)?;
        Ok(())
    }

    fn insert(&mut self, kind: EntityKind) -> CliResult<()> {
        let id = match kind {
            EntityKind::Building => {
                let Some(name) = self.ask_text("Building name: ")? else {
                    return Ok(());
                };
                self.store.insert(Building::new(name))?.id
            }
            EntityKind::Room => {
                let Some(name) = self.ask_text("Room name: ")? else {
                    return Ok(());
                };
                let Some(building) = self.choose(EntityKind::Building)? else {
                    return Ok(());
                };
                self.store.insert(Room::new(building, name))?.id
            }
            EntityKind::Sensor => {
                let Some(name) = self.ask_text("Sensor name: ")? else {
                    return Ok(());
                };
                let Some([room, gateway, sensor_type, network]) = self.choose_all([
                    EntityKind::Room,
                    EntityKind::Gateway,
                    EntityKind::SensorType,
                    EntityKind::NetworkType,
                ])?
                else {
                    return Ok(());
                };
                self.store
                    .insert(Sensor::new(room, gateway, sensor_type, network, name))?
                    .id
            }
            EntityKind::Gateway => {
                let Some(name) = self.ask_text("Gateway name: ")? else {
                    return Ok(());
                };
                let Some([room, server]) =
                    self.choose_all([EntityKind::Room, EntityKind::Server])?
                else {
                    return Ok(());
                };
                self.store.insert(Gateway::new(room, server, name))?.id
            }
            EntityKind::Server => {
                let Some(ip) = self.ask_text("Server IP address: ")? else {
                    return Ok(());
                };
                self.store.insert(Server::new(ip))?.id
            }
            EntityKind::Application => {
                let Some(name) = self.ask_text("Application name: ")? else {
                    return Ok(());
                };
                self.store.insert(Application::new(name))?.id
            }
            EntityKind::SensorType => {
                let Some(name) = self.ask_text("Sensor type name: ")? else {
                    return Ok(());
                };
                let Some(unit) = self.ask_text("Unit: ")? else {
                    return Ok(());
                };
                self.store.insert(SensorType::new(name, unit))?.id
            }
            EntityKind::NetworkType => {
                let Some(technology) = self.ask_text("Network technology: ")? else {
                    return Ok(());
                };
                let Some(bit_rate) = self.ask_int("Bit rate: ")? else {
                    return Ok(());
                };
                self.store.insert(NetworkType::new(technology, bit_rate))?.id
            }
            EntityKind::Connection => return self.insert_connection(),
        };

        debug!(entity = %kind, id, "inserted");
        self.notify(&format!("{} #{} inserted.", capitalize(kind.name()), id))
    }

    fn insert_connection(&mut self) -> CliResult<()> {
        if !self.store.has_connections()? {
            return self.notify("(This database has no connection table.)");
        }
        let Some([application, server]) =
            self.choose_all([EntityKind::Application, EntityKind::Server])?
        else {
            return Ok(());
        };

        if self.store.link(application, server)? {
            self.notify("Connection inserted.")
        } else {
            self.notify("That application is already linked to that server.")
        }
    }

    fn update(&mut self, kind: EntityKind) -> CliResult<()> {
        let updated = match kind {
            EntityKind::Building => {
                let Some(mut building) = self.pick::<Building>()? else {
                    return Ok(());
                };
                let Some(name) = self.ask_text_or("New name", &building.name)? else {
                    return Ok(());
                };
                building.name = name;
                self.store.update(&building)?;
                building.id
            }
            EntityKind::Room => {
                let Some(mut room) = self.pick::<Room>()? else {
                    return Ok(());
                };
                let Some(name) = self.ask_text_or("New name", &room.name)? else {
                    return Ok(());
                };
                room.name = name;
                let Some(relink) = self.confirm("Change building? (y/N): ")? else {
                    return Ok(());
                };
                if relink {
                    let Some(building) = self.choose(EntityKind::Building)? else {
                        return Ok(());
                    };
                    room.building_id = building;
                }
                self.store.update(&room)?;
                room.id
            }
            EntityKind::Sensor => {
                let Some(mut sensor) = self.pick::<Sensor>()? else {
                    return Ok(());
                };
                let Some(name) = self.ask_text_or("New name", &sensor.name)? else {
                    return Ok(());
                };
                sensor.name = name;
                let Some(relink) = self.confirm("Change room/gateway/type/network? (y/N): ")?
                else {
                    return Ok(());
                };
                if relink {
                    let Some([room, gateway, sensor_type, network]) = self.choose_all([
                        EntityKind::Room,
                        EntityKind::Gateway,
                        EntityKind::SensorType,
                        EntityKind::NetworkType,
                    ])?
                    else {
                        return Ok(());
                    };
                    sensor.room_id = room;
                    sensor.gateway_id = gateway;
                    sensor.type_id = sensor_type;
                    sensor.network_id = network;
                }
                self.store.update(&sensor)?;
                sensor.id
            }
            EntityKind::Gateway => {
                let Some(mut gateway) = self.pick::<Gateway>()? else {
                    return Ok(());
                };
                let Some(name) = self.ask_text_or("New name", &gateway.name)? else {
                    return Ok(());
                };
                gateway.name = name;
                let Some(relink) = self.confirm("Change room/server? (y/N): ")? else {
                    return Ok(());
                };
                if relink {
                    let Some([room, server]) =
                        self.choose_all([EntityKind::Room, EntityKind::Server])?
                    else {
                        return Ok(());
                    };
                    gateway.room_id = room;
                    gateway.server_id = server;
                }
                self.store.update(&gateway)?;
                gateway.id
            }
            EntityKind::Server => {
                let Some(mut server) = self.pick::<Server>()? else {
                    return Ok(());
                };
                let Some(ip) = self.ask_text_or("New IP address", &server.ip_address)? else {
                    return Ok(());
                };
                server.ip_address = ip;
                self.store.update(&server)?;
                server.id
            }
            EntityKind::Application => {
                let Some(mut application) = self.pick::<Application>()? else {
                    return Ok(());
                };
                let Some(name) = self.ask_text_or("New name", &application.name)? else {
                    return Ok(());
                };
                application.name = name;
                self.store.update(&application)?;
                application.id
            }
            EntityKind::SensorType => {
                let Some(mut sensor_type) = self.pick::<SensorType>()? else {
                    return Ok(());
                };
                let Some(name) = self.ask_text_or("New name", &sensor_type.name)? else {
                    return Ok(());
                };
                let Some(unit) = self.ask_text_or("New unit", &sensor_type.unit)? else {
                    return Ok(());
                };
                sensor_type.name = name;
                sensor_type.unit = unit;
                self.store.update(&sensor_type)?;
                sensor_type.id
            }
            EntityKind::NetworkType => {
                let Some(mut network) = self.pick::<NetworkType>()? else {
                    return Ok(());
                };
                let Some(technology) = self.ask_text_or("New technology", &network.technology)?
                else {
                    return Ok(());
                };
                let Some(bit_rate) = self.ask_int_or("New bit rate", network.bit_rate)? else {
                    return Ok(());
                };
                network.technology = technology;
                network.bit_rate = bit_rate;
                self.store.update(&network)?;
                network.id
            }
            EntityKind::Connection => return Ok(()),
        };

        debug!(entity = %kind, id = updated, "updated");
        self.notify(&format!("{} #{} updated.", capitalize(kind.name()), updated))
    }

    fn delete(&mut self, kind: EntityKind) -> CliResult<()> {
        let Some(id) = self.choose(kind)? else {
            return Ok(());
        };
        let result = self.store.delete(kind, id)?;
        let output = create_formatter(self.format).format_deleted(&result);
        writeln!(self.out, "{}", output)?;
        Ok(())
    }

    /// Report a recoverable error and carry on; pass fatal ones up.
    fn settle(&mut self, result: CliResult<()>) -> CliResult<()> {
        match result {
            Err(e) if !e.is_fatal() => {
                debug!(error = %e, "operation failed");
                let output = create_formatter(self.format).format_error(&e.to_string());
                writeln!(self.out, "{}", output)?;
                Ok(())
            }
            other => other,
        }
    }

    /// Print a numbered menu and read an entry. `None` means back.
    fn menu(
        &mut self,
        title: Option<&str>,
        entries: &[&str],
        back: &str,
    ) -> CliResult<Option<usize>> {
        let mut text = format!("\nDatabase: {}\n", self.location());
        let indent = match title {
            Some(title) => {
                text.push_str(&format!("  /{}:\n", title));
                "    "
            }
            None => "  ",
        };
        for (i, entry) in entries.iter().enumerate() {
            text.push_str(&format!("{}{} - {}\n", indent, i + 1, entry));
        }
        text.push_str(&format!("{}0 - {}\n", indent, back));

        loop {
            write!(self.out, "{}", text)?;
            let Some(line) = self.ask("Choice: ")? else {
                return Ok(None);
            };
            match line.parse::<usize>() {
                Ok(0) => return Ok(None),
                Ok(n) if n <= entries.len() => return Ok(Some(n - 1)),
                _ => self.say("Invalid choice.")?,
            }
        }
    }

    /// Read a line, running any dot-command first. `None` when the user
    /// cancelled or the session is over.
    fn ask(&mut self, prompt: &str) -> CliResult<Option<String>> {
        loop {
            if self.quit {
                return Ok(None);
            }
            match self.prompt.read_line(prompt)? {
                Input::Line(line) if commands::is_command(&line) => self.command(&line)?,
                Input::Line(line) => return Ok(Some(line.trim().to_string())),
                Input::Cancel => return Ok(None),
                Input::Eof => self.quit = true,
            }
        }
    }

    fn command(&mut self, line: &str) -> CliResult<()> {
        match commands::handle_command(line, self.format) {
            CommandResult::Exit => self.quit = true,
            CommandResult::Output(msg) => self.say(&msg)?,
            CommandResult::SetFormat(format) => {
                self.format = format;
                self.notify(&format!("Output format set to {}", format))?;
            }
            CommandResult::Check => {
                let dangling = self.store.dangling_references()?;
                let output = create_formatter(self.format).format_dangling(&dangling);
                self.say(&output)?;
            }
            CommandResult::ShowHistory => {
                let history = self.prompt.history();
                let start = history.len().saturating_sub(HISTORY_SHOWN);
                for (i, entry) in history.iter().enumerate().skip(start) {
                    writeln!(self.out, "{:4}  {}", i + 1, entry)?;
                }
            }
            CommandResult::Clear => write!(self.out, "{}", CLEAR_SCREEN)?,
        }
        Ok(())
    }

    /// Required text; blank input re-prompts.
    fn ask_text(&mut self, prompt: &str) -> CliResult<Option<String>> {
        loop {
            let Some(line) = self.ask(prompt)? else {
                return Ok(None);
            };
            if !line.is_empty() {
                return Ok(Some(line));
            }
            self.say("=> A value is required.")?;
        }
    }

    /// Text that keeps `current` on blank input.
    fn ask_text_or(&mut self, label: &str, current: &str) -> CliResult<Option<String>> {
        let prompt = format!("{} (blank keeps \"{}\"): ", label, current);
        Ok(self.ask(&prompt)?.map(|line| {
            if line.is_empty() {
                current.to_string()
            } else {
                line
            }
        }))
    }

    /// Integer; anything else re-prompts.
    fn ask_int(&mut self, prompt: &str) -> CliResult<Option<i64>> {
        loop {
            let Some(line) = self.ask(prompt)? else {
                return Ok(None);
            };
            match line.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => self.say("=> Enter an integer.")?,
            }
        }
    }

    /// Integer that keeps `current` on blank input.
    fn ask_int_or(&mut self, label: &str, current: i64) -> CliResult<Option<i64>> {
        let prompt = format!("{} (blank keeps {}): ", label, current);
        loop {
            let Some(line) = self.ask(&prompt)? else {
                return Ok(None);
            };
            if line.is_empty() {
                return Ok(Some(current));
            }
            match line.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => self.say("=> Enter an integer.")?,
            }
        }
    }

    /// Yes/no question, `no` unless the answer starts with `y`.
    fn confirm(&mut self, prompt: &str) -> CliResult<Option<bool>> {
        Ok(self
            .ask(prompt)?
            .map(|answer| answer.to_lowercase().starts_with('y')))
    }

    /// Offer the current rows of `kind` and read one of their ids.
    ///
    /// `None` when there is nothing to pick from or the user cancelled.
    fn choose(&mut self, kind: EntityKind) -> CliResult<Option<i64>> {
        let choices = self.store.choices(kind)?;
        if choices.is_empty() {
            return self
                .say(&format!("(No {} available.)", kind.name()))
                .map(|_| None);
        }

        writeln!(self.out, "{}", formatter::choices_table(&choices))?;
        let prompt = format!("{} id: ", capitalize(kind.name()));
        loop {
            let Some(id) = self.ask_int(&prompt)? else {
                return Ok(None);
            };
            if choices.iter().any(|c| c.id == id) {
                return Ok(Some(id));
            }
            self.say("=> Invalid id.")?;
        }
    }

    /// Choose one id per kind, stopping at the first that fails.
    fn choose_all<const N: usize>(
        &mut self,
        kinds: [EntityKind; N],
    ) -> CliResult<Option<[i64; N]>> {
        let mut ids = [0; N];
        for (slot, kind) in ids.iter_mut().zip(kinds) {
            let Some(id) = self.choose(kind)? else {
                return Ok(None);
            };
            *slot = id;
        }
        Ok(Some(ids))
    }

    /// Choose a row of `R` and load it.
    fn pick<R: Record>(&mut self) -> CliResult<Option<R>> {
        let Some(id) = self.choose(R::KIND)? else {
            return Ok(None);
        };
        let record = self.store.get::<R>(id)?.ok_or(Error::NotFound {
            entity: R::KIND,
            id,
        })?;
        Ok(Some(record))
    }

    fn say(&mut self, message: &str) -> CliResult<()> {
        writeln!(self.out, "{}", message)?;
        Ok(())
    }

    /// Report an outcome in the current output format.
    fn notify(&mut self, message: &str) -> CliResult<()> {
        let output = create_formatter(self.format).format_message(message);
        self.say(&output)
    }

    fn location(&self) -> String {
        match self.store.config().path() {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        }
    }
}

fn keyed_labels() -> Vec<String> {
    EntityKind::KEYED
        .iter()
        .map(|kind| capitalize(kind.name()))
        .collect()
}
