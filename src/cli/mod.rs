// Command handlers for the `seafile` binary.
//
// The table of commands is an ordinary value: `builtin_commands()` builds it
// once in `main` and it is passed to the dispatcher from there.

pub mod cp;
pub mod ls;
pub mod session;
pub mod util;

use crate::client::Client;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;

/// Signature shared by every command handler.
pub type Handler = fn(&Client, &[String]) -> Result<()>;

#[derive(Clone, Copy)]
pub struct Command {
    pub usage: &'static str,
    pub run: Handler,
}

/// Command name to handler map.
#[derive(Default)]
pub struct CommandTable {
    commands: BTreeMap<&'static str, Command>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, usage: &'static str, run: Handler) -> &mut Self {
        self.commands.insert(name, Command { usage, run });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// Help text listing every registered command.
    pub fn usage(&self) -> String {
        let mut text = String::from("Usage: seafile [OPTIONS] <COMMAND> [ARGS]...\n\nCommands:\n");
        for (name, command) in &self.commands {
            text.push_str(&format!("{}:{}\n", name, command.usage));
        }
        text
    }

    pub fn dispatch(&self, client: &Client, name: &str, args: &[String]) -> Result<()> {
        let command = self
            .get(name)
            .ok_or_else(|| anyhow!("unknown command {:?}\n\n{}", name, self.usage()))?;
        (command.run)(client, args)
    }
}

/// The commands the binary ships with.
pub fn builtin_commands() -> CommandTable {
    let mut table = CommandTable::new();
    table.register("ls", ls::USAGE, ls::run).register("cp", cp::USAGE, cp::run);
    table
}
