// `ls`: list libraries, or the entries of one directory inside a library.

use super::util::{human_size, parse_remote, strip_remote};
use crate::client::Client;
use crate::directory::{DirEntry, ListOptions, Mtime};
use crate::library::Library;
use anyhow::{Context, Result};
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use std::io::{self, Write};

pub const USAGE: &str = "
  ls                     list libraries
  ls /path               list a directory of the default library
  ls library/path        list a directory of the named library
";

pub fn run(client: &Client, args: &[String]) -> Result<()> {
    let stdout = io::stdout();
    let color = stdout.is_tty();
    let mut out = stdout.lock();
    run_with(client, args, &mut out, color)
}

/// `run` with an explicit output sink; `color` highlights directory rows.
pub fn run_with(client: &Client, args: &[String], out: &mut dyn Write, color: bool) -> Result<()> {
    match args.first() {
        None => list_libraries(client, out),
        Some(target) => list_directory(client, target, out, color),
    }
}

fn list_libraries(client: &Client, out: &mut dyn Write) -> Result<()> {
    let libraries = client.list_all_libraries().context("listing libraries")?;
    for library in &libraries {
        writeln!(out, "{}", format_library(library))?;
    }
    Ok(())
}

fn list_directory(client: &Client, target: &str, out: &mut dyn Write, color: bool) -> Result<()> {
    let remote = parse_remote(strip_remote(target).unwrap_or(target));

    let library = client
        .get_library_by_name(&remote.library)
        .with_context(|| format!("looking up library {:?}", remote.library))?;
    let entries = client
        .repo(&library.id)
        .list_entries(&remote.path, ListOptions::default())
        .with_context(|| format!("listing {}", remote.path))?;

    writeln!(out, "{}{}: {} entries", library.name, remote.path, entries.len())?;
    for entry in &entries {
        let line = format_entry(entry);
        if color && entry.is_dir() {
            writeln!(out, "{}", line.blue())?;
        } else {
            writeln!(out, "{}", line)?;
        }
    }
    Ok(())
}

/// `<perm> <size> <name>` for one library.
pub fn format_library(library: &Library) -> String {
    format!("{:<3} {:>9} {}", library.permission(), human_size(library.size()), library.name)
}

/// `<t>-<perm> <mtime> <size> <name>` with a `/` after directory names.
pub fn format_entry(entry: &DirEntry) -> String {
    let kind = &entry.kind.as_str()[..1];
    let time = entry
        .mtime
        .as_ref()
        .and_then(Mtime::to_local)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".repeat(19));
    let suffix = if entry.is_dir() { "/" } else { "" };
    format!(
        "  {}-{:<2} {} {:>9} {}{}",
        kind,
        entry.permission,
        time,
        human_size(entry.size),
        entry.name,
        suffix
    )
}
