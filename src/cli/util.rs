// Small helpers shared by the command handlers: remote path parsing and
// human-readable sizes.

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::time::Duration;

/// Prefix marking a command argument as a path inside a Seafile library.
pub const REMOTE_SCHEME: &str = "sf://";

/// A library name plus an absolute path inside it. An empty library name
/// stands for the user's default library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    pub library: String,
    pub path: String,
}

impl fmt::Display for RemotePath {
    /// `sf://library/path`; the default library prints as `sf:///path`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", REMOTE_SCHEME, self.library, self.path)
    }
}

/// The part after `sf://`, or `None` for a local path.
pub fn strip_remote(arg: &str) -> Option<&str> {
    arg.strip_prefix(REMOTE_SCHEME)
}

/// Split `library/some/path` into its library and path.
///
/// - `/some/path` addresses the default library.
/// - `library` alone addresses the library root.
pub fn parse_remote(arg: &str) -> RemotePath {
    if arg.starts_with('/') || arg.is_empty() {
        return RemotePath {
            library: String::new(),
            path: if arg.is_empty() { "/".into() } else { arg.into() },
        };
    }
    match arg.split_once('/') {
        Some((library, rest)) => RemotePath {
            library: library.to_string(),
            path: format!("/{}", rest),
        },
        None => RemotePath {
            library: arg.to_string(),
            path: "/".into(),
        },
    }
}

/// Directory part of `path`, always ending with `/`.
pub fn parent_dir(path: &str) -> String {
    match path.trim_end_matches('/').rfind('/') {
        Some(idx) => path[..=idx].to_string(),
        None => "/".to_string(),
    }
}

const UNITS: [&str; 6] = ["K", "M", "G", "T", "P", "E"];

/// Format a byte count with binary units: `512B`, `1.50K`, `3.00M`...
pub fn human_size(size: i64) -> String {
    if size < 1024 {
        return format!("{}B", size.max(0));
    }
    let mut value = size as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2}{}", value, UNITS[unit])
}

/// Spinner shown while a transfer is running.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
