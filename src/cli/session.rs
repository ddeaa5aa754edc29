// Connection settings for the binary: where the server is, how to obtain a
// token, and where a token from a previous login is kept between runs.

use crate::client::{Client, Credentials};
use anyhow::{Context, Result};
use clap::Args;
use dialoguer::Password;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Global options shared by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Seafile server address, e.g. https://cloud.example.com
    #[arg(short = 'H', long, env = "SEAFILE_HOST")]
    pub host: Option<String>,

    /// Account to log in with
    #[arg(short, long, env = "SEAFILE_USER")]
    pub user: Option<String>,

    /// Password for --user (prompted when missing)
    #[arg(short, long, env = "SEAFILE_PASS", hide_env_values = true)]
    pub password: Option<String>,

    /// Pre-issued auth token; takes precedence over --user
    #[arg(long, env = "SEAFILE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    host: String,
    token: String,
}

/// Token persisted in a small JSON file, keyed by server address.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    /// `~/.seafile_token`, or `./.seafile_token` without a home directory.
    pub fn default_location() -> Self {
        let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir.join(".seafile_token"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Token saved for `host`, if any.
    pub fn load(&self, host: &str) -> Option<String> {
        let data = std::fs::read_to_string(&self.path).ok()?;
        let stored: StoredToken = serde_json::from_str(&data).ok()?;
        (stored.host == host && !stored.token.is_empty()).then_some(stored.token)
    }

    pub fn save(&self, host: &str, token: &str) -> Result<()> {
        let stored = StoredToken {
            host: host.to_string(),
            token: token.to_string(),
        };
        let data = serde_json::to_string(&stored)?;
        std::fs::write(&self.path, data).with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

/// Build a client from the command line settings.
///
/// Order: explicit token, then user/password (a successful login is saved to
/// `store`), then a previously saved token, then anonymous.
pub fn connect(args: &ConnectionArgs, store: &TokenStore) -> Result<Client> {
    let host = args
        .host
        .as_deref()
        .filter(|h| !h.is_empty())
        .context("no server address: pass --host or set SEAFILE_HOST")?
        .trim_end_matches('/');

    if let Some(token) = args.token.as_ref().filter(|t| !t.is_empty()) {
        debug!("using token from arguments");
        return Ok(Client::new(host, Credentials::Token(token.clone()))?);
    }

    if let Some(username) = args.user.as_ref().filter(|u| !u.is_empty()) {
        let password = match &args.password {
            Some(p) => p.clone(),
            None => Password::new()
                .with_prompt(format!("Password for {}", username))
                .interact()?,
        };
        let client = Client::new(
            host,
            Credentials::Password {
                username: username.clone(),
                password,
            },
        )?;
        if let Some(token) = client.token() {
            if let Err(e) = store.save(host, token) {
                warn!(error = %e, "could not persist token");
            }
        }
        return Ok(client);
    }

    if let Some(token) = store.load(host) {
        debug!(path = %store.path().display(), "using saved token");
        return Ok(Client::new(host, Credentials::Token(token))?);
    }

    Ok(Client::new(host, Credentials::Anonymous)?)
}
