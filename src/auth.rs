// Login and connectivity checks.

use crate::client::{decode_json, expect_ok, send, ApiVersion, Client};
use crate::error::{Result, SeafileError};
use reqwest::Method;
use serde::Deserialize;
use tracing::info;

/// Body of `POST /api2/auth-token/`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: String,
}

impl Client {
    /// Exchange username/password for a token and keep it on the client.
    ///
    /// On failure the previous token (if any) is left untouched.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let url = self.url(ApiVersion::V2, "/auth-token/");
        let req = self
            .http()
            .post(&url)
            .form(&[("username", username), ("password", password)]);
        let resp = send(req)?;

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(SeafileError::Auth {
                status: Some(status),
                message: body,
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| SeafileError::Decode(format!("auth token response: {}", e)))?;
        if parsed.token.is_empty() {
            return Err(SeafileError::Auth {
                status: Some(status),
                message: body,
            });
        }

        info!(host = %self.host(), username = %username, "logged in");
        self.set_token(parsed.token);
        Ok(())
    }

    /// Unauthenticated reachability check.
    pub fn ping(&self) -> Result<()> {
        let resp = send(self.http().get(self.url(ApiVersion::V2, "/ping/")))?;
        expect_pong(expect_ok(resp)?)
    }

    /// Authenticated reachability check; also proves the token is accepted.
    pub fn auth_ping(&self) -> Result<()> {
        let resp = send(self.request(Method::GET, ApiVersion::V2, "/auth/ping/")?)?;
        expect_pong(expect_ok(resp)?)
    }
}

fn expect_pong(resp: reqwest::blocking::Response) -> Result<()> {
    let answer: String = decode_json(resp)?;
    if answer == "pong" {
        Ok(())
    } else {
        Err(SeafileError::Decode(format!("expected \"pong\", got {:?}", answer)))
    }
}
