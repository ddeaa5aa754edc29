// Client module: holds a reqwest blocking client, the Seafile server address
// and the optional auth token. Every authenticated call goes through
// `Client::request` / `Client::execute`, which attach the token header and
// route the path to the right API prefix. Status codes are never interpreted
// here; the resource modules decide what counts as success.

use crate::error::{Result, SeafileError};
use reqwest::blocking::{Body, Client as HttpClient, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::redirect::Policy;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// The two API generations the server exposes side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    /// `/api2`: auth, account, ping, devices, library listing, transfer links.
    V2,
    /// `/api/v2.1`: directory, file and detail operations.
    V21,
}

impl ApiVersion {
    pub fn prefix(self) -> &'static str {
        match self {
            ApiVersion::V2 => "/api2",
            ApiVersion::V21 => "/api/v2.1",
        }
    }
}

/// Statuses accepted as success for mkdir/create/rename/move/copy/delete.
///
/// Older servers documented 201 (create) and 301 (rename) while current ones
/// answer 200, so all three are taken as success.
pub(crate) const OPERATION_OK: &[StatusCode] = &[
    StatusCode::OK,
    StatusCode::CREATED,
    StatusCode::MOVED_PERMANENTLY,
];

/// Tunables for the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Ask for download links that stay valid for more than one GET.
    pub reuse_download_links: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            reuse_download_links: true,
        }
    }
}

/// How a new client obtains its token.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// No token yet; call `Client::login` before anything authenticated.
    Anonymous,
    /// A token obtained earlier.
    Token(String),
    /// Log in while constructing the client. A failed login is only logged so
    /// construction never fails because of the server's answer.
    Password { username: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::Token(_) => f.write_str("Token(..)"),
            Credentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Session against one Seafile server.
///
/// The token only changes through `login` or `set_token`. Sharing one client
/// between threads that log in needs outside synchronisation.
#[derive(Clone)]
pub struct Client {
    http: HttpClient,
    host: String,
    token: Option<String>,
    options: ClientOptions,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("authenticated", &self.token.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl Client {
    /// Create a client for `host` (e.g. `https://cloud.example.com`) with the
    /// default options.
    pub fn new(host: &str, credentials: Credentials) -> Result<Self> {
        Self::with_options(host, credentials, ClientOptions::default())
    }

    /// Create a client with explicit options. Only fails when the HTTP stack
    /// itself cannot be built.
    pub fn with_options(host: &str, credentials: Credentials, options: ClientOptions) -> Result<Self> {
        // Redirects stay unfollowed: a 301 on an operation POST is a success
        // answer from some server versions, not a hop to chase.
        let http = HttpClient::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .user_agent(concat!("seafile-client/", env!("CARGO_PKG_VERSION")))
            .redirect(Policy::none())
            .build()?;

        let mut client = Client {
            http,
            host: host.trim_end_matches('/').to_string(),
            token: None,
            options,
        };

        match credentials {
            Credentials::Anonymous => {}
            Credentials::Token(token) => {
                if !token.is_empty() {
                    client.token = Some(token);
                }
            }
            Credentials::Password { username, password } => {
                if let Err(e) = client.login(&username, &password) {
                    warn!(host = %client.host, username = %username, error = %e, "login at construction failed");
                }
            }
        }

        Ok(client)
    }

    /// Server address without a trailing slash.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Store a token for subsequent authenticated requests.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Returns whether a token is present in the client.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Full URL for `path` under `api`. Paths that already are absolute URLs
    /// (server-issued transfer links) are returned untouched.
    pub fn url(&self, api: ApiVersion, path: &str) -> String {
        if is_absolute_url(path) {
            path.to_string()
        } else {
            format!("{}{}{}", self.host, api.prefix(), path)
        }
    }

    /// Header map carrying `Authorization: Token <token>`.
    fn auth_headers(&self) -> Result<HeaderMap> {
        let token = self.token.as_deref().ok_or_else(SeafileError::missing_token)?;
        let value = HeaderValue::from_str(&format!("Token {}", token)).map_err(|_| SeafileError::Auth {
            status: None,
            message: "token contains characters not allowed in a header".into(),
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    /// Start an authenticated request. Fails before anything is sent when no
    /// token is set.
    pub(crate) fn request(&self, method: Method, api: ApiVersion, path: &str) -> Result<RequestBuilder> {
        let headers = self.auth_headers()?;
        let url = self.url(api, path);
        debug!(method = %method, url = %url, "seafile request");
        Ok(self.http.request(method, url).headers(headers))
    }

    /// Raw transport: send an authenticated request with extra headers and an
    /// optional body, returning the response as is.
    pub fn execute(
        &self,
        method: Method,
        api: ApiVersion,
        path: &str,
        headers: HeaderMap,
        body: Option<Body>,
    ) -> Result<Response> {
        let mut req = self.request(method, api, path)?;
        for (name, value) in headers.iter() {
            req = req.header(name, value);
        }
        if let Some(body) = body {
            req = req.body(body);
        }
        send(req)
    }
}

fn is_absolute_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

pub(crate) fn send(req: RequestBuilder) -> Result<Response> {
    Ok(req.send()?)
}

/// Pass the response through when its status is one of `accepted`, otherwise
/// consume the body into an error: `Auth` for a rejected token, `Protocol`
/// for anything else.
pub(crate) fn expect_status(resp: Response, accepted: &[StatusCode]) -> Result<Response> {
    let status = resp.status();
    if accepted.contains(&status) {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED {
        return Err(SeafileError::Auth {
            status: Some(status),
            message: body,
        });
    }
    Err(SeafileError::Protocol { status, body })
}

pub(crate) fn expect_ok(resp: Response) -> Result<Response> {
    expect_status(resp, &[StatusCode::OK])
}

/// Read the whole body and decode it as JSON.
pub(crate) fn decode_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    let text = resp.text()?;
    serde_json::from_str(&text)
        .map_err(|e| SeafileError::Decode(format!("{} ({}): {}", e, status, excerpt(&text))))
}

/// Links come back as a JSON string literal, e.g. `"https://host/upload-api/x"`.
/// Exactly one quote is removed from each end; anything that is not wrapped in
/// quotes is rejected rather than trimmed.
pub(crate) fn parse_quoted_link(body: &str) -> Result<String> {
    let trimmed = body.trim();
    let link = strip_one_quote_pair(trimmed)
        .ok_or_else(|| SeafileError::Decode(format!("link is not a quoted string: {}", excerpt(trimmed))))?;
    if link.is_empty() {
        return Err(SeafileError::Decode("server returned an empty link".into()));
    }
    Ok(link.to_string())
}

/// `text` without one leading and one trailing `"`, if it has both.
pub(crate) fn strip_one_quote_pair(text: &str) -> Option<&str> {
    text.strip_prefix('"').and_then(|rest| rest.strip_suffix('"'))
}

fn excerpt(text: &str) -> String {
    const MAX: usize = 200;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
