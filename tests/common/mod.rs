// Shared helpers for the integration tests.
//
// The client is blocking, so every call runs inside `spawn_blocking` while
// the wiremock server lives on the async runtime.
#![allow(dead_code)]

use seafile_client::{Client, Credentials};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Match, Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TOKEN: &str = "f2210dacd9c6ccb8133606d94ff8e61d99b477fd";
pub const AUTH_VALUE: &str = "Token f2210dacd9c6ccb8133606d94ff8e61d99b477fd";
pub const REPO_ID: &str = "repo1";

/// Run blocking client code off the async runtime.
pub async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task panicked")
}

/// Client with the test token. Build it inside `blocking`.
pub fn client(uri: &str) -> Client {
    Client::new(uri, Credentials::Token(TOKEN.into())).unwrap()
}

/// Matches requests that carry no `Authorization` header at all.
pub struct NoAuthHeader;

impl Match for NoAuthHeader {
    fn matches(&self, request: &Request) -> bool {
        !has_auth_header(request)
    }
}

pub fn has_auth_header(request: &Request) -> bool {
    request
        .headers
        .keys()
        .any(|name| name.as_str().eq_ignore_ascii_case("authorization"))
}

pub fn query(request: &Request, key: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

pub fn form(request: &Request) -> HashMap<String, String> {
    url::form_urlencoded::parse(&request.body).into_owned().collect()
}

/// One part of a multipart/form-data body.
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn disposition_attr(headers: &str, key: &str) -> Option<String> {
    let needle = format!(" {}=\"", key);
    let start = headers.find(&needle)? + needle.len();
    let len = headers[start..].find('"')?;
    Some(headers[start..start + len].to_string())
}

/// Split a multipart body on the boundary announced by its first line.
pub fn parse_multipart(body: &[u8]) -> Vec<FormPart> {
    let Some(line_end) = find(body, b"\r\n") else {
        return Vec::new();
    };
    let delimiter = body[..line_end].to_vec();
    let mut parts = Vec::new();
    let mut rest = &body[line_end + 2..];

    while let Some(end) = find(rest, &delimiter) {
        let chunk = &rest[..end];
        let chunk = chunk.strip_suffix(b"\r\n").unwrap_or(chunk);
        if let Some(split) = find(chunk, b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&chunk[..split]).into_owned();
            parts.push(FormPart {
                name: disposition_attr(&headers, "name").unwrap_or_default(),
                filename: disposition_attr(&headers, "filename"),
                data: chunk[split + 4..].to_vec(),
            });
        }
        rest = &rest[end + delimiter.len()..];
        if rest.starts_with(b"--") {
            break;
        }
        rest = rest.strip_prefix(b"\r\n").unwrap_or(rest);
    }
    parts
}

pub fn field(parts: &[FormPart], name: &str) -> Option<String> {
    parts
        .iter()
        .find(|p| p.name == name && p.filename.is_none())
        .map(|p| String::from_utf8_lossy(&p.data).into_owned())
}

/// Mount a `/api2/repos/` listing with the given `(id, name)` pairs.
pub async fn mount_libraries(server: &MockServer, libraries: &[(&str, &str)]) {
    let body: Vec<_> = libraries
        .iter()
        .map(|(id, name)| {
            json!({
                "id": id, "name": name, "owner": "user@example.com", "size": 0,
                "encrypted": false, "permission": "rw", "mtime": 1700000000, "type": "repo"
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/api2/repos/"))
        .and(header("Authorization", AUTH_VALUE))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Stateful fake of one library, enough for directory/file round trips.
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Tree {
    pub dirs: BTreeSet<String>,
    pub files: BTreeMap<String, Vec<u8>>,
    links: Vec<String>,
}

fn clean(p: &str) -> String {
    let trimmed = p.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".into()
    } else if trimmed.starts_with('/') {
        trimmed.into()
    } else {
        format!("/{}", trimmed)
    }
}

fn parent_of(p: &str) -> String {
    match p.rfind('/') {
        Some(0) | None => "/".into(),
        Some(idx) => p[..idx].into(),
    }
}

fn name_of(p: &str) -> String {
    p.rsplit('/').next().unwrap_or(p).to_string()
}

fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

impl Tree {
    fn exists(&self, p: &str) -> bool {
        p == "/" || self.dirs.contains(p) || self.files.contains_key(p)
    }

    /// `p`, or `p (1)`, `p (2)`... whichever is free.
    fn free_name(&self, p: &str) -> String {
        if !self.exists(p) {
            return p.to_string();
        }
        (1..)
            .map(|n| format!("{} ({})", p, n))
            .find(|candidate| !self.exists(candidate))
            .unwrap_or_default()
    }

    fn entries(&self, dir: &str) -> Vec<serde_json::Value> {
        let dirs = self.dirs.iter().filter(|d| parent_of(d) == dir).map(|d| {
            json!({"id": "0000", "type": "dir", "name": name_of(d), "permission": "rw", "mtime": 1700000000})
        });
        let files = self.files.iter().filter(|(f, _)| parent_of(f) == dir).map(|(f, data)| {
            json!({"id": "1111", "type": "file", "name": name_of(f), "size": data.len(),
                   "permission": "rw", "mtime": 1700000000, "is_locked": false})
        });
        dirs.chain(files).collect()
    }
}

#[derive(Clone, Copy)]
enum Op {
    ListDir,
    PostDir,
    DeleteDir,
    FileInfo,
    PostFile,
    DeleteFile,
    UploadLink,
    UpdateLink,
    DownloadLink,
    Upload,
    Update,
    Fetch,
}

struct Handler {
    tree: Arc<Mutex<Tree>>,
    base: String,
    op: Op,
}

impl Respond for Handler {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut tree = self.tree.lock().unwrap();
        let p = query(request, "p").map(|p| clean(&p)).unwrap_or_else(|| "/".into());

        match self.op {
            Op::ListDir => {
                if !tree.exists(&p) || tree.files.contains_key(&p) {
                    return ResponseTemplate::new(404).set_body_json(json!({"error_msg": "Folder not found."}));
                }
                let entries = tree.entries(&p);
                ResponseTemplate::new(200).set_body_json(json!({"dir_id": "d0", "user_perm": "rw", "dirent_list": entries}))
            }
            Op::PostDir => {
                let form = form(request);
                match form.get("operation").map(String::as_str) {
                    Some("mkdir") => {
                        let created = tree.free_name(&p);
                        tree.dirs.insert(created.clone());
                        ResponseTemplate::new(200).set_body_json(json!({
                            "type": "dir", "repo_id": REPO_ID, "parent_dir": parent_of(&created),
                            "obj_name": name_of(&created), "obj_id": "0000", "mtime": "2024-01-01T00:00:00+00:00"
                        }))
                    }
                    _ => ResponseTemplate::new(400).set_body_json(json!({"error_msg": "operation invalid."})),
                }
            }
            Op::DeleteDir => {
                let prefix = format!("{}/", p);
                tree.dirs.retain(|d| d != &p && !d.starts_with(&prefix));
                tree.files.retain(|f, _| !f.starts_with(&prefix));
                ResponseTemplate::new(200).set_body_json(json!({"success": true}))
            }
            Op::FileInfo => match tree.files.get(&p) {
                Some(data) => ResponseTemplate::new(200).set_body_json(json!({
                    "type": "file", "repo_id": REPO_ID, "parent_dir": parent_of(&p), "obj_name": name_of(&p),
                    "obj_id": "1111", "size": data.len(), "mtime": "2024-01-01T00:00:00+00:00", "is_locked": false
                })),
                None => ResponseTemplate::new(404).set_body_json(json!({"error_msg": "File not found."})),
            },
            Op::PostFile => {
                let form = form(request);
                if form.get("operation").map(String::as_str) != Some("create") {
                    return ResponseTemplate::new(400).set_body_json(json!({"error_msg": "operation invalid."}));
                }
                if !tree.exists(&parent_of(&p)) {
                    return ResponseTemplate::new(404).set_body_json(json!({"error_msg": "Folder not found."}));
                }
                let created = tree.free_name(&p);
                tree.files.insert(created.clone(), Vec::new());
                ResponseTemplate::new(200).set_body_json(json!({
                    "type": "file", "repo_id": REPO_ID, "parent_dir": parent_of(&created),
                    "obj_name": name_of(&created), "obj_id": "1111", "size": 0
                }))
            }
            Op::DeleteFile => {
                tree.files.remove(&p);
                ResponseTemplate::new(200).set_body_json(json!({"success": true}))
            }
            Op::UploadLink => ResponseTemplate::new(200)
                .set_body_string(format!("\"{}/seafhttp/upload-api/u1\"", self.base)),
            Op::UpdateLink => ResponseTemplate::new(200)
                .set_body_string(format!("\"{}/seafhttp/update-api/u2\"", self.base)),
            Op::DownloadLink => {
                if !tree.files.contains_key(&p) {
                    return ResponseTemplate::new(404).set_body_json(json!({"error_msg": "File not found."}));
                }
                tree.links.push(p.clone());
                let n = tree.links.len() - 1;
                ResponseTemplate::new(200).set_body_string(format!("\"{}/seafhttp/files/{}\"", self.base, n))
            }
            Op::Upload => {
                let parts = parse_multipart(&request.body);
                let parent = clean(&field(&parts, "parent_dir").unwrap_or_default());
                let mut answer = Vec::new();
                for part in parts.iter().filter(|p| p.name == "file") {
                    let name = part.filename.clone().unwrap_or_default();
                    let target = tree.free_name(&join(&parent, &name));
                    tree.files.insert(target.clone(), part.data.clone());
                    answer.push(json!({"name": name_of(&target), "id": "2222", "size": part.data.len()}));
                }
                ResponseTemplate::new(200).set_body_json(answer)
            }
            Op::Update => {
                let parts = parse_multipart(&request.body);
                let target = clean(&field(&parts, "target_file").unwrap_or_default());
                let content = parts.iter().find(|p| p.name == "file").map(|p| p.data.clone());
                match (tree.files.contains_key(&target), content) {
                    (true, Some(data)) => {
                        tree.files.insert(target, data);
                        ResponseTemplate::new(200).set_body_string("3333")
                    }
                    _ => ResponseTemplate::new(400).set_body_string("File does not exist"),
                }
            }
            Op::Fetch => {
                let n: usize = request
                    .url
                    .path()
                    .rsplit('/')
                    .next()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(usize::MAX);
                let data = tree.links.get(n).and_then(|p| tree.files.get(p)).cloned();
                match data {
                    Some(data) => ResponseTemplate::new(200).set_body_bytes(data),
                    None => ResponseTemplate::new(404).set_body_string("not found"),
                }
            }
        }
    }
}

/// Fake library `REPO_ID` served by `server`. Returns the shared tree so tests
/// can inspect it.
pub async fn mount_fake_library(server: &MockServer) -> Arc<Mutex<Tree>> {
    let tree = Arc::new(Mutex::new(Tree::default()));
    let base = server.uri();
    let v21 = format!("/api/v2.1/repos/{}", REPO_ID);
    let v2 = format!("/api2/repos/{}", REPO_ID);

    let authed = [
        ("GET", format!("{}/dir/", v21), Op::ListDir),
        ("POST", format!("{}/dir/", v21), Op::PostDir),
        ("DELETE", format!("{}/dir/", v21), Op::DeleteDir),
        ("GET", format!("{}/file/", v21), Op::FileInfo),
        ("POST", format!("{}/file/", v21), Op::PostFile),
        ("DELETE", format!("{}/file/", v21), Op::DeleteFile),
        ("GET", format!("{}/upload-link/", v2), Op::UploadLink),
        ("GET", format!("{}/update-link/", v2), Op::UpdateLink),
        ("GET", format!("{}/file/", v2), Op::DownloadLink),
    ];
    for (verb, route, op) in authed {
        Mock::given(method(verb))
            .and(path(route.as_str()))
            .and(header("Authorization", AUTH_VALUE))
            .respond_with(Handler {
                tree: tree.clone(),
                base: base.clone(),
                op,
            })
            .mount(server)
            .await;
    }

    let transfers = [
        ("POST", "/seafhttp/upload-api/u1", Op::Upload),
        ("POST", "/seafhttp/update-api/u2", Op::Update),
    ];
    for (verb, route, op) in transfers {
        Mock::given(method(verb))
            .and(path(route))
            .and(NoAuthHeader)
            .respond_with(Handler {
                tree: tree.clone(),
                base: base.clone(),
                op,
            })
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path_regex(r"^/seafhttp/files/\d+$"))
        .and(NoAuthHeader)
        .respond_with(Handler {
            tree: tree.clone(),
            base,
            op: Op::Fetch,
        })
        .mount(server)
        .await;

    tree
}
