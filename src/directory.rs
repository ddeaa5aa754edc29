// Directory listing and directory operations inside a library.
//
// Directories have no stable id: everything is addressed by path and
// re-fetched on every call.

use crate::client::{decode_json, expect_ok, expect_status, send, ApiVersion, OPERATION_OK};
use crate::error::Result;
use crate::library::Repo;
use chrono::{DateTime, Local, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Dir => "dir",
        }
    }
}

/// Modification time as the server sends it: Unix seconds from the listing
/// endpoints, an ISO-8601 string from the object views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mtime {
    Unix(i64),
    Text(String),
}

impl Mtime {
    pub fn to_local(&self) -> Option<DateTime<Local>> {
        match self {
            Mtime::Unix(secs) => DateTime::<Utc>::from_timestamp(*secs, 0).map(|t| t.with_timezone(&Local)),
            Mtime::Text(text) => DateTime::parse_from_rfc3339(text).ok().map(|t| t.with_timezone(&Local)),
        }
    }
}

/// One row of a directory listing. Lock and modifier fields are only sent
/// for files; `parent_dir` only for recursive listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirEntry {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub permission: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<Mtime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier_contact_email: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_owner_name: Option<String>,
    #[serde(default)]
    pub locked_by_me: bool,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Counters returned by `/dir/detail/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirDetail {
    #[serde(default)]
    pub repo_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub file_count: i64,
    #[serde(default)]
    pub dir_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<Mtime>,
}

/// Which entries a listing returns (`t` query parameter).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryFilter {
    #[default]
    All,
    Files,
    Dirs,
}

impl EntryFilter {
    fn query_value(self) -> Option<&'static str> {
        match self {
            EntryFilter::All => None,
            EntryFilter::Files => Some("f"),
            EntryFilter::Dirs => Some("d"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub filter: EntryFilter,
    pub recursive: bool,
}

// Older servers answer with a bare array, newer ones wrap it.
#[derive(Deserialize)]
#[serde(untagged)]
enum DirListing {
    Plain(Vec<DirEntry>),
    Wrapped { dirent_list: Vec<DirEntry> },
}

impl DirListing {
    fn into_entries(self) -> Vec<DirEntry> {
        match self {
            DirListing::Plain(entries) => entries,
            DirListing::Wrapped { dirent_list } => dirent_list,
        }
    }
}

/// Empty means the library root; a missing leading `/` is added.
pub(crate) fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

impl Repo<'_> {
    /// `POST /api/v2.1/repos/{id}/{resource}/?p=<path>` with a form-encoded
    /// `operation`. Success is judged by status only.
    pub(crate) fn operation(&self, resource: &str, path: &str, form: &[(&str, &str)]) -> Result<()> {
        let path = normalize_path(path);
        let req = self
            .client()
            .request(Method::POST, ApiVersion::V21, &self.path(&format!("/{}/", resource)))?
            .query(&[("p", path.as_str())])
            .form(form);
        expect_status(send(req)?, OPERATION_OK)?;
        info!(repo = %self.id(), resource = %resource, path = %path, form = ?form, "operation done");
        Ok(())
    }

    /// `DELETE /api/v2.1/repos/{id}/{resource}/?p=<path>`
    pub(crate) fn remove(&self, resource: &str, path: &str) -> Result<()> {
        let path = normalize_path(path);
        let req = self
            .client()
            .request(Method::DELETE, ApiVersion::V21, &self.path(&format!("/{}/", resource)))?
            .query(&[("p", path.as_str())]);
        expect_status(send(req)?, OPERATION_OK)?;
        info!(repo = %self.id(), resource = %resource, path = %path, "deleted");
        Ok(())
    }

    /// List the entries of directory `path`.
    pub fn list_entries(&self, path: &str, options: ListOptions) -> Result<Vec<DirEntry>> {
        let path = normalize_path(path);
        let mut query = vec![("p", path.as_str())];
        if let Some(t) = options.filter.query_value() {
            query.push(("t", t));
        }
        if options.recursive {
            query.push(("recursive", "1"));
        }

        let req = self
            .client()
            .request(Method::GET, ApiVersion::V21, &self.path("/dir/"))?
            .query(&query);
        let listing: DirListing = decode_json(expect_ok(send(req)?)?)?;
        Ok(listing.into_entries())
    }

    pub fn list_files(&self, path: &str) -> Result<Vec<DirEntry>> {
        self.list_entries(
            path,
            ListOptions {
                filter: EntryFilter::Files,
                recursive: false,
            },
        )
    }

    pub fn list_dirs(&self, path: &str) -> Result<Vec<DirEntry>> {
        self.list_entries(
            path,
            ListOptions {
                filter: EntryFilter::Dirs,
                recursive: false,
            },
        )
    }

    /// Every directory below `path`, at any depth.
    pub fn list_dir_tree(&self, path: &str) -> Result<Vec<DirEntry>> {
        self.list_entries(
            path,
            ListOptions {
                filter: EntryFilter::Dirs,
                recursive: true,
            },
        )
    }

    /// Create directory `path`. If it already exists the server creates a
    /// renamed sibling instead of failing.
    pub fn create_dir(&self, path: &str) -> Result<()> {
        self.operation("dir", path, &[("operation", "mkdir")])
    }

    /// Rename the last component of `path` to `new_name`.
    pub fn rename_dir(&self, path: &str, new_name: &str) -> Result<()> {
        self.operation("dir", path, &[("operation", "rename"), ("newname", new_name)])
    }

    /// Move directory `path` into `dst_dir` of library `dst_repo`.
    pub fn move_dir(&self, path: &str, dst_repo: &str, dst_dir: &str) -> Result<()> {
        self.operation(
            "dir",
            path,
            &[("operation", "move"), ("dst_repo", dst_repo), ("dst_dir", dst_dir)],
        )
    }

    /// Copy directory `path` into `dst_dir` of library `dst_repo`.
    pub fn copy_dir(&self, path: &str, dst_repo: &str, dst_dir: &str) -> Result<()> {
        self.operation(
            "dir",
            path,
            &[("operation", "copy"), ("dst_repo", dst_repo), ("dst_dir", dst_dir)],
        )
    }

    pub fn delete_dir(&self, path: &str) -> Result<()> {
        self.remove("dir", path)
    }

    /// Size and file/dir counters of directory `path`.
    pub fn dir_detail(&self, path: &str) -> Result<DirDetail> {
        let path = normalize_path(path);
        let req = self
            .client()
            .request(Method::GET, ApiVersion::V21, &self.path("/dir/detail/"))?
            .query(&[("path", path.as_str())]);
        decode_json(expect_ok(send(req)?)?)
    }
}
