// File operations inside a library, plus content transfer through
// server-issued upload/update/download links.
//
// Transfer links are pre-authorised and may point at a different host, so
// the final hop goes out on the plain HTTP client without the token header.

use crate::client::{decode_json, expect_ok, parse_quoted_link, send, strip_one_quote_pair, ApiVersion};
use crate::directory::{normalize_path, Mtime};
use crate::error::{Result, SeafileError};
use crate::library::Repo;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::RequestBuilder;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, info};

/// File metadata from `GET /api/v2.1/repos/{id}/file/?p=`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileInfo {
    #[serde(rename = "obj_id", default)]
    pub id: String,
    #[serde(rename = "obj_name")]
    pub name: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<Mtime>,
    #[serde(default)]
    pub repo_id: String,
    #[serde(default)]
    pub parent_dir: String,
    #[serde(default)]
    pub is_locked: bool,
}

impl FileInfo {
    /// Full path of the file inside its library.
    pub fn path(&self) -> String {
        join_path(&self.parent_dir, &self.name)
    }
}

/// One item of the upload answer when `ret-json=1` is requested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub size: i64,
}

pub(crate) fn join_path(parent: &str, name: &str) -> String {
    let parent = normalize_path(parent);
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Last path component, used as the multipart file name.
pub(crate) fn base_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

fn octet_stream(content: Vec<u8>, name: &str) -> Result<Part> {
    Ok(Part::bytes(content)
        .file_name(name.to_string())
        .mime_str("application/octet-stream")?)
}

impl Repo<'_> {
    fn fetch_link(&self, req: RequestBuilder) -> Result<String> {
        let body = expect_ok(send(req)?)?.text()?;
        let link = parse_quoted_link(&body)?;
        debug!(repo = %self.id(), link = %link, "got transfer link");
        Ok(link)
    }

    /// Metadata of the file at `path`.
    pub fn file_info(&self, path: &str) -> Result<FileInfo> {
        let path = normalize_path(path);
        let req = self
            .client()
            .request(Method::GET, ApiVersion::V21, &self.path("/file/"))?
            .query(&[("p", path.as_str())]);
        decode_json(expect_ok(send(req)?)?)
    }

    /// Create an empty file. If `path` exists the server creates a renamed
    /// sibling; use `touch_file` to avoid that.
    pub fn create_file(&self, path: &str) -> Result<()> {
        self.operation("file", path, &[("operation", "create")])
    }

    /// Return the file at `path`, creating it first when the server reports
    /// it missing.
    pub fn touch_file(&self, path: &str) -> Result<FileInfo> {
        match self.file_info(path) {
            Ok(info) => Ok(info),
            Err(SeafileError::Protocol {
                status: StatusCode::NOT_FOUND,
                ..
            }) => {
                self.create_file(path)?;
                self.file_info(path)
            }
            Err(e) => Err(e),
        }
    }

    pub fn rename_file(&self, path: &str, new_name: &str) -> Result<()> {
        self.operation("file", path, &[("operation", "rename"), ("newname", new_name)])
    }

    /// Move file `path` into `dst_dir` of library `dst_repo`.
    pub fn move_file(&self, path: &str, dst_repo: &str, dst_dir: &str) -> Result<()> {
        self.operation(
            "file",
            path,
            &[("operation", "move"), ("dst_repo", dst_repo), ("dst_dir", dst_dir)],
        )
    }

    /// Server-side copy of `path` into `dst_dir` of library `dst_repo`. No
    /// content passes through the client.
    pub fn copy_file(&self, path: &str, dst_repo: &str, dst_dir: &str) -> Result<()> {
        self.operation(
            "file",
            path,
            &[("operation", "copy"), ("dst_repo", dst_repo), ("dst_dir", dst_dir)],
        )
    }

    pub fn delete_file(&self, path: &str) -> Result<()> {
        self.remove("file", path)
    }

    /// Link for uploading new files into `parent_dir`.
    pub fn upload_link(&self, parent_dir: &str) -> Result<String> {
        let parent_dir = normalize_path(parent_dir);
        let req = self
            .client()
            .request(Method::GET, ApiVersion::V2, &self.path("/upload-link/"))?
            .query(&[("p", parent_dir.as_str())]);
        self.fetch_link(req)
    }

    /// Link for replacing the content of existing files.
    pub fn update_link(&self) -> Result<String> {
        let req = self
            .client()
            .request(Method::GET, ApiVersion::V2, &self.path("/update-link/"))?;
        self.fetch_link(req)
    }

    /// Link for fetching the content of `path`. Asks for a reusable link when
    /// `ClientOptions::reuse_download_links` is set.
    pub fn download_link(&self, path: &str) -> Result<String> {
        let path = normalize_path(path);
        let mut req = self
            .client()
            .request(Method::GET, ApiVersion::V2, &self.path("/file/"))?
            .query(&[("p", path.as_str())]);
        if self.client().options().reuse_download_links {
            req = req.query(&[("reuse", "1")]);
        }
        self.fetch_link(req)
    }

    /// Upload new files into `parent_dir`, which must end with `/`. Existing
    /// names get renamed copies on the server.
    pub fn upload_files(&self, parent_dir: &str, files: Vec<(String, Vec<u8>)>) -> Result<Vec<UploadedFile>> {
        if !parent_dir.ends_with('/') {
            return Err(SeafileError::InvalidArgument(format!(
                "upload directory {:?} must end with '/'",
                parent_dir
            )));
        }
        if files.is_empty() {
            return Err(SeafileError::InvalidArgument("nothing to upload".into()));
        }

        let parent_dir = normalize_path(parent_dir);
        let link = self.upload_link(&parent_dir)?;

        let mut form = Form::new();
        for (name, content) in files {
            let part = octet_stream(content, &name)?;
            form = form.part("file", part);
        }
        form = form.text("parent_dir", parent_dir.clone());

        let req = self
            .client()
            .http()
            .post(&link)
            .query(&[("ret-json", "1")])
            .multipart(form);
        let uploaded: Vec<UploadedFile> = decode_json(expect_ok(send(req)?)?)?;
        info!(repo = %self.id(), parent_dir = %parent_dir, count = uploaded.len(), "uploaded");
        Ok(uploaded)
    }

    /// Upload one file named `name` into `parent_dir`.
    pub fn upload_file(&self, parent_dir: &str, name: &str, content: Vec<u8>) -> Result<UploadedFile> {
        self.upload_files(parent_dir, vec![(name.to_string(), content)])?
            .into_iter()
            .next()
            .ok_or_else(|| SeafileError::Decode("upload answer lists no files".into()))
    }

    /// Replace the content of the existing file `target_file`. Returns the id
    /// of the new file object.
    pub fn update_file(&self, target_file: &str, content: Vec<u8>) -> Result<String> {
        let target_file = normalize_path(target_file);
        let link = self.update_link()?;

        let form = Form::new()
            .part("file", octet_stream(content, base_name(&target_file))?)
            .text("target_file", target_file.clone());

        let req = self.client().http().post(&link).multipart(form);
        let body = expect_ok(send(req)?)?.text()?;
        info!(repo = %self.id(), target_file = %target_file, "updated");
        let trimmed = body.trim();
        Ok(strip_one_quote_pair(trimmed).unwrap_or(trimmed).to_string())
    }

    /// Fetch the full content of `path`.
    pub fn download_file(&self, path: &str) -> Result<Vec<u8>> {
        let link = self.download_link(path)?;
        let resp = expect_ok(send(self.client().http().get(&link))?)?;
        Ok(resp.bytes()?.to_vec())
    }

    /// Stream the content of `path` into `out`, returning the byte count.
    pub fn download_file_to<W: Write + ?Sized>(&self, path: &str, out: &mut W) -> Result<u64> {
        let link = self.download_link(path)?;
        let mut resp = expect_ok(send(self.client().http().get(&link))?)?;
        let written = resp.copy_to(out)?;
        debug!(repo = %self.id(), path = %path, bytes = written, "downloaded");
        Ok(written)
    }
}
