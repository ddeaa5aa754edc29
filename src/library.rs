// Libraries (repos): listing, lookup, and the borrowed `Repo` handle that
// directory and file operations hang off.

use crate::client::{decode_json, expect_ok, send, ApiVersion, Client};
use crate::error::{Result, SeafileError};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Filter accepted by the `type` query parameter of the library listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryType {
    /// Owned by the current user.
    Mine,
    /// Shared with the user personally.
    Shared,
    /// Shared with one of the user's groups.
    Group,
    /// Public within the organisation.
    Org,
}

impl LibraryType {
    pub fn as_str(self) -> &'static str {
        match self {
            LibraryType::Mine => "mine",
            LibraryType::Shared => "shared",
            LibraryType::Group => "group",
            LibraryType::Org => "org",
        }
    }
}

/// One library as returned by the listing or detail endpoints.
///
/// The listing (`/api2/repos/`) and the detail view (`/api/v2.1/repos/{id}/`)
/// spell some keys differently and carry different extras, and servers send
/// `null` for unset values. Only `id` and `name` are required; the whole
/// record is kept as received and written back unchanged on serialisation.
/// Everything else is read through the accessors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Library {
    /// `id` in the listing, `repo_id` in the detail view.
    pub id: String,
    /// `name` in the listing, `repo_name` in the detail view.
    pub name: String,
    fields: Map<String, Value>,
}

const ID_KEYS: [&str; 2] = ["id", "repo_id"];
const NAME_KEYS: [&str; 2] = ["name", "repo_name"];

fn first_str<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| fields.get(*key).and_then(Value::as_str))
}

// Write `value` back under whichever spelling the record arrived with.
fn put_back(fields: &mut Map<String, Value>, keys: [&str; 2], value: String) {
    let key = if !fields.contains_key(keys[0]) && fields.contains_key(keys[1]) {
        keys[1]
    } else {
        keys[0]
    };
    fields.insert(key.to_string(), Value::String(value));
}

impl TryFrom<Map<String, Value>> for Library {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let id = first_str(&fields, &ID_KEYS)
            .ok_or_else(|| "library record has no string id".to_string())?
            .to_string();
        let name = first_str(&fields, &NAME_KEYS)
            .ok_or_else(|| format!("library {} has no string name", id))?
            .to_string();
        Ok(Library { id, name, fields })
    }
}

impl From<Library> for Map<String, Value> {
    fn from(library: Library) -> Self {
        let Library { id, name, mut fields } = library;
        put_back(&mut fields, ID_KEYS, id);
        put_back(&mut fields, NAME_KEYS, name);
        fields
    }
}

impl Library {
    /// Raw value of any key, `null` included.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Owner email; `owner` in the listing, `owner_email` in the detail view.
    pub fn owner(&self) -> Option<&str> {
        first_str(&self.fields, &["owner", "owner_email"])
    }

    /// `rw`, `r`... Empty when the server sends nothing usable.
    pub fn permission(&self) -> &str {
        first_str(&self.fields, &["permission"]).unwrap_or_default()
    }

    pub fn size(&self) -> i64 {
        self.get("size").and_then(Value::as_i64).unwrap_or(0)
    }

    pub fn encrypted(&self) -> bool {
        self.get("encrypted").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Unix seconds of the last change.
    pub fn mtime(&self) -> Option<i64> {
        self.get("mtime").and_then(Value::as_i64)
    }

    /// `repo`, `srepo`, `grepo`...
    pub fn kind(&self) -> Option<&str> {
        first_str(&self.fields, &["type"])
    }

    pub fn is_virtual(&self) -> bool {
        self.get("virtual").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn file_count(&self) -> Option<i64> {
        self.get("file_count").and_then(Value::as_i64)
    }
}

#[derive(Debug, Deserialize)]
struct DefaultLibrary {
    #[serde(default)]
    exists: bool,
    #[serde(default)]
    repo_id: Option<String>,
}

/// Borrowed handle to one library on one client.
///
/// Holds no state besides the library id; every call goes to the server.
#[derive(Debug, Clone)]
pub struct Repo<'c> {
    client: &'c Client,
    id: String,
}

impl<'c> Repo<'c> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn client(&self) -> &'c Client {
        self.client
    }

    /// `/repos/{id}{suffix}`, relative to an API prefix.
    pub(crate) fn path(&self, suffix: &str) -> String {
        format!("/repos/{}{}", self.id, suffix)
    }

    /// Fetch the library record this handle points at.
    pub fn fetch(&self) -> Result<Library> {
        self.client.get_library(&self.id)
    }
}

impl Client {
    /// Handle for directory and file operations inside library `id`.
    pub fn repo(&self, id: impl Into<String>) -> Repo<'_> {
        Repo {
            client: self,
            id: id.into(),
        }
    }

    /// `GET /api2/repos/`, optionally filtered by library type.
    pub fn list_libraries(&self, kind: Option<LibraryType>) -> Result<Vec<Library>> {
        let mut req = self.request(Method::GET, ApiVersion::V2, "/repos/")?;
        if let Some(kind) = kind {
            req = req.query(&[("type", kind.as_str())]);
        }
        let libraries: Vec<Library> = decode_json(expect_ok(send(req)?)?)?;
        debug!(count = libraries.len(), kind = ?kind, "listed libraries");
        Ok(libraries)
    }

    pub fn list_all_libraries(&self) -> Result<Vec<Library>> {
        self.list_libraries(None)
    }

    pub fn list_owned_libraries(&self) -> Result<Vec<Library>> {
        self.list_libraries(Some(LibraryType::Mine))
    }

    pub fn list_shared_libraries(&self) -> Result<Vec<Library>> {
        self.list_libraries(Some(LibraryType::Shared))
    }

    pub fn list_group_libraries(&self) -> Result<Vec<Library>> {
        self.list_libraries(Some(LibraryType::Group))
    }

    pub fn list_org_libraries(&self) -> Result<Vec<Library>> {
        self.list_libraries(Some(LibraryType::Org))
    }

    /// `GET /api/v2.1/repos/{id}/`
    pub fn get_library(&self, id: &str) -> Result<Library> {
        let req = self.request(Method::GET, ApiVersion::V21, &format!("/repos/{}/", id))?;
        decode_json(expect_ok(send(req)?)?)
    }

    /// Id of the user's default library (`GET /api2/default-repo/`).
    pub fn default_library_id(&self) -> Result<String> {
        let req = self.request(Method::GET, ApiVersion::V2, "/default-repo/")?;
        let answer: DefaultLibrary = decode_json(expect_ok(send(req)?)?)?;
        match answer.repo_id {
            Some(id) if answer.exists && !id.is_empty() => Ok(id),
            _ => Err(SeafileError::NotFound("default library".into())),
        }
    }

    /// Find a library by its display name. The server has no name filter, so
    /// this lists everything and scans. An empty name means the default
    /// library.
    pub fn get_library_by_name(&self, name: &str) -> Result<Library> {
        if name.is_empty() {
            let id = self.default_library_id()?;
            return self.get_library(&id);
        }

        self.list_all_libraries()?
            .into_iter()
            .find(|library| library.name == name)
            .ok_or_else(|| SeafileError::NotFound(format!("library {:?}", name)))
    }
}
