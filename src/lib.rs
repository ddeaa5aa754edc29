// Library root
// -----------
// Blocking client for the Seafile REST API, plus the command handlers used
// by the `seafile` binary (`main.rs`).
//
// Module responsibilities:
// - `client`: session state (server address, token, options) and the one
//   authenticated transport every call goes through.
// - `auth`, `account`, `server`, `device`: account-level endpoints.
// - `library`, `directory`, `file`: libraries and the path-addressed tree
//   inside them, including upload/update/download links.
// - `cli`: the `ls` / `cp` commands, credential resolution and token
//   persistence for the binary.
//
// Nothing is cached: every read goes back to the server.
pub mod account;
pub mod auth;
pub mod cli;
pub mod client;
pub mod device;
pub mod directory;
pub mod error;
pub mod file;
pub mod library;
pub mod server;

pub use account::Account;
pub use client::{ApiVersion, Client, ClientOptions, Credentials};
pub use device::Device;
pub use directory::{DirDetail, DirEntry, EntryFilter, EntryKind, ListOptions, Mtime};
pub use error::{Result, SeafileError};
pub use file::{FileInfo, UploadedFile};
pub use library::{Library, LibraryType, Repo};
pub use server::ServerInfo;
