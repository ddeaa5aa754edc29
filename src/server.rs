// Server version and feature flags.

use crate::client::{decode_json, expect_ok, send, ApiVersion, Client};
use crate::error::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerInfo {
    pub version: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_library_version: Option<u32>,
}

impl ServerInfo {
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

impl Client {
    /// `GET /api2/server-info/`
    pub fn server_info(&self) -> Result<ServerInfo> {
        let resp = send(self.request(Method::GET, ApiVersion::V2, "/server-info/")?)?;
        decode_json(expect_ok(resp)?)
    }
}
