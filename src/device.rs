// Devices (desktop and mobile clients) linked to the account.

use crate::client::{decode_json, expect_ok, send, ApiVersion, Client};
use crate::error::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    #[serde(default)]
    pub user: String,
    pub device_id: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub platform_version: String,
    #[serde(default)]
    pub client_version: String,
    #[serde(default)]
    pub last_login_ip: String,
    /// ISO-8601 timestamp as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiped_at: Option<String>,
    #[serde(default)]
    pub is_desktop_client: bool,
}

impl Client {
    /// `GET /api2/devices/`
    pub fn list_devices(&self) -> Result<Vec<Device>> {
        let resp = send(self.request(Method::GET, ApiVersion::V2, "/devices/")?)?;
        decode_json(expect_ok(resp)?)
    }

    /// Revoke the token of one linked device.
    pub fn unlink_device(&self, device_id: &str, platform: &str) -> Result<()> {
        let req = self
            .request(Method::DELETE, ApiVersion::V2, "/devices/")?
            .form(&[("device_id", device_id), ("platform", platform)]);
        expect_ok(send(req)?)?;
        info!(device_id = %device_id, platform = %platform, "device unlinked");
        Ok(())
    }
}
