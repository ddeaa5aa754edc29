// Account information of the logged-in user.

use crate::client::{decode_json, expect_ok, send, ApiVersion, Client};
use crate::error::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Quota value the server uses for "no limit".
pub const UNLIMITED_QUOTA: i64 = -2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// Bytes in use.
    #[serde(default)]
    pub usage: i64,
    /// Quota in bytes; `UNLIMITED_QUOTA` when unrestricted.
    #[serde(default)]
    pub total: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
}

impl Account {
    pub fn is_unlimited(&self) -> bool {
        self.total == UNLIMITED_QUOTA
    }
}

impl Client {
    /// `GET /api2/account/info/`
    pub fn account_info(&self) -> Result<Account> {
        let resp = send(self.request(Method::GET, ApiVersion::V2, "/account/info/")?)?;
        decode_json(expect_ok(resp)?)
    }
}
