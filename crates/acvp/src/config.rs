//! Session configuration.

use alloc::string::String;

use serde::{Deserialize, Serialize};

/// Configures a [`Session`][crate::Session].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// The protocol version written into the response envelope.
    pub acv_version: String,
    /// The `vsId` to answer with when a vector set omits one.
    pub vs_id: u64,
    /// Pretty-print serialized responses.
    pub pretty: bool,
}

impl Config {
    /// The ACVP protocol version.
    pub const ACV_VERSION: &'static str = "1.0";
}

impl Default for Config {
    fn default() -> Self {
        Self {
            acv_version: String::from(Self::ACV_VERSION),
            vs_id: 0,
            pretty: true,
        }
    }
}
