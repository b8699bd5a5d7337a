//! Wire types for the server's `slim.request` JSON-RPC endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const METHOD: &str = "slim.request";
pub const REQUEST_ID: u32 = 1;
/// Player id slot in `params`; `0` addresses the server itself.
pub const SERVER_PLAYER: u32 = 0;

/// A `rescan` CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RescanCommand {
    /// `rescan ?`
    Status,
    /// `rescan`
    Full,
    /// `rescan full <file-uri>`, limited to one file or directory.
    Path { uri: String },
}

impl RescanCommand {
    pub fn args(&self) -> Vec<&str> {
        match self {
            RescanCommand::Status => vec!["rescan", "?"],
            RescanCommand::Full => vec!["rescan"],
            RescanCommand::Path { uri } => vec!["rescan", "full", uri.as_str()],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcPayload<'a> {
    pub id: u32,
    pub method: &'static str,
    pub params: (u32, Vec<&'a str>),
}

impl<'a> JsonRpcPayload<'a> {
    pub fn new(command: &'a RescanCommand) -> Self {
        Self {
            id: REQUEST_ID,
            method: METHOD,
            params: (SERVER_PLAYER, command.args()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
}

impl JsonRpcResponse {
    /// Reads `result._rescan`; `Err` describes what was wrong with it.
    /// Whole floats such as `1.0` are accepted as their integer value.
    pub fn rescan_flag(&self) -> Result<i64, String> {
        let result = self.result.as_ref().ok_or("missing 'result'")?;
        let flag = result.get("_rescan").ok_or("missing 'result._rescan'")?;
        flag.as_i64()
            .or_else(|| {
                flag.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .ok_or_else(|| format!("'result._rescan' is not an integer: {flag}"))
    }
}
