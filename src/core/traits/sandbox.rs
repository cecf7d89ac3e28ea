use serde::{Deserialize, Serialize};

#[mockall::automock]
#[async_trait::async_trait]
pub trait RemoteSandbox: std::fmt::Debug + Send + Sync {
    async fn execute(&self, request: &SandboxRequest) -> Result<SandboxResponse, SandboxError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxRequest {
    pub channel: String,
    pub mode: String,
    pub edition: String,
    pub crate_type: String,
    pub tests: bool,
    pub backtrace: bool,
    pub code: String,
}

impl SandboxRequest {
    /// Fixed channel/mode/edition used for every fallback check.
    pub fn for_code(code: String) -> Self {
        SandboxRequest {
            channel: "stable".to_string(),
            mode: "debug".to_string(),
            edition: "2021".to_string(),
            crate_type: "bin".to_string(),
            tests: false,
            backtrace: false,
            code,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SandboxResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SandboxError {
    #[error("Sandbox request failed: {0}")]
    Http(String),
    #[error("Sandbox answered with status {0}")]
    Status(u16),
    #[error("Sandbox response could not be decoded: {0}")]
    Decode(String),
    #[error("Sandbox did not answer in time")]
    Timeout,
}
