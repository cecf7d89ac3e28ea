use std::path::Path;

use crate::core::domain::BuildStep;

#[mockall::automock]
#[async_trait::async_trait]
pub trait Toolchain: std::fmt::Debug + Send + Sync {
    /// Returns the toolchain version when it is installed and answering.
    async fn probe(&self) -> Option<String>;

    /// Runs one build step inside `workdir`. Dropping the returned future
    /// must stop the underlying process.
    async fn invoke(&self, step: BuildStep, workdir: &Path) -> Result<StepOutput, ToolchainError>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolchainError {
    #[error("Failed to launch toolchain for {step}: {msg}")]
    Launch { step: BuildStep, msg: String },
    #[error("I/O error during {step}: {msg}")]
    Io { step: BuildStep, msg: String },
}
