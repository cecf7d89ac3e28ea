use std::path::Path;
use std::time::Duration;

use tokio::fs;

use crate::{
    constants::{ARTIFACT_RELATIVE_PATH, SOURCE_RELATIVE_PATH},
    core::domain::BuildStep,
    core::traits::toolchain::{StepOutput, Toolchain, ToolchainError},
};

pub const STUB_VERSION: &str = "cargo 0.0.0 (stub)";
pub const STUB_ABI: &str = "interface IContract {\n}\n";
pub const STUB_GAS_OUTPUT: &str = "deployment tx gas: 1234\n";

/// In-process toolchain that "builds" by copying the source into the artifact path.
#[derive(Debug, Clone)]
pub struct ToolchainStub {
    delay: Duration,
    available: bool,
    check_stderr: Option<String>,
}

impl ToolchainStub {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            available: true,
            check_stderr: None,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(Duration::ZERO)
        }
    }

    /// Makes the check step fail with the given compiler output.
    pub fn with_check_failure(mut self, stderr: &str) -> Self {
        self.check_stderr = Some(stderr.to_string());
        self
    }
}

#[async_trait::async_trait]
impl Toolchain for ToolchainStub {
    async fn probe(&self) -> Option<String> {
        self.available.then(|| STUB_VERSION.to_string())
    }

    #[tracing::instrument]
    async fn invoke(&self, step: BuildStep, workdir: &Path) -> Result<StepOutput, ToolchainError> {
        tokio::time::sleep(self.delay).await;

        let io_err = |e: std::io::Error| ToolchainError::Io {
            step,
            msg: e.to_string(),
        };

        let output = match step {
            BuildStep::Check => match &self.check_stderr {
                Some(stderr) => StepOutput {
                    success: false,
                    stdout: String::new(),
                    stderr: stderr.clone(),
                },
                None => StepOutput {
                    success: true,
                    ..Default::default()
                },
            },
            BuildStep::Build => {
                let source = fs::read(workdir.join(SOURCE_RELATIVE_PATH))
                    .await
                    .map_err(io_err)?;
                let artifact = workdir.join(ARTIFACT_RELATIVE_PATH);
                if let Some(parent) = artifact.parent() {
                    fs::create_dir_all(parent).await.map_err(io_err)?;
                }
                fs::write(&artifact, source).await.map_err(io_err)?;
                StepOutput {
                    success: true,
                    ..Default::default()
                }
            }
            BuildStep::ExportAbi => StepOutput {
                success: true,
                stdout: STUB_ABI.to_string(),
                stderr: String::new(),
            },
            BuildStep::EstimateGas => StepOutput {
                success: true,
                stdout: STUB_GAS_OUTPUT.to_string(),
                stderr: String::new(),
            },
        };

        tracing::debug!("Stub {} result: {:?}", step, output);
        Ok(output)
    }
}
