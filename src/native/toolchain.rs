use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::{process::Command, time::timeout};

use crate::{
    constants::{PROBE_BUDGET, WASM_TARGET},
    core::{
        domain::BuildStep,
        traits::toolchain::{StepOutput, Toolchain, ToolchainError},
    },
};

#[derive(Clone, Debug)]
pub struct NativeToolchain {
    cargo_path: PathBuf,
}

impl NativeToolchain {
    pub fn new<T>(cargo_path: T) -> Self
    where
        T: AsRef<Path>,
    {
        NativeToolchain {
            cargo_path: cargo_path.as_ref().into(),
        }
    }

    fn command(&self, step: BuildStep) -> Command {
        let mut cmd = Command::new(&self.cargo_path);
        match step {
            BuildStep::Check => cmd.args(["check", "--lib", "--target", WASM_TARGET]),
            BuildStep::Build => cmd.args(["build", "--lib", "--release", "--target", WASM_TARGET]),
            BuildStep::ExportAbi => cmd.args(["stylus", "export-abi"]),
            BuildStep::EstimateGas => cmd.args(["stylus", "deploy", "--estimate-gas", "--no-verify"]),
        };
        if matches!(step, BuildStep::Check | BuildStep::Build) {
            cmd.args(["--color", "never"]);
        }
        cmd
    }
}

#[async_trait::async_trait]
impl Toolchain for NativeToolchain {
    #[tracing::instrument]
    async fn probe(&self) -> Option<String> {
        let output = Command::new(&self.cargo_path)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        match timeout(PROBE_BUDGET, output).await {
            Ok(Ok(output)) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            }
            other => {
                tracing::debug!("Toolchain probe failed: {:?}", other);
                None
            }
        }
    }

    #[tracing::instrument]
    async fn invoke(&self, step: BuildStep, workdir: &Path) -> Result<StepOutput, ToolchainError> {
        let mut command = self.command(step);
        command
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own group, so rustc and build scripts spawned by cargo can be
        // killed together with it.
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| ToolchainError::Launch {
            step,
            msg: e.to_string(),
        })?;
        // A caller's timeout drops this future; the guard then takes the
        // whole group down before the build directory is removed.
        let group = ProcessGroupGuard::new(child.id());

        let out = child
            .wait_with_output()
            .await
            .map_err(|e| ToolchainError::Io {
                step,
                msg: e.to_string(),
            })?;
        group.disarm();

        Ok(StepOutput {
            success: out.status.success(),
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        })
    }
}

/// Kills the step's process group when dropped before being disarmed.
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn disarm(mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    #[cfg(unix)]
    fn drop(&mut self) {
        let Some(pgid) = self.pgid.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
            return;
        };
        // SAFETY: killpg takes plain integers and only sends a signal.
        if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
            tracing::debug!(
                "Process group {} already gone: {}",
                pgid,
                std::io::Error::last_os_error()
            );
        } else {
            tracing::debug!("Killed process group {}", pgid);
        }
    }

    #[cfg(not(unix))]
    fn drop(&mut self) {
        self.pgid = None;
    }
}
