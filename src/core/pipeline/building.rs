use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tokio::sync::mpsc::Sender;
use tokio::time::timeout;

use crate::{
    constants::{BUILD_BUDGET, CHECK_BUDGET, ESTIMATE_GAS_BUDGET, EXPORT_ABI_BUDGET, INSTALL_HINT},
    core::{
        diagnostics::{parse_contract_diagnostics, parse_diagnostics},
        domain::{
            ArtifactProvenance, BuildRequest, BuildResult, BuildStage, BuildStep, Diagnostic,
            FailureKind, Severity, SyntaxCheck,
        },
        pipeline::environment::BuildEnvironment,
        traits::toolchain::{StepOutput, Toolchain},
    },
};

const SYNTAX_CHECK_PROJECT: &str = "syntax-check";

static GAS_FIGURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)gas[^0-9\n]*([0-9][0-9,_]*)").expect("gas pattern is valid")
});

/// Time allowed for each toolchain step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildBudgets {
    pub check: Duration,
    pub build: Duration,
    pub export_abi: Duration,
    pub estimate_gas: Duration,
}

impl Default for BuildBudgets {
    fn default() -> Self {
        Self {
            check: CHECK_BUDGET,
            build: BUILD_BUDGET,
            export_abi: EXPORT_ABI_BUDGET,
            estimate_gas: ESTIMATE_GAS_BUDGET,
        }
    }
}

impl BuildBudgets {
    fn for_step(&self, step: BuildStep) -> Duration {
        match step {
            BuildStep::Check => self.check,
            BuildStep::Build => self.build,
            BuildStep::ExportAbi => self.export_abi,
            BuildStep::EstimateGas => self.estimate_gas,
        }
    }
}

/// Drives one contract build from source text to artifact or diagnostics.
///
/// Each invocation works in its own [`BuildEnvironment`]; nothing is shared
/// between invocations except the root directory they are created under.
#[derive(Clone, Debug)]
pub struct BuildOrchestrator {
    toolchain: Arc<dyn Toolchain>,
    root: PathBuf,
    budgets: BuildBudgets,
}

type StepFailure = (FailureKind, Diagnostic);

impl BuildOrchestrator {
    pub fn new<T>(toolchain: Arc<dyn Toolchain>, root: T) -> Self
    where
        T: AsRef<Path>,
    {
        BuildOrchestrator {
            toolchain,
            root: root.as_ref().into(),
            budgets: BuildBudgets::default(),
        }
    }

    pub fn with_budgets(mut self, budgets: BuildBudgets) -> Self {
        self.budgets = budgets;
        self
    }

    pub async fn is_toolchain_available(&self) -> bool {
        self.toolchain.probe().await.is_some()
    }

    pub async fn toolchain_version(&self) -> Option<String> {
        self.toolchain.probe().await
    }

    pub async fn compile(&self, request: &BuildRequest) -> BuildResult {
        self.compile_with_progress(request, None).await
    }

    #[tracing::instrument(skip(self, request, progress), fields(project = %request.project_name))]
    pub async fn compile_with_progress(
        &self,
        request: &BuildRequest,
        progress: Option<&Sender<BuildStage>>,
    ) -> BuildResult {
        if !self.is_toolchain_available().await {
            tracing::warn!("Toolchain unavailable, refusing to build");
            return toolchain_unavailable();
        }

        report(progress, BuildStage::Preparing).await;
        let env = match BuildEnvironment::create(
            &self.root,
            &request.project_name,
            &request.source_text,
        )
        .await
        {
            Ok(env) => env,
            Err(e) => {
                tracing::error!("Failed to prepare build environment: {}", e);
                return BuildResult::single_error(FailureKind::Environment, &e.to_string(), None);
            }
        };

        let result = self.run_pipeline(&env, progress).await;
        drop(env);

        tracing::info!(
            "Build finished: success={}, errors={}, warnings={}",
            result.is_success(),
            result.errors().len(),
            result.warnings().len()
        );
        result
    }

    /// Runs only the check step and reports whether the source compiles.
    #[tracing::instrument(skip(self, source))]
    pub async fn validate_syntax_only(&self, source: &str) -> SyntaxCheck {
        if !self.is_toolchain_available().await {
            return SyntaxCheck {
                valid: false,
                errors: toolchain_unavailable().errors().to_vec(),
            };
        }

        let env = match BuildEnvironment::create(&self.root, SYNTAX_CHECK_PROJECT, source).await {
            Ok(env) => env,
            Err(e) => {
                tracing::error!("Failed to prepare build environment: {}", e);
                return SyntaxCheck {
                    valid: false,
                    errors: vec![Diagnostic::new(Severity::Error, &e.to_string())],
                };
            }
        };

        match self.run_step(BuildStep::Check, &env, None).await {
            Ok(output) => {
                let (errors, _) = diagnose(BuildStep::Check, &output);
                SyntaxCheck {
                    valid: errors.is_empty(),
                    errors,
                }
            }
            Err((_, diagnostic)) => SyntaxCheck {
                valid: false,
                errors: vec![diagnostic],
            },
        }
    }

    async fn run_pipeline(
        &self,
        env: &BuildEnvironment,
        progress: Option<&Sender<BuildStage>>,
    ) -> BuildResult {
        let mut warnings = Vec::new();

        for step in [BuildStep::Check, BuildStep::Build] {
            let output = match self.run_step(step, env, progress).await {
                Ok(output) => output,
                Err((kind, diagnostic)) => {
                    return BuildResult::failure(kind, vec![diagnostic], warnings);
                }
            };

            let (errors, step_warnings) = diagnose(step, &output);
            for warning in step_warnings {
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }
            if !errors.is_empty() {
                return BuildResult::failure(FailureKind::Diagnostics, errors, warnings);
            }
        }

        let artifact = match tokio::fs::read(env.artifact_path()).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            other => {
                tracing::error!("Artifact missing after build: {:?}", other.err());
                let mut diagnostic = Diagnostic::new(
                    Severity::Error,
                    "Build finished but no WebAssembly artifact was produced",
                );
                diagnostic.suggestion = Some(
                    "Check that the wasm32-unknown-unknown target is installed for the toolchain"
                        .to_string(),
                );
                return BuildResult::failure(FailureKind::Environment, vec![diagnostic], warnings);
            }
        };

        let interface_description = match self.run_step(BuildStep::ExportAbi, env, progress).await {
            Ok(output) if output.success && !output.stdout.trim().is_empty() => Some(output.stdout),
            Ok(_) => {
                tracing::warn!("ABI export produced no interface");
                warnings.push(abi_warning("the exporter reported a failure"));
                None
            }
            Err((_, diagnostic)) => {
                tracing::warn!("ABI export failed: {}", diagnostic.message);
                warnings.push(abi_warning(&diagnostic.message));
                None
            }
        };

        let gas_estimate = match self.run_step(BuildStep::EstimateGas, env, progress).await {
            Ok(output) if output.success => {
                extract_gas_estimate(&output.stdout).or_else(|| extract_gas_estimate(&output.stderr))
            }
            _ => None,
        };

        BuildResult::success(
            artifact,
            interface_description,
            warnings,
            gas_estimate,
            ArtifactProvenance::Native,
        )
    }

    /// Invokes one step under its budget. Hitting the budget drops the
    /// toolchain future, which stops the underlying process.
    async fn run_step(
        &self,
        step: BuildStep,
        env: &BuildEnvironment,
        progress: Option<&Sender<BuildStage>>,
    ) -> Result<StepOutput, StepFailure> {
        report(progress, step.into()).await;

        let budget = self.budgets.for_step(step);
        tracing::debug!("Running {} with a {:?} budget", step, budget);

        match timeout(budget, self.toolchain.invoke(step, env.path())).await {
            Ok(Ok(output)) => {
                tracing::debug!("{} finished: success={}", step, output.success);
                Ok(output)
            }
            Ok(Err(e)) => {
                tracing::error!("{} could not run: {}", step, e);
                Err((
                    FailureKind::Environment,
                    Diagnostic::new(Severity::Error, &e.to_string()),
                ))
            }
            Err(_) => {
                tracing::warn!("{} timed out after {:?}", step, budget);
                let mut diagnostic = Diagnostic::new(
                    Severity::Error,
                    &format!(
                        "Build step `{}` timed out after {} seconds",
                        step,
                        budget.as_secs_f64()
                    ),
                );
                diagnostic.suggestion =
                    Some("Retry the build; simplify the contract if it keeps timing out".to_string());
                Err((FailureKind::Timeout { step }, diagnostic))
            }
        }
    }
}

/// Splits a step's output into blocking errors and everything else.
fn diagnose(step: BuildStep, output: &StepOutput) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
    let (mut errors, warnings): (Vec<_>, Vec<_>) = parse_diagnostics(&output.stderr)
        .into_iter()
        .partition(Diagnostic::is_error);

    if !output.success {
        errors.extend(parse_contract_diagnostics(&format!(
            "{}\n{}",
            output.stderr, output.stdout
        )));

        if errors.is_empty() {
            let mut diagnostic = Diagnostic::new(
                Severity::Error,
                &format!("Build step `{}` failed without reporting an error", step),
            );
            let tail: Vec<&str> = output.stderr.lines().rev().take(20).collect();
            if !tail.is_empty() {
                diagnostic.snippet = Some(tail.into_iter().rev().collect::<Vec<_>>().join("\n"));
            }
            errors.push(diagnostic);
        }
    }

    (errors, warnings)
}

fn toolchain_unavailable() -> BuildResult {
    BuildResult::single_error(
        FailureKind::ToolchainUnavailable {
            install_hint: INSTALL_HINT.to_string(),
        },
        "The Rust toolchain is not installed or not on PATH; install it to compile contracts",
        Some(INSTALL_HINT),
    )
}

fn abi_warning(reason: &str) -> Diagnostic {
    Diagnostic::new(
        Severity::Warning,
        &format!("Contract ABI could not be exported: {}", reason),
    )
}

/// Picks the first number that follows the word "gas" in toolchain output.
pub fn extract_gas_estimate(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let figure = GAS_FIGURE.captures(line)?.get(1)?.as_str();
        let digits: String = figure.chars().filter(char::is_ascii_digit).collect();
        (!digits.is_empty()).then_some(digits)
    })
}

async fn report(progress: Option<&Sender<BuildStage>>, stage: BuildStage) {
    if let Some(tx) = progress {
        if tx.send(stage).await.is_err() {
            tracing::debug!("Progress receiver dropped before {:?}", stage);
        }
    }
}
