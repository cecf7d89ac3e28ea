use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildRequest {
    pub source_text: String,
    pub project_name: String,
}

impl BuildRequest {
    pub fn new(source_text: &str, project_name: &str) -> Self {
        BuildRequest {
            source_text: source_text.to_string(),
            project_name: project_name.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BuildResult {
    Success {
        artifact: Vec<u8>,
        interface_description: Option<String>,
        artifact_size_bytes: usize,
        warnings: Vec<Diagnostic>,
        gas_estimate: Option<String>,
        provenance: ArtifactProvenance,
    },
    Failure {
        kind: FailureKind,
        errors: Vec<Diagnostic>,
        warnings: Vec<Diagnostic>,
    },
}

impl BuildResult {
    /// Builds a successful result; the size is always taken from the artifact itself.
    pub fn success(
        artifact: Vec<u8>,
        interface_description: Option<String>,
        warnings: Vec<Diagnostic>,
        gas_estimate: Option<String>,
        provenance: ArtifactProvenance,
    ) -> Self {
        BuildResult::Success {
            artifact_size_bytes: artifact.len(),
            artifact,
            interface_description,
            warnings,
            gas_estimate,
            provenance,
        }
    }

    pub fn failure(kind: FailureKind, errors: Vec<Diagnostic>, warnings: Vec<Diagnostic>) -> Self {
        BuildResult::Failure {
            kind,
            errors,
            warnings,
        }
    }

    /// A failure carrying exactly one synthetic error diagnostic.
    pub fn single_error(kind: FailureKind, message: &str, suggestion: Option<&str>) -> Self {
        let mut diagnostic = Diagnostic::new(Severity::Error, message);
        diagnostic.suggestion = suggestion.map(str::to_string);
        BuildResult::failure(kind, vec![diagnostic], Vec::new())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildResult::Success { .. })
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        match self {
            BuildResult::Success { warnings, .. } | BuildResult::Failure { warnings, .. } => {
                warnings
            }
        }
    }

    pub fn errors(&self) -> &[Diagnostic] {
        match self {
            BuildResult::Success { .. } => &[],
            BuildResult::Failure { errors, .. } => errors,
        }
    }

    pub fn metadata(&self, project_name: &str) -> BuildMetadata {
        let (artifact_size_bytes, gas_estimate) = match self {
            BuildResult::Success {
                artifact_size_bytes,
                gas_estimate,
                ..
            } => (Some(*artifact_size_bytes), gas_estimate.clone()),
            BuildResult::Failure { .. } => (None, None),
        };

        BuildMetadata {
            project_name: project_name.to_string(),
            succeeded: self.is_success(),
            artifact_size_bytes,
            warning_count: self.warnings().len(),
            error_count: self.errors().len(),
            gas_estimate,
            finished_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Diagnostics,
    Timeout { step: BuildStep },
    ToolchainUnavailable { install_hint: String },
    Environment,
    RemoteUnavailable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactProvenance {
    Native,
    /// Produced by the remote fallback; never deployable.
    RemotePlaceholder,
}

/// What the persistence collaborator receives once a build has finished.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildMetadata {
    pub project_name: String,
    pub succeeded: bool,
    pub artifact_size_bytes: Option<usize>,
    pub warning_count: usize,
    pub error_count: usize,
    pub gas_estimate: Option<String>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxCheck {
    pub valid: bool,
    pub errors: Vec<Diagnostic>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "error" => Some(Severity::Error),
            "warning" => Some(Severity::Warning),
            "note" => Some(Severity::Note),
            "help" => Some(Severity::Help),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub snippet: Option<String>,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: &str) -> Self {
        Diagnostic {
            severity,
            code: None,
            message: message.to_string(),
            location: None,
            snippet: None,
            suggestion: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuildStep {
    Check,
    Build,
    ExportAbi,
    EstimateGas,
}

impl BuildStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStep::Check => "check",
            BuildStep::Build => "build",
            BuildStep::ExportAbi => "export-abi",
            BuildStep::EstimateGas => "estimate-gas",
        }
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of a single compile invocation, reported as each stage starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildStage {
    Preparing,
    Checking,
    Building,
    ExportingAbi,
    EstimatingGas,
}

impl From<BuildStep> for BuildStage {
    fn from(step: BuildStep) -> Self {
        match step {
            BuildStep::Check => BuildStage::Checking,
            BuildStep::Build => BuildStage::Building,
            BuildStep::ExportAbi => BuildStage::ExportingAbi,
            BuildStep::EstimateGas => BuildStage::EstimatingGas,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GasProfile {
    pub total_gas_units: u64,
    pub operations: Vec<OperationCost>,
    pub estimated_cost_eth: f64,
    pub estimated_cost_usd: f64,
    pub optimization_suggestions: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OperationCost {
    pub name: String,
    pub gas_used: u64,
    pub percentage_of_total: f64,
    pub occurrence_count: u64,
    pub category: OperationCategory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationCategory {
    Storage,
    Memory,
    Computation,
    Call,
    Event,
}

impl OperationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationCategory::Storage => "storage",
            OperationCategory::Memory => "memory",
            OperationCategory::Computation => "computation",
            OperationCategory::Call => "call",
            OperationCategory::Event => "event",
        }
    }
}
