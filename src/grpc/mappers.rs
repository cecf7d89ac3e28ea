use chrono::Utc;

use crate::core::{diagnostics, domain};
use crate::grpc::models::{
    self, Empty, build_failure, build_outcome, build_update, chrono_to_prost,
};

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },
    #[error("Unsupported language: {language}")]
    UnsupportedLanguage { language: String },
}

impl TryFrom<models::CompileRequest> for domain::BuildRequest {
    type Error = ConversionError;

    fn try_from(req: models::CompileRequest) -> Result<Self, ConversionError> {
        if req.source.trim().is_empty() {
            return Err(ConversionError::MissingField {
                field: "source".to_string(),
            });
        }

        match models::Language::try_from(req.language) {
            Ok(models::Language::Rust) => {}
            Ok(models::Language::Unspecified) => {
                return Err(ConversionError::MissingField {
                    field: "language".to_string(),
                });
            }
            Ok(other) => {
                return Err(ConversionError::UnsupportedLanguage {
                    language: other.as_str_name().to_string(),
                });
            }
            Err(_) => {
                return Err(ConversionError::UnsupportedLanguage {
                    language: req.language.to_string(),
                });
            }
        }

        Ok(Self {
            source_text: req.source,
            project_name: req.project_name,
        })
    }
}

impl From<domain::Severity> for models::Severity {
    fn from(severity: domain::Severity) -> Self {
        match severity {
            domain::Severity::Error => models::Severity::Error,
            domain::Severity::Warning => models::Severity::Warning,
            domain::Severity::Note => models::Severity::Note,
            domain::Severity::Help => models::Severity::Help,
        }
    }
}

impl From<domain::SourceLocation> for models::SourceLocation {
    fn from(location: domain::SourceLocation) -> Self {
        Self {
            file: location.file,
            line: location.line,
            column: location.column,
        }
    }
}

impl From<domain::Diagnostic> for models::Diagnostic {
    fn from(diagnostic: domain::Diagnostic) -> Self {
        let friendly_message = diagnostics::to_user_friendly_message(&diagnostic);
        let category = diagnostics::categorize(&diagnostic).to_string();

        Self {
            severity: models::Severity::from(diagnostic.severity).into(),
            code: diagnostic.code,
            message: diagnostic.message,
            location: diagnostic.location.map(Into::into),
            snippet: diagnostic.snippet,
            suggestion: diagnostic.suggestion,
            friendly_message,
            category,
        }
    }
}

impl From<domain::BuildStage> for models::Stage {
    fn from(stage: domain::BuildStage) -> Self {
        match stage {
            domain::BuildStage::Preparing => models::Stage::Preparing,
            domain::BuildStage::Checking => models::Stage::Checking,
            domain::BuildStage::Building => models::Stage::Building,
            domain::BuildStage::ExportingAbi => models::Stage::ExportingAbi,
            domain::BuildStage::EstimatingGas => models::Stage::EstimatingGas,
        }
    }
}

impl From<domain::BuildStage> for models::BuildUpdate {
    fn from(stage: domain::BuildStage) -> Self {
        Self {
            update: Some(build_update::Update::Stage(models::Stage::from(stage).into())),
        }
    }
}

impl From<domain::ArtifactProvenance> for models::Provenance {
    fn from(provenance: domain::ArtifactProvenance) -> Self {
        match provenance {
            domain::ArtifactProvenance::Native => models::Provenance::Native,
            domain::ArtifactProvenance::RemotePlaceholder => models::Provenance::RemotePlaceholder,
        }
    }
}

impl From<domain::FailureKind> for models::BuildFailure {
    fn from(kind: domain::FailureKind) -> Self {
        let kind = match kind {
            domain::FailureKind::Diagnostics => build_failure::Kind::Diagnostics(Empty {}),
            domain::FailureKind::Timeout { step } => {
                build_failure::Kind::Timeout(build_failure::Timeout {
                    step: step.to_string(),
                })
            }
            domain::FailureKind::ToolchainUnavailable { install_hint } => {
                build_failure::Kind::ToolchainUnavailable(build_failure::ToolchainUnavailable {
                    install_hint,
                })
            }
            domain::FailureKind::Environment => build_failure::Kind::Environment(Empty {}),
            domain::FailureKind::RemoteUnavailable => {
                build_failure::Kind::RemoteUnavailable(Empty {})
            }
        };

        Self { kind: Some(kind) }
    }
}

impl From<domain::BuildResult> for models::BuildOutcome {
    fn from(result: domain::BuildResult) -> Self {
        let (result, errors, warnings) = match result {
            domain::BuildResult::Success {
                artifact,
                interface_description,
                artifact_size_bytes,
                warnings,
                gas_estimate,
                provenance,
            } => (
                build_outcome::Result::Success(models::BuildSuccess {
                    artifact,
                    interface_description,
                    artifact_size_bytes: artifact_size_bytes as u64,
                    gas_estimate,
                    provenance: models::Provenance::from(provenance).into(),
                }),
                Vec::new(),
                warnings,
            ),
            domain::BuildResult::Failure {
                kind,
                errors,
                warnings,
            } => (build_outcome::Result::Failure(kind.into()), errors, warnings),
        };

        Self {
            result: Some(result),
            errors: errors.into_iter().map(Into::into).collect(),
            warnings: warnings.into_iter().map(Into::into).collect(),
            finished_at: Some(chrono_to_prost(Utc::now())),
        }
    }
}

impl From<domain::BuildResult> for models::BuildUpdate {
    fn from(result: domain::BuildResult) -> Self {
        Self {
            update: Some(build_update::Update::Outcome(result.into())),
        }
    }
}

impl From<domain::SyntaxCheck> for models::SyntaxCheckResponse {
    fn from(check: domain::SyntaxCheck) -> Self {
        Self {
            valid: check.valid,
            errors: check.errors.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<domain::OperationCategory> for models::OperationCategory {
    fn from(category: domain::OperationCategory) -> Self {
        match category {
            domain::OperationCategory::Storage => models::OperationCategory::Storage,
            domain::OperationCategory::Memory => models::OperationCategory::Memory,
            domain::OperationCategory::Computation => models::OperationCategory::Computation,
            domain::OperationCategory::Call => models::OperationCategory::Call,
            domain::OperationCategory::Event => models::OperationCategory::Event,
        }
    }
}

impl From<domain::OperationCost> for models::OperationCost {
    fn from(cost: domain::OperationCost) -> Self {
        Self {
            name: cost.name,
            gas_used: cost.gas_used,
            percentage_of_total: cost.percentage_of_total,
            occurrence_count: cost.occurrence_count,
            category: models::OperationCategory::from(cost.category).into(),
        }
    }
}

impl From<domain::GasProfile> for models::GasProfile {
    fn from(profile: domain::GasProfile) -> Self {
        Self {
            total_gas_units: profile.total_gas_units,
            operations: profile.operations.into_iter().map(Into::into).collect(),
            estimated_cost_eth: profile.estimated_cost_eth,
            estimated_cost_usd: profile.estimated_cost_usd,
            optimization_suggestions: profile.optimization_suggestions,
        }
    }
}
