//! Degraded compile path used when no local toolchain is installed.
//!
//! The remote sandbox can only tell whether the code type-checks as a plain
//! Rust program. A "successful" result carries a placeholder artifact marked
//! [`ArtifactProvenance::RemotePlaceholder`] that must never be deployed.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::core::{
    domain::{ArtifactProvenance, BuildResult, Diagnostic, FailureKind, Severity, SyntaxCheck},
    traits::sandbox::{RemoteSandbox, SandboxRequest},
};

pub const PLACEHOLDER_HEADER: &[u8] = b"REMOTE-PLACEHOLDER: not deployable\n";

const ENTRYPOINT_MARKERS: [&str; 2] = ["fn main", "#![no_main]"];

static ERROR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"error(?:\[([A-Za-z0-9]+)\])?: (.*)$").expect("error line pattern is valid")
});

#[derive(Clone, Debug)]
pub struct FallbackCompiler {
    sandbox: Arc<dyn RemoteSandbox>,
}

impl FallbackCompiler {
    pub fn new(sandbox: Arc<dyn RemoteSandbox>) -> Self {
        Self { sandbox }
    }

    #[tracing::instrument(skip(self, source))]
    pub async fn compile(&self, source: &str) -> BuildResult {
        let request = SandboxRequest::for_code(wrap_in_harness(source));

        let response = match self.sandbox.execute(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Remote sandbox unavailable: {}", e);
                return BuildResult::single_error(
                    FailureKind::RemoteUnavailable,
                    &format!("Remote validation failed: {}", e),
                    Some("Install the Rust toolchain locally to build without the remote sandbox"),
                );
            }
        };

        let warnings = extract_warnings(&response.stderr);

        if response.stderr.contains("error") {
            let mut errors = extract_errors(&response.stderr);
            if errors.is_empty() {
                errors.push(Diagnostic::new(
                    Severity::Error,
                    "Remote validation reported an error",
                ));
            }
            tracing::debug!("Remote validation failed with {} errors", errors.len());
            return BuildResult::failure(FailureKind::Diagnostics, errors, warnings);
        }

        let mut warnings = warnings;
        warnings.push(Diagnostic::new(
            Severity::Warning,
            "Validated by the remote sandbox only; the artifact is a placeholder and cannot be deployed",
        ));

        let mut artifact = PLACEHOLDER_HEADER.to_vec();
        artifact.extend_from_slice(response.stdout.as_bytes());

        BuildResult::success(
            artifact,
            None,
            warnings,
            None,
            ArtifactProvenance::RemotePlaceholder,
        )
    }

    pub async fn validate_syntax(&self, source: &str) -> SyntaxCheck {
        match self.compile(source).await {
            BuildResult::Success { .. } => SyntaxCheck {
                valid: true,
                errors: Vec::new(),
            },
            BuildResult::Failure { errors, .. } => SyntaxCheck {
                valid: false,
                errors,
            },
        }
    }
}

/// Gives library-style code a `main` so the sandbox can build it as a binary.
pub fn wrap_in_harness(source: &str) -> String {
    if ENTRYPOINT_MARKERS
        .iter()
        .any(|marker| source.contains(marker))
    {
        return source.to_string();
    }

    format!(
        "#![allow(dead_code, unused_imports, unused_variables)]\n{}\n\nfn main() {{}}\n",
        source
    )
}

fn is_summary(message: &str) -> bool {
    message.contains("could not compile")
        || message.contains("aborting due to")
        || message.contains("generated")
}

fn extract_errors(stderr: &str) -> Vec<Diagnostic> {
    stderr
        .lines()
        .filter(|line| line.contains("error:") || line.contains("error["))
        .filter_map(|line| {
            let line = line.trim();
            let Some(captures) = ERROR_LINE.captures(line) else {
                return Some(Diagnostic::new(Severity::Error, line));
            };
            let message = &captures[2];
            if is_summary(message) {
                return None;
            }
            let mut diagnostic = Diagnostic::new(Severity::Error, message);
            diagnostic.code = captures.get(1).map(|code| code.as_str().to_string());
            Some(diagnostic)
        })
        .collect()
}

fn extract_warnings(stderr: &str) -> Vec<Diagnostic> {
    stderr
        .lines()
        .filter_map(|line| line.trim().strip_prefix("warning: "))
        .filter(|message| !is_summary(message))
        .map(|message| Diagnostic::new(Severity::Warning, message))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::sandbox::{MockRemoteSandbox, SandboxError, SandboxResponse};

    fn sandbox_answering(stdout: &str, stderr: &str) -> MockRemoteSandbox {
        let response = SandboxResponse {
            success: !stderr.contains("error"),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        };
        let mut sandbox = MockRemoteSandbox::new();
        sandbox
            .expect_execute()
            .returning(move |_| Ok(response.clone()));
        sandbox
    }

    #[test]
    fn test_wrap_library_code() {
        let wrapped = wrap_in_harness("pub fn add(a: u8, b: u8) -> u8 { a + b }");

        assert!(wrapped.starts_with("#![allow("));
        assert!(wrapped.contains("pub fn add"));
        assert!(wrapped.ends_with("fn main() {}\n"));
    }

    #[test]
    fn test_binary_code_is_left_alone() {
        let source = "fn main() { println!(\"hi\"); }";

        assert_eq!(wrap_in_harness(source), source);
    }

    #[tokio::test]
    async fn test_sends_wrapped_code() {
        let mut sandbox = MockRemoteSandbox::new();
        sandbox
            .expect_execute()
            .withf(|request| {
                request.code.contains("fn main() {}")
                    && request.channel == "stable"
                    && request.crate_type == "bin"
            })
            .times(1)
            .returning(|_| Ok(SandboxResponse::default()));
        let compiler = FallbackCompiler::new(Arc::new(sandbox));

        let result = compiler.compile("pub struct Counter;").await;

        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_success_is_a_placeholder() {
        let compiler = FallbackCompiler::new(Arc::new(sandbox_answering(
            "",
            "   Compiling playground v0.0.1 (/playground)\n    Finished dev profile\n",
        )));

        let result = compiler.compile("fn main() {}").await;

        let BuildResult::Success {
            artifact,
            artifact_size_bytes,
            provenance,
            warnings,
            ..
        } = result
        else {
            panic!("Expected success");
        };
        assert_eq!(provenance, ArtifactProvenance::RemotePlaceholder);
        assert!(artifact.starts_with(PLACEHOLDER_HEADER));
        assert_eq!(artifact.len(), artifact_size_bytes);
        assert!(warnings.last().unwrap().message.contains("placeholder"));
    }

    #[tokio::test]
    async fn test_errors_are_flat() {
        let stderr = "   Compiling playground v0.0.1 (/playground)\n\
            warning: unused variable: `y`\n\
            error[E0425]: cannot find value `x` in this scope\n \
            --> src/main.rs:3:5\n\
            error: expected `;`, found `}`\n\
            error: could not compile `playground` (bin \"playground\") due to 2 previous errors\n";
        let compiler = FallbackCompiler::new(Arc::new(sandbox_answering("", stderr)));

        let result = compiler.compile("fn main() { x }").await;

        let BuildResult::Failure {
            kind,
            errors,
            warnings,
        } = result
        else {
            panic!("Expected failure");
        };
        assert_eq!(kind, FailureKind::Diagnostics);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].code.as_deref(), Some("E0425"));
        assert_eq!(errors[0].location, None);
        assert_eq!(errors[1].message, "expected `;`, found `}`");
        assert_eq!(warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_sandbox() {
        let mut sandbox = MockRemoteSandbox::new();
        sandbox
            .expect_execute()
            .returning(|_| Err(SandboxError::Timeout));
        let compiler = FallbackCompiler::new(Arc::new(sandbox));

        let result = compiler.compile("fn main() {}").await;

        let BuildResult::Failure { kind, errors, .. } = result else {
            panic!("Expected failure");
        };
        assert_eq!(kind, FailureKind::RemoteUnavailable);
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn test_validate_syntax() {
        let valid = FallbackCompiler::new(Arc::new(sandbox_answering("", "")))
            .validate_syntax("fn main() {}")
            .await;
        let invalid = FallbackCompiler::new(Arc::new(sandbox_answering(
            "",
            "error[E0308]: mismatched types\n",
        )))
        .validate_syntax("fn main() { let x: u8 = true; }")
        .await;

        assert!(valid.valid);
        assert!(!invalid.valid);
        assert_eq!(invalid.errors[0].code.as_deref(), Some("E0308"));
    }
}
