//! Ephemeral per-build directories.
//!
//! A [`BuildEnvironment`] owns its directory for its whole lifetime and
//! removes it on drop, so every exit path of a build (success, failure,
//! timeout or an early `?`) tears it down.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::constants::{ARTIFACT_RELATIVE_PATH, SOURCE_RELATIVE_PATH};

const MAX_NAME_LEN: usize = 40;

const ABI_SHIM: &str = r#"#![cfg_attr(not(feature = "export-abi"), no_main)]

#[cfg(feature = "export-abi")]
fn main() {
    contract::print_abi("MIT-OR-APACHE-2.0", "pragma solidity ^0.8.23;");
}
"#;

#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("Failed to create build directory {path}: {source}")]
    Create { path: PathBuf, source: io::Error },
    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug)]
pub struct BuildEnvironment {
    dir: PathBuf,
    package_name: String,
}

impl BuildEnvironment {
    /// Creates a uniquely named directory under `root` and writes the fixed
    /// manifest, the ABI export shim and `source` into it.
    #[tracing::instrument(skip(source))]
    pub async fn create(
        root: &Path,
        project_name: &str,
        source: &str,
    ) -> Result<Self, EnvironmentError> {
        let sanitized = sanitize_project_name(project_name);
        let dir = root.join(format!(
            "{}-{}-{}",
            sanitized,
            chrono::Utc::now().format("%Y%m%d%H%M%S"),
            Uuid::new_v4().simple()
        ));

        fs::create_dir_all(root)
            .await
            .map_err(|source| EnvironmentError::Create {
                path: root.to_path_buf(),
                source,
            })?;
        fs::create_dir(&dir)
            .await
            .map_err(|source| EnvironmentError::Create {
                path: dir.clone(),
                source,
            })?;

        // From here on the directory is owned and dropped with `env`.
        let env = BuildEnvironment {
            dir,
            package_name: format!("contract-{}", sanitized),
        };

        env.write("Cargo.toml", &build_manifest(&env.package_name))
            .await?;
        env.write(SOURCE_RELATIVE_PATH, source).await?;
        env.write("src/main.rs", ABI_SHIM).await?;

        tracing::debug!("Build environment ready at {}", env.dir.display());
        Ok(env)
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir.join(ARTIFACT_RELATIVE_PATH)
    }

    async fn write(&self, relative: &str, contents: &str) -> Result<(), EnvironmentError> {
        let path = self.dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| EnvironmentError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        fs::write(&path, contents)
            .await
            .map_err(|source| EnvironmentError::Write { path, source })
    }
}

impl Drop for BuildEnvironment {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => tracing::debug!("Removed build environment {}", self.dir.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove build environment {}: {}",
                self.dir.display(),
                e
            ),
        }
    }
}

/// Lowercases the name and replaces anything outside `[a-z0-9_-]` so it is
/// safe both as a path component and inside a cargo package name.
pub fn sanitize_project_name(project_name: &str) -> String {
    let mut sanitized = String::with_capacity(project_name.len());

    for c in project_name.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '-'
        };
        if c == '-' && sanitized.ends_with('-') {
            continue;
        }
        sanitized.push(c);
    }

    let sanitized: String = sanitized
        .trim_matches(|c: char| c == '-' || c == '_')
        .chars()
        .take(MAX_NAME_LEN)
        .collect();
    let sanitized = sanitized.trim_end_matches(|c: char| c == '-' || c == '_');

    if sanitized.is_empty() {
        "project".to_string()
    } else {
        sanitized.to_string()
    }
}

/// Fixed manifest: pinned dependencies and a release profile tuned for the
/// smallest possible WebAssembly binary.
pub fn build_manifest(package_name: &str) -> String {
    format!(
        r#"[package]
name = "{package_name}"
version = "0.1.0"
edition = "2021"

[lib]
name = "contract"
crate-type = ["lib", "cdylib"]

[dependencies]
stylus-sdk = "=0.6.0"
alloy-primitives = "=0.7.6"
alloy-sol-types = "=0.7.6"

[features]
export-abi = ["stylus-sdk/export-abi"]

[profile.release]
codegen-units = 1
strip = true
lto = true
panic = "abort"
opt-level = "s"
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_root() -> PathBuf {
        std::env::temp_dir().join(format!("contract_builder_env_{}", Uuid::new_v4()))
    }

    #[test]
    fn test_sanitize_project_name() {
        assert_eq!(sanitize_project_name("Counter"), "counter");
        assert_eq!(sanitize_project_name("../../etc/passwd"), "etc-passwd");
        assert_eq!(sanitize_project_name("my token v2!"), "my-token-v2");
        assert_eq!(sanitize_project_name("snake_case"), "snake_case");
        assert_eq!(sanitize_project_name("///"), "project");
        assert_eq!(sanitize_project_name(""), "project");
        assert_eq!(sanitize_project_name(&"a".repeat(100)).len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_manifest_profile() {
        let manifest = build_manifest("contract-counter");

        assert!(manifest.contains("name = \"contract-counter\""));
        assert!(manifest.contains("opt-level = \"s\""));
        assert!(manifest.contains("lto = true"));
        assert!(manifest.contains("panic = \"abort\""));
        assert!(manifest.contains("strip = true"));
    }

    #[tokio::test]
    async fn test_create_writes_files_and_drop_cleans_up() {
        let root = test_root();

        let env = BuildEnvironment::create(&root, "Counter", "pub fn answer() -> u8 { 42 }")
            .await
            .unwrap();
        let dir = env.path().to_path_buf();

        assert!(dir.starts_with(&root));
        assert_eq!(env.package_name(), "contract-counter");
        assert!(dir.join("Cargo.toml").exists());
        assert!(dir.join("src/main.rs").exists());
        assert_eq!(
            std::fs::read_to_string(dir.join(SOURCE_RELATIVE_PATH)).unwrap(),
            "pub fn answer() -> u8 { 42 }"
        );

        drop(env);
        assert!(!dir.exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_same_project_name_never_collides() {
        let root = test_root();

        let first = BuildEnvironment::create(&root, "counter", "").await.unwrap();
        let second = BuildEnvironment::create(&root, "counter", "").await.unwrap();

        assert_ne!(first.path(), second.path());

        drop(first);
        drop(second);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_unwritable_root() {
        // /proc is readonly
        let result = BuildEnvironment::create(Path::new("/proc/contract_builder"), "counter", "").await;

        assert!(matches!(result, Err(EnvironmentError::Create { .. })));
    }
}
