//! Source-build fallback for tools without a binary package.
//!
//! A build runs Check → Prepare → Clone → Configure → Build → Install inside
//! a throwaway workspace. The workspace is a [`TempDir`], so it is removed
//! on every return path, including stage failures. Commands carry their own
//! working directory and the process never changes its own.

pub mod scanner;
pub mod target;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

use crate::common::paths::HostLayout;
use crate::common::progress::{create_spinner, finish_spinner};
use crate::common::runner::{CommandRunner, CommandSpec};
use crate::package::BatchInstaller;
use crate::ui::prelude::*;

pub use target::{BuildSystem, BuildTarget, Tool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Prepare,
    Clone,
    Configure,
    Build,
    Install,
}

impl BuildStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Clone => "clone",
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Install => "install",
        }
    }
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to create build workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("{stage} stage failed: {reason}")]
    Stage { stage: BuildStage, reason: String },
}

impl BuildError {
    fn stage(stage: BuildStage, err: anyhow::Error) -> Self {
        Self::Stage {
            stage,
            reason: format!("{:#}", err),
        }
    }

    pub fn failed_stage(&self) -> BuildStage {
        match self {
            Self::Workspace(_) => BuildStage::Clone,
            Self::Stage { stage, .. } => *stage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The command already resolves; nothing was built.
    Skipped,
    Installed,
    Failed { stage: BuildStage, reason: String },
}

impl BuildOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Skipped | Self::Installed => 0,
            Self::Failed { .. } => 1,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl std::fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skipped => f.write_str("already installed"),
            Self::Installed => f.write_str("installed"),
            Self::Failed { stage, reason } => write!(f, "failed at {}: {}", stage, reason),
        }
    }
}

/// Detected logical cores, at least one.
pub fn detected_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

pub struct SourceBuilder<'a> {
    runner: &'a dyn CommandRunner,
    layout: &'a HostLayout,
    jobs: usize,
    install_prefix: PathBuf,
    assume_yes: bool,
    workspace_parent: Option<PathBuf>,
}

impl<'a> SourceBuilder<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        layout: &'a HostLayout,
        jobs: usize,
        install_prefix: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            layout,
            jobs: jobs.max(1),
            install_prefix: install_prefix.into(),
            assume_yes: false,
            workspace_parent: None,
        }
    }

    pub fn assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    /// Create workspaces under `dir` instead of the system temp directory.
    pub fn workspace_parent(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_parent = Some(dir.into());
        self
    }

    /// Where `target` ends up once installed.
    pub fn install_path(&self, target: &BuildTarget) -> PathBuf {
        self.layout.path(&self.install_prefix).join(target.name)
    }

    /// Build and install `target` unless it is already available.
    ///
    /// Stage failures are reported in the outcome. Only a failed dependency
    /// transaction is returned as an error.
    pub fn build(&self, target: &BuildTarget) -> Result<BuildOutcome> {
        let existing = self
            .runner
            .resolve(target.name)
            .or_else(|| Some(self.install_path(target)).filter(|p| p.exists()));
        if let Some(path) = existing {
            emit(
                Level::Info,
                "build.skip",
                &format!(
                    "{} {} is already available at {}",
                    char::from(NerdFont::Check),
                    target.name,
                    path.display()
                ),
                Some(serde_json::json!({
                    "target": target.name,
                    "path": path.display().to_string(),
                })),
            );
            return Ok(BuildOutcome::Skipped);
        }

        emit(
            Level::Info,
            "build.start",
            &format!(
                "{} Building {} from source ({} jobs)",
                char::from(NerdFont::Wrench),
                target.name,
                self.jobs
            ),
            Some(serde_json::json!({ "target": target.name, "jobs": self.jobs })),
        );

        let dependencies: Vec<String> = target.dependencies.iter().map(|d| d.to_string()).collect();
        BatchInstaller::new(self.runner, self.assume_yes)
            .install(&dependencies)
            .with_context(|| format!("Failed to install build dependencies for {}", target.name))?;

        let outcome = match self.run_stages(target) {
            Ok(()) => {
                emit(
                    Level::Success,
                    "build.installed",
                    &format!(
                        "{} Installed {} to {}",
                        char::from(NerdFont::Check),
                        target.name,
                        self.install_path(target).display()
                    ),
                    Some(serde_json::json!({ "target": target.name })),
                );
                BuildOutcome::Installed
            }
            Err(err) => {
                let stage = err.failed_stage();
                emit(
                    Level::Error,
                    &format!("build.{}.failed", stage),
                    &format!("{} {}: {}", char::from(NerdFont::Cross), target.name, err),
                    Some(serde_json::json!({ "target": target.name, "stage": stage.as_str() })),
                );
                BuildOutcome::Failed {
                    stage,
                    reason: err.to_string(),
                }
            }
        };
        Ok(outcome)
    }

    fn run_stages(&self, target: &BuildTarget) -> Result<(), BuildError> {
        if target.needs_scanner_descriptor {
            scanner::ensure_descriptor(self.runner, self.layout)
                .map_err(|e| BuildError::stage(BuildStage::Prepare, e))?;
        }

        let workspace = self.create_workspace(target)?;
        let src = workspace.path().join("src");

        let pb = create_spinner(format!("Cloning {}...", target.repo_url));
        let cloned = self.runner.run(
            &CommandSpec::new("git")
                .args(["clone", "--quiet", "--depth", "1", target.repo_url])
                .path_arg(&src),
        );
        finish_spinner(pb);
        cloned.map_err(|e| BuildError::stage(BuildStage::Clone, e))?;

        self.stage(BuildStage::Configure, &target.system.configure_command(&src))?;
        self.stage(
            BuildStage::Build,
            &target.system.build_command(&src, target.name, self.jobs),
        )?;
        self.stage(BuildStage::Install, &self.install_command(target, &src))?;

        Ok(())
    }

    fn create_workspace(&self, target: &BuildTarget) -> Result<TempDir, BuildError> {
        let prefix = format!("deskstrap-{}-", target.name);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let workspace = match &self.workspace_parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(BuildError::Workspace)?;
        emit(
            Level::Debug,
            "build.workspace",
            &format!("Workspace: {}", workspace.path().display()),
            None,
        );
        Ok(workspace)
    }

    fn stage(&self, stage: BuildStage, spec: &CommandSpec) -> Result<(), BuildError> {
        emit(
            Level::Info,
            &format!("build.{}", stage),
            &format!("{} {}: {}", char::from(NerdFont::Terminal), stage, spec),
            None,
        );
        self.runner
            .run(spec)
            .map_err(|e| BuildError::stage(stage, e))
    }

    fn install_command(&self, target: &BuildTarget, src: &Path) -> CommandSpec {
        CommandSpec::new("install")
            .args(["-D", "-m", "755"])
            .path_arg(&src.join(target.artifact))
            .path_arg(&self.install_path(target))
            .privileged()
    }
}
