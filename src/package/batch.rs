//! Batched package installation.
//!
//! Packages already present are filtered out first, then everything that is
//! missing goes into a single apt transaction so the operator sees one
//! prompt and one sudo invocation per batch.

use anyhow::{Context, Result};

use super::query::PackageQuery;
use crate::common::runner::{CommandRunner, CommandSpec};
use crate::ui::prelude::*;

/// What a batch did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Already installed, left alone.
    pub satisfied: Vec<String>,
    /// Passed to the install transaction.
    pub installed: Vec<String>,
}

impl BatchReport {
    pub fn transaction_issued(&self) -> bool {
        !self.installed.is_empty()
    }
}

/// A batch of packages to install in one transaction.
pub struct InstallBatch<'a> {
    query: PackageQuery<'a>,
    pending: Vec<String>,
    satisfied: Vec<String>,
}

impl<'a> InstallBatch<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            query: PackageQuery::new(runner),
            pending: Vec::new(),
            satisfied: Vec::new(),
        }
    }

    /// Add a package to the batch.
    ///
    /// Returns `false` if it is already installed or already queued.
    pub fn add(&mut self, package: &str) -> bool {
        if self.pending.iter().any(|p| p == package) || self.satisfied.iter().any(|p| p == package)
        {
            return false;
        }
        if self.query.is_installed(package) {
            emit(
                Level::Info,
                "package.batch.satisfied",
                &format!("{} {} is already installed", char::from(NerdFont::Check), package),
                Some(serde_json::json!({ "package": package })),
            );
            self.satisfied.push(package.to_string());
            return false;
        }
        self.pending.push(package.to_string());
        true
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn package_count(&self) -> usize {
        self.pending.len()
    }

    /// Build a message listing all packages to be installed.
    pub fn build_install_message(&self) -> String {
        format!(
            "Installing {} package{}: {}",
            self.pending.len(),
            if self.pending.len() == 1 { "" } else { "s" },
            self.pending.join(" ")
        )
    }

    /// The apt transaction for the pending packages.
    pub fn install_command(&self, assume_yes: bool) -> CommandSpec {
        let mut spec = CommandSpec::new("apt").arg("install");
        if assume_yes {
            spec = spec.arg("-y");
        }
        spec.args(self.pending.iter().cloned()).privileged()
    }

    /// Run the transaction. An empty batch touches nothing.
    pub fn execute(self, runner: &dyn CommandRunner, assume_yes: bool) -> Result<BatchReport> {
        if self.is_empty() {
            return Ok(BatchReport {
                satisfied: self.satisfied,
                installed: Vec::new(),
            });
        }

        emit(
            Level::Info,
            "package.batch.install",
            &format!("{} {}", char::from(NerdFont::Package), self.build_install_message()),
            Some(serde_json::json!({ "packages": self.pending })),
        );
        runner
            .run(&self.install_command(assume_yes))
            .with_context(|| format!("Failed to install packages: {}", self.pending.join(", ")))?;

        Ok(BatchReport {
            satisfied: self.satisfied,
            installed: self.pending,
        })
    }
}

/// Installs package lists, skipping what is already there.
pub struct BatchInstaller<'a> {
    runner: &'a dyn CommandRunner,
    assume_yes: bool,
}

impl<'a> BatchInstaller<'a> {
    pub fn new(runner: &'a dyn CommandRunner, assume_yes: bool) -> Self {
        Self { runner, assume_yes }
    }

    /// Partition `packages` against the installed set without installing.
    pub fn plan(&self, packages: &[String]) -> InstallBatch<'a> {
        let mut batch = InstallBatch::new(self.runner);
        for package in packages {
            batch.add(package);
        }
        batch
    }

    /// Install whatever in `packages` is missing, in one transaction.
    pub fn install(&self, packages: &[String]) -> Result<BatchReport> {
        self.plan(packages).execute(self.runner, self.assume_yes)
    }
}
