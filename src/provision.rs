//! The full provisioning run.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::build::{BuildOutcome, SourceBuilder, Tool, detected_jobs};
use crate::common::config::Config;
use crate::common::distro::Variant;
use crate::common::paths::{self, HostLayout};
use crate::common::runner::CommandRunner;
use crate::package::{BatchInstaller, BatchReport, Catalog, Category, PackageQuery, RequestSet};
use crate::repos::{BootstrapReport, RepoBootstrapper};
use crate::setup::{self, HookResult, ScriptReport};
use crate::ui::prelude::*;

/// Facts about the host, established once at startup and passed down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    pub variant: Variant,
    pub layout: HostLayout,
    pub jobs: usize,
    pub assume_yes: bool,
    pub install_prefix: PathBuf,
    pub scripts_dir: PathBuf,
    pub user_bin: PathBuf,
}

impl HostContext {
    pub fn detect(layout: HostLayout, config: &Config, assume_yes: bool) -> Result<Self> {
        let variant = Variant::detect(&layout);
        let scripts_dir = if config.scripts_dir.is_absolute() {
            config.scripts_dir.clone()
        } else {
            std::env::current_dir()
                .context("Failed to determine the current directory")?
                .join(&config.scripts_dir)
        };
        Ok(Self {
            variant,
            layout,
            jobs: config.jobs.unwrap_or_else(detected_jobs).max(1),
            assume_yes: assume_yes || config.assume_yes,
            install_prefix: config.install_prefix.clone(),
            scripts_dir,
            user_bin: paths::user_bin_dir()?,
        })
    }
}

/// Materialize the request sets for this host, in installation order.
pub fn request_sets(catalog: &Catalog, ctx: &HostContext, config: &Config) -> Vec<RequestSet> {
    Category::ALL
        .into_iter()
        .map(|category| catalog.materialize(category, ctx.variant, config.extras_for(category)))
        .collect()
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub bootstrap: BootstrapReport,
    pub batches: Vec<(Category, BatchReport)>,
    pub builds: Vec<(&'static str, BuildOutcome)>,
    pub pipx_installed: Vec<String>,
    pub prompt_installed: bool,
    pub browser_hook: Option<HookResult>,
    pub scripts: ScriptReport,
}

impl RunSummary {
    pub fn build_failures(&self) -> Vec<&'static str> {
        self.builds
            .iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn packages_installed(&self) -> usize {
        self.batches.iter().map(|(_, r)| r.installed.len()).sum()
    }

    pub fn print(&self) {
        separator(false);
        if self.bootstrap.changed() {
            emit(
                Level::Info,
                "provision.summary.sources",
                &format!("{} Registered new package sources", char::from(NerdFont::Key)),
                None,
            );
        }
        emit(
            Level::Info,
            "provision.summary.packages",
            &format!(
                "{} {} packages installed in {} transactions, {} already present",
                char::from(NerdFont::Package),
                self.packages_installed(),
                self.batches
                    .iter()
                    .filter(|(_, r)| r.transaction_issued())
                    .count(),
                self.batches
                    .iter()
                    .map(|(_, r)| r.satisfied.len())
                    .sum::<usize>()
            ),
            None,
        );
        for (name, outcome) in &self.builds {
            let level = if outcome.is_failure() {
                Level::Warn
            } else {
                Level::Info
            };
            emit(
                level,
                "provision.summary.build",
                &format!("{} {}: {}", char::from(NerdFont::Wrench), name, outcome),
                Some(serde_json::json!({ "target": name, "exit_code": outcome.exit_code() })),
            );
        }
        if !self.scripts.missing.is_empty() {
            emit(
                Level::Warn,
                "provision.summary.scripts_missing",
                &format!(
                    "{} Missing setup scripts: {}",
                    char::from(NerdFont::Warning),
                    self.scripts.missing.join(", ")
                ),
                None,
            );
        }

        let failures = self.build_failures();
        if failures.is_empty() {
            emit(
                Level::Success,
                "provision.complete",
                &format!("{} Desktop provisioning complete", char::from(NerdFont::Desktop)),
                None,
            );
        } else {
            emit(
                Level::Warn,
                "provision.complete_with_failures",
                &format!(
                    "{} Provisioning finished, but these source builds failed: {}",
                    char::from(NerdFont::Warning),
                    failures.join(", ")
                ),
                Some(serde_json::json!({ "failed_builds": failures })),
            );
        }
    }
}

pub struct Provisioner<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a Config,
    ctx: &'a HostContext,
    catalog: Catalog,
}

impl<'a> Provisioner<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a Config, ctx: &'a HostContext) -> Self {
        Self {
            runner,
            config,
            ctx,
            catalog: Catalog::standard(),
        }
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Run every step in order. Errors are fatal; failed source builds are
    /// recorded in the summary and the run continues.
    pub fn run(&self) -> Result<RunSummary> {
        let ctx = self.ctx;
        let mut summary = RunSummary::default();

        emit(
            Level::Info,
            "provision.variant",
            &format!("{} Detected {} host", char::from(NerdFont::Desktop), ctx.variant),
            Some(serde_json::json!({ "variant": ctx.variant.id() })),
        );

        section("Package sources");
        summary.bootstrap = RepoBootstrapper::new(self.runner, &ctx.layout, ctx.assume_yes)
            .bootstrap(ctx.variant)?;
        let omitted = self.catalog.omitted(ctx.variant);
        if !omitted.is_empty() {
            emit(
                Level::Info,
                "provision.omitted",
                &format!(
                    "{} Not installed on {} without extra sources: {}",
                    char::from(NerdFont::Info),
                    ctx.variant,
                    omitted.join(", ")
                ),
                Some(serde_json::json!({ "packages": omitted })),
            );
        }

        let installer = BatchInstaller::new(self.runner, ctx.assume_yes);
        for set in request_sets(&self.catalog, ctx, self.config) {
            section(set.category.display_name());
            let report = installer
                .install(&set.packages)
                .with_context(|| format!("Failed to install {}", set.category))?;
            summary.batches.push((set.category, report));
        }

        section("Source builds");
        let builder = SourceBuilder::new(self.runner, &ctx.layout, ctx.jobs, &ctx.install_prefix)
            .assume_yes(ctx.assume_yes);
        for tool in Tool::ALL {
            let target = tool.target();
            if self.config.skips_source_build(target.name) {
                emit(
                    Level::Info,
                    "build.disabled",
                    &format!(
                        "{} Skipping {} (disabled in config)",
                        char::from(NerdFont::Skip),
                        target.name
                    ),
                    None,
                );
                continue;
            }
            let outcome = builder.build(target)?;
            summary.builds.push((target.name, outcome));
        }

        section("Tools");
        summary.pipx_installed = setup::ensure_tools(self.runner, &self.config.pipx_tools)?;
        summary.prompt_installed = setup::ensure_prompt(self.runner, &ctx.user_bin)?;
        summary.browser_hook = Some(setup::run_browser_hook(self.runner, &ctx.user_bin));

        section("Setup scripts");
        summary.scripts = setup::run_scripts(self.runner, &ctx.scripts_dir, |name| {
            self.config.skips_script(name)
        })?;

        summary.print();
        Ok(summary)
    }
}

fn section(title: &str) {
    separator(true);
    emit(Level::Info, "provision.section", title, None);
}

/// Show the request sets for this host with their install state.
pub fn list_packages(
    runner: &dyn CommandRunner,
    ctx: &HostContext,
    config: &Config,
    only: Option<Category>,
) {
    let query = PackageQuery::new(runner);
    for set in request_sets(&Catalog::standard(), ctx, config) {
        if only.is_some_and(|c| c != set.category) {
            continue;
        }
        separator(true);
        let states: Vec<(String, bool)> = set
            .packages
            .iter()
            .map(|p| (p.clone(), query.is_installed(p)))
            .collect();
        emit(
            Level::Info,
            "packages.category",
            &format!("{} ({})", set.category, set.category.id()),
            Some(serde_json::json!({
                "category": set.category.id(),
                "variant": ctx.variant.id(),
                "packages": states
                    .iter()
                    .map(|(name, installed)| {
                        serde_json::json!({ "name": name, "installed": installed })
                    })
                    .collect::<Vec<_>>(),
            })),
        );
        for (name, installed) in &states {
            let icon = if *installed { NerdFont::Check } else { NerdFont::Download };
            emit(
                Level::Info,
                "packages.entry",
                &format!("  {} {}", char::from(icon), name),
                None,
            );
        }
    }
}
