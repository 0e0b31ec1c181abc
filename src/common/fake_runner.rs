//! Recording [`CommandRunner`] for tests.
//!
//! Keeps a tiny model of the host so idempotence can be exercised: a
//! successful `apt install` marks its packages installed, a successful
//! `install ... <dest>` makes the destination's file name resolvable and a
//! successful `git clone` creates the checkout directory.

use anyhow::{Result, anyhow};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use super::runner::{CommandOutput, CommandRunner, CommandSpec};

#[derive(Default)]
pub struct FakeRunner {
    runs: RefCell<Vec<CommandSpec>>,
    reads: RefCell<Vec<CommandSpec>>,
    installed: RefCell<BTreeSet<String>>,
    resolvable: RefCell<BTreeSet<String>>,
    failures: RefCell<Vec<String>>,
    responses: RefCell<HashMap<String, CommandOutput>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_installed<I, S>(self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.installed
            .borrow_mut()
            .extend(packages.into_iter().map(Into::into));
        self
    }

    pub fn with_resolvable(self, program: &str) -> Self {
        self.resolvable.borrow_mut().insert(program.to_string());
        self
    }

    /// Any `run` whose rendered command line contains `pattern` exits 1.
    pub fn fail_on(&self, pattern: &str) {
        self.failures.borrow_mut().push(pattern.to_string());
    }

    /// Scripted answer for `read` calls whose command line starts with `prefix`.
    pub fn respond(&self, prefix: &str, output: CommandOutput) {
        self.responses
            .borrow_mut()
            .insert(prefix.to_string(), output);
    }

    pub fn runs(&self) -> Vec<CommandSpec> {
        self.runs.borrow().clone()
    }

    pub fn reads(&self) -> Vec<CommandSpec> {
        self.reads.borrow().clone()
    }

    /// Rendered command lines of every `run`, in order.
    pub fn run_lines(&self) -> Vec<String> {
        self.runs.borrow().iter().map(|s| s.display()).collect()
    }

    pub fn runs_of(&self, program: &str) -> Vec<CommandSpec> {
        self.runs
            .borrow()
            .iter()
            .filter(|s| s.program == program)
            .cloned()
            .collect()
    }

    pub fn is_installed(&self, package: &str) -> bool {
        self.installed.borrow().contains(package)
    }

    fn apply_effects(&self, spec: &CommandSpec) {
        match spec.program.as_str() {
            "apt" if spec.args.first().map(String::as_str) == Some("install") => {
                let mut installed = self.installed.borrow_mut();
                for arg in spec.args.iter().skip(1).filter(|a| !a.starts_with('-')) {
                    installed.insert(arg.clone());
                }
            }
            "install" => {
                if let Some(name) = spec
                    .args
                    .last()
                    .and_then(|dest| Path::new(dest).file_name())
                {
                    self.resolvable
                        .borrow_mut()
                        .insert(name.to_string_lossy().to_string());
                }
            }
            "git" if spec.args.first().map(String::as_str) == Some("clone") => {
                if let Some(target) = spec.args.last() {
                    let target = PathBuf::from(target);
                    let _ = std::fs::create_dir_all(&target);
                    let _ = std::fs::write(target.join("README.md"), "checkout");
                }
            }
            _ => {}
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, spec: &CommandSpec) -> Result<()> {
        self.runs.borrow_mut().push(spec.clone());
        let line = spec.display();
        if self.failures.borrow().iter().any(|p| line.contains(p)) {
            return Err(anyhow!("`{}` failed: exited with status 1", line));
        }
        self.apply_effects(spec);
        Ok(())
    }

    fn read(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.reads.borrow_mut().push(spec.clone());

        if spec.program == "dpkg-query" {
            let package = spec.args.last().cloned().unwrap_or_default();
            return Ok(if self.installed.borrow().contains(&package) {
                CommandOutput::success("install ok installed")
            } else {
                CommandOutput {
                    stdout: String::new(),
                    stderr: format!("dpkg-query: no packages found matching {}", package),
                    status: Some(1),
                }
            });
        }

        let line = spec.display();
        let responses = self.responses.borrow();
        let scripted = responses
            .iter()
            .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, output)| output.clone());
        Ok(scripted.unwrap_or_else(|| CommandOutput::success("")))
    }

    fn resolve(&self, program: &str) -> Option<PathBuf> {
        self.resolvable
            .borrow()
            .contains(program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }
}
