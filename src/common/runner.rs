//! The single seam through which deskstrap touches external programs.
//!
//! Every apt transaction, clone, build step and collaborator script goes
//! through a [`CommandRunner`]. The production implementation shells out with
//! `duct`; [`DryRunRunner`] only reports mutating commands, and tests swap in
//! a recording fake.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::ui::prelude::*;

/// Description of one external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
    /// Needs root; prefixed with `sudo` when not already running as root.
    pub privileged: bool,
    pub stdin: Option<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
            privileged: false,
            stdin: None,
        }
    }

    /// A bash pipeline that fails when any stage fails, not just the last.
    pub fn pipeline(script: impl Into<String>) -> Self {
        Self::new("bash").args(["-o", "pipefail", "-c"]).arg(script)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Program followed by its arguments, without any privilege prefix.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Shell-quoted command line as the operator would type it.
    pub fn display(&self) -> String {
        let line = shell_words::join(self.argv());
        if self.privileged {
            format!("sudo {}", line)
        } else {
            line
        }
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Captured result of a read-only command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub status: Option<i32>,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            status: Some(0),
        }
    }

    pub fn failure(code: i32) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            status: Some(code),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == Some(0)
    }
}

pub trait CommandRunner {
    /// Run to completion with inherited stdio. A non-zero exit is an error.
    fn run(&self, spec: &CommandSpec) -> Result<()>;

    /// Run and capture output. Only a failure to spawn is an error; the exit
    /// status is reported in the returned [`CommandOutput`].
    fn read(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// Locate a runnable command on `PATH`.
    fn resolve(&self, program: &str) -> Option<PathBuf>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, spec: &CommandSpec) -> Result<()> {
        (**self).run(spec)
    }

    fn read(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        (**self).read(spec)
    }

    fn resolve(&self, program: &str) -> Option<PathBuf> {
        (**self).resolve(program)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&self, spec: &CommandSpec) -> Result<()> {
        (**self).run(spec)
    }

    fn read(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        (**self).read(spec)
    }

    fn resolve(&self, program: &str) -> Option<PathBuf> {
        (**self).resolve(program)
    }
}

/// Runs commands on the real host through `duct`.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    escalate: bool,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self {
            escalate: !matches!(sudo::check(), sudo::RunningAs::Root),
        }
    }

    fn expression(&self, spec: &CommandSpec) -> duct::Expression {
        let mut expr = if spec.privileged && self.escalate {
            duct::cmd("sudo", spec.argv())
        } else {
            duct::cmd(&spec.program, &spec.args)
        };
        if let Some(dir) = &spec.dir {
            expr = expr.dir(dir);
        }
        if let Some(input) = &spec.stdin {
            expr = expr.stdin_bytes(input.clone().into_bytes());
        }
        expr
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<()> {
        emit(
            Level::Debug,
            "runner.run",
            &format!("$ {}", spec.display()),
            None,
        );
        self.expression(spec)
            .run()
            .with_context(|| format!("`{}` failed", spec.display()))?;
        Ok(())
    }

    fn read(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        emit(
            Level::Debug,
            "runner.read",
            &format!("$ {}", spec.display()),
            None,
        );
        let output = self
            .expression(spec)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .with_context(|| format!("Failed to execute `{}`", spec.display()))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status.code(),
        })
    }

    fn resolve(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

/// Reports mutating commands instead of running them.
///
/// Queries still run against the host so the preview reflects what is
/// actually installed.
pub struct DryRunRunner<R> {
    inner: R,
}

impl<R: CommandRunner> DryRunRunner<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: CommandRunner> CommandRunner for DryRunRunner<R> {
    fn run(&self, spec: &CommandSpec) -> Result<()> {
        let location = spec
            .dir
            .as_ref()
            .map(|d| format!(" (in {})", d.display()))
            .unwrap_or_default();
        emit(
            Level::Info,
            "runner.dry_run",
            &format!("[DRY RUN] {}{}", spec.display(), location),
            Some(serde_json::json!({ "argv": spec.argv(), "privileged": spec.privileged })),
        );
        Ok(())
    }

    fn read(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.inner.read(spec)
    }

    fn resolve(&self, program: &str) -> Option<PathBuf> {
        self.inner.resolve(program)
    }
}
