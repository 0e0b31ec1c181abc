use std::path::Path;

use crate::common::runner::{CommandRunner, CommandSpec};
use crate::ui::prelude::*;

pub const PYWALFOX: &str = "pywalfox";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookResult {
    Ran,
    /// The hook binary is not installed.
    Missing,
    Failed,
}

/// Register the pywalfox native messaging host with the browser.
///
/// Optional: a missing binary or a failing hook is a warning.
pub fn run_browser_hook(runner: &dyn CommandRunner, bin_dir: &Path) -> HookResult {
    let Some(program) = runner
        .resolve(PYWALFOX)
        .or_else(|| Some(bin_dir.join(PYWALFOX)).filter(|p| p.exists()))
    else {
        emit(
            Level::Warn,
            "setup.browser.missing",
            &format!(
                "{} pywalfox not found, skipping browser integration",
                char::from(NerdFont::Warning)
            ),
            None,
        );
        return HookResult::Missing;
    };

    let spec = CommandSpec::new(program.to_string_lossy()).arg("install");
    match runner.run(&spec) {
        Ok(()) => {
            emit(
                Level::Success,
                "setup.browser.installed",
                &format!("{} Browser integration registered", char::from(NerdFont::Check)),
                None,
            );
            HookResult::Ran
        }
        Err(err) => {
            emit(
                Level::Warn,
                "setup.browser.failed",
                &format!("{} Browser integration failed: {:#}", char::from(NerdFont::Warning), err),
                None,
            );
            HookResult::Failed
        }
    }
}
