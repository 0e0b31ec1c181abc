//! External setup scripts.
//!
//! Each script is a black box run with `bash` from the scripts directory.
//! Order is fixed; a failing script stops the run.

use anyhow::{Context, Result};
use std::path::Path;

use crate::common::runner::{CommandRunner, CommandSpec};
use crate::ui::prelude::*;

/// Collaborator scripts in the order they run.
pub const SCRIPT_ORDER: &[&str] = &[
    "_prebuilt.sh",
    "_ml4w-apps.sh",
    "_flatpaks.sh",
    "fonts.sh",
    "icons.sh",
    "cursors.sh",
];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScriptReport {
    pub ran: Vec<String>,
    pub skipped: Vec<String>,
    pub missing: Vec<String>,
}

/// Run every script in [`SCRIPT_ORDER`] found in `dir`, except those
/// `skip` rejects.
pub fn run_scripts(
    runner: &dyn CommandRunner,
    dir: &Path,
    skip: impl Fn(&str) -> bool,
) -> Result<ScriptReport> {
    let mut report = ScriptReport::default();

    for name in SCRIPT_ORDER {
        let name = name.to_string();
        if skip(&name) {
            emit(
                Level::Info,
                "setup.script.skipped",
                &format!("{} Skipping {} (disabled in config)", char::from(NerdFont::Skip), name),
                Some(serde_json::json!({ "script": name })),
            );
            report.skipped.push(name);
            continue;
        }

        let path = dir.join(&name);
        if !path.is_file() {
            emit(
                Level::Warn,
                "setup.script.missing",
                &format!(
                    "{} {} not found in {}",
                    char::from(NerdFont::Warning),
                    name,
                    dir.display()
                ),
                Some(serde_json::json!({ "script": name, "dir": dir.display().to_string() })),
            );
            report.missing.push(name);
            continue;
        }

        emit(
            Level::Info,
            "setup.script.run",
            &format!("{} Running {}", char::from(NerdFont::Terminal), name),
            Some(serde_json::json!({ "script": name })),
        );
        runner
            .run(&CommandSpec::new("bash").path_arg(&path).dir(dir))
            .with_context(|| format!("Setup script {} failed", name))?;
        report.ran.push(name);
    }

    Ok(report)
}
