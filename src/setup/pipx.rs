use anyhow::{Context, Result};

use crate::common::runner::{CommandRunner, CommandSpec};
use crate::ui::prelude::*;

/// Tool names from `pipx list --short` output (`name version` per line).
pub fn parse_short_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Tools pipx already manages. A failing listing counts as none.
pub fn installed_tools(runner: &dyn CommandRunner) -> Vec<String> {
    runner
        .read(&CommandSpec::new("pipx").args(["list", "--short"]))
        .ok()
        .filter(|out| out.succeeded())
        .map(|out| parse_short_list(&out.stdout))
        .unwrap_or_default()
}

/// Install each tool into its own pipx environment unless already present.
///
/// Returns the tools that were installed.
pub fn ensure_tools(runner: &dyn CommandRunner, tools: &[String]) -> Result<Vec<String>> {
    if tools.is_empty() {
        return Ok(Vec::new());
    }

    let present = installed_tools(runner);
    let mut installed = Vec::new();
    for tool in tools {
        if present.contains(tool) {
            emit(
                Level::Info,
                "setup.pipx.present",
                &format!("{} {} is already installed with pipx", char::from(NerdFont::Check), tool),
                Some(serde_json::json!({ "tool": tool })),
            );
            continue;
        }
        emit(
            Level::Info,
            "setup.pipx.install",
            &format!("{} Installing {} with pipx", char::from(NerdFont::Download), tool),
            Some(serde_json::json!({ "tool": tool })),
        );
        runner
            .run(&CommandSpec::new("pipx").args(["install", tool.as_str()]))
            .with_context(|| format!("Failed to install {} with pipx", tool))?;
        installed.push(tool.clone());
    }
    Ok(installed)
}
