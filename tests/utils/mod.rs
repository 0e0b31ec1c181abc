use anyhow::Result;
use std::process::Command;

use super::common::TestEnvironment;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Parse stdout as one JSON event per line.
    pub fn events(&self) -> Vec<serde_json::Value> {
        self.stdout
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

/// Run the deskstrap binary against the environment's fake host.
pub fn run_deskstrap_command(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let root = env.root();
    let output = Command::new(env!("CARGO_BIN_EXE_deskstrap"))
        .args(args)
        .arg("--root")
        .arg(&root)
        .arg("--no-color")
        .env("HOME", env.home())
        .env("XDG_CONFIG_HOME", env.home().join(".config"))
        .env_remove("XDG_BIN_HOME")
        .current_dir(env.path())
        .output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}
