use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use clap_complete::Shell;

const BIN_NAME: &str = "deskstrap";

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SupportedShell {
    Bash,
    Zsh,
    Fish,
}

impl SupportedShell {
    fn as_complete_shell(self) -> Shell {
        match self {
            SupportedShell::Bash => Shell::Bash,
            SupportedShell::Zsh => Shell::Zsh,
            SupportedShell::Fish => Shell::Fish,
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            SupportedShell::Bash => "deskstrap.bash",
            SupportedShell::Zsh => "_deskstrap",
            SupportedShell::Fish => "deskstrap.fish",
        }
    }

    fn default_dir(self) -> Option<PathBuf> {
        let data = dirs::data_dir().or_else(|| dirs::home_dir().map(|h| h.join(".local/share")))?;
        Some(match self {
            SupportedShell::Bash => data.join("bash-completion/completions"),
            SupportedShell::Zsh => data.join("zsh/site-functions"),
            SupportedShell::Fish => dirs::config_dir()?.join("fish/completions"),
        })
    }
}

impl fmt::Display for SupportedShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupportedShell::Bash => write!(f, "bash"),
            SupportedShell::Zsh => write!(f, "zsh"),
            SupportedShell::Fish => write!(f, "fish"),
        }
    }
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum CompletionCommands {
    /// Print the completion script to stdout
    Generate {
        #[arg(value_enum)]
        shell: SupportedShell,
    },
    /// Write the completion script where the shell looks for it
    Install {
        #[arg(value_enum)]
        shell: SupportedShell,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        force: bool,
    },
}

pub fn generate(shell: SupportedShell) -> Result<String> {
    let mut command = crate::cli_command();
    let mut buffer = Vec::new();
    clap_complete::generate(shell.as_complete_shell(), &mut command, BIN_NAME, &mut buffer);
    String::from_utf8(buffer).context("rendering completions")
}

pub fn install(shell: SupportedShell, output: Option<PathBuf>, force: bool) -> Result<PathBuf> {
    let target_path = match output {
        Some(path) => path,
        None => shell
            .default_dir()
            .context("Unable to determine a completions directory, pass --output")?
            .join(shell.file_name()),
    };

    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating completions directory {}", parent.display()))?;
    }

    if target_path.exists() && !force {
        return Err(anyhow!(
            "{} already exists, pass --force to overwrite",
            target_path.display()
        ));
    }

    let script = generate(shell)?;
    fs::write(&target_path, script)
        .with_context(|| format!("writing completion script to {}", target_path.display()))?;

    Ok(target_path)
}

pub fn installed_message(shell: SupportedShell, path: &Path) -> String {
    format!(
        "Installed {} completions to {}. Start a new shell to use them.",
        shell,
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_mentions_subcommands() {
        let script = generate(SupportedShell::Bash).unwrap();
        assert!(script.contains(BIN_NAME));
        assert!(script.contains("detect"));
    }

    #[test]
    fn test_install_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("deskstrap.bash");
        install(SupportedShell::Bash, Some(target.clone()), false).unwrap();
        assert!(install(SupportedShell::Bash, Some(target.clone()), false).is_err());
        install(SupportedShell::Bash, Some(target), true).unwrap();
    }
}
