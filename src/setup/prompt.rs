use anyhow::{Context, Result};
use std::path::Path;

use crate::common::runner::{CommandRunner, CommandSpec};
use crate::ui::prelude::*;

pub const OH_MY_POSH: &str = "oh-my-posh";
const INSTALLER_URL: &str = "https://ohmyposh.dev/install.sh";

/// Exits non-zero when the download fails, not just when the script does.
pub fn installer_command(bin_dir: &Path) -> CommandSpec {
    CommandSpec::pipeline(format!(
        "curl -fsSL {} | bash -s -- -d {}",
        INSTALLER_URL,
        shell_words::quote(&bin_dir.to_string_lossy())
    ))
}

/// Install the oh-my-posh prompt into `bin_dir` unless it is already there.
///
/// Returns whether the installer ran.
pub fn ensure_prompt(runner: &dyn CommandRunner, bin_dir: &Path) -> Result<bool> {
    let existing = runner
        .resolve(OH_MY_POSH)
        .or_else(|| Some(bin_dir.join(OH_MY_POSH)).filter(|p| p.exists()));
    if let Some(path) = existing {
        emit(
            Level::Info,
            "setup.prompt.present",
            &format!(
                "{} oh-my-posh is already installed at {}",
                char::from(NerdFont::Check),
                path.display()
            ),
            None,
        );
        return Ok(false);
    }

    emit(
        Level::Info,
        "setup.prompt.install",
        &format!(
            "{} Installing oh-my-posh into {}",
            char::from(NerdFont::Download),
            bin_dir.display()
        ),
        None,
    );
    runner
        .run(&installer_command(bin_dir))
        .context("Failed to install oh-my-posh")?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fake_runner::FakeRunner;
    use tempfile::TempDir;

    #[test]
    fn test_installer_targets_user_bin() {
        let spec = installer_command(Path::new("/home/me/.local/bin"));
        assert_eq!(spec.program, "bash");
        assert_eq!(spec.args[..3], ["-o", "pipefail", "-c"]);
        assert_eq!(
            spec.args[3],
            "curl -fsSL https://ohmyposh.dev/install.sh | bash -s -- -d /home/me/.local/bin"
        );
        assert!(!spec.privileged);
    }

    #[test]
    fn test_resolvable_prompt_is_skipped() {
        let fake = FakeRunner::new().with_resolvable(OH_MY_POSH);
        assert!(!ensure_prompt(&fake, Path::new("/nonexistent")).unwrap());
        assert!(fake.runs().is_empty());
    }

    #[test]
    fn test_prompt_in_user_bin_is_skipped() {
        let bin = TempDir::new().unwrap();
        std::fs::write(bin.path().join(OH_MY_POSH), "").unwrap();
        let fake = FakeRunner::new();
        assert!(!ensure_prompt(&fake, bin.path()).unwrap());
        assert!(fake.runs().is_empty());
    }

    #[test]
    fn test_missing_prompt_is_installed() {
        let bin = TempDir::new().unwrap();
        let fake = FakeRunner::new();
        assert!(ensure_prompt(&fake, bin.path()).unwrap());
        assert_eq!(fake.runs_of("bash").len(), 1);
    }

    #[test]
    fn test_failed_download_is_an_error() {
        let bin = TempDir::new().unwrap();
        let fake = FakeRunner::new();
        fake.fail_on("ohmyposh.dev");
        let err = ensure_prompt(&fake, bin.path()).unwrap_err();
        assert!(err.to_string().contains("oh-my-posh"));
        assert!(!bin.path().join(OH_MY_POSH).exists());
    }

    #[test]
    fn test_download_failure_fails_the_pipeline() {
        let bin = TempDir::new().unwrap();
        let script = installer_command(bin.path())
            .args
            .last()
            .cloned()
            .unwrap()
            .replace(INSTALLER_URL, "file:///nonexistent/install.sh");
        let runner = crate::common::runner::SystemRunner::new();
        let out = runner.read(&CommandSpec::pipeline(script)).unwrap();
        assert!(!out.succeeded());
    }
}
