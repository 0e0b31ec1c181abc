//! Extra package sources.
//!
//! Only Ubuntu needs anything registered: the Hyprland PPA and the signed
//! wezterm repository. Each piece is checked before it is added so a rerun
//! changes nothing.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::distro::Variant;
use crate::common::paths::HostLayout;
use crate::common::runner::{CommandRunner, CommandSpec};
use crate::package::BatchInstaller;
use crate::ui::prelude::*;

pub const HYPRLAND_PPA: &str = "ppa:cppiber/hyprland";
/// How the PPA appears in a registered source entry.
const HYPRLAND_PPA_MARKER: &str = "cppiber/hyprland";

pub const WEZTERM_KEY_URL: &str = "https://apt.fury.io/wez/gpg.key";
pub const WEZTERM_KEYRING: &str = "/usr/share/keyrings/wezterm-fury.gpg";
pub const WEZTERM_SOURCE_FILE: &str = "/etc/apt/sources.list.d/wezterm.list";
const WEZTERM_REPO: &str = "https://apt.fury.io/wez/";

/// Needed to register the sources above.
const BOOTSTRAP_TOOLS: &[&str] = &["software-properties-common", "curl", "gpg"];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub ppa_added: bool,
    pub keyring_created: bool,
    pub source_written: bool,
    pub refreshed: bool,
}

impl BootstrapReport {
    pub fn changed(&self) -> bool {
        self.ppa_added || self.keyring_created || self.source_written
    }
}

pub struct RepoBootstrapper<'a> {
    runner: &'a dyn CommandRunner,
    layout: &'a HostLayout,
    assume_yes: bool,
}

impl<'a> RepoBootstrapper<'a> {
    pub fn new(runner: &'a dyn CommandRunner, layout: &'a HostLayout, assume_yes: bool) -> Self {
        Self {
            runner,
            layout,
            assume_yes,
        }
    }

    pub fn bootstrap(&self, variant: Variant) -> Result<BootstrapReport> {
        match variant {
            Variant::Ubuntu => self.bootstrap_ubuntu(),
            Variant::Debian => {
                emit(
                    Level::Info,
                    "repos.native",
                    &format!(
                        "{} Debian ships the required packages, no extra sources needed",
                        char::from(NerdFont::Info)
                    ),
                    None,
                );
                Ok(BootstrapReport::default())
            }
            Variant::Generic => {
                emit(
                    Level::Info,
                    "repos.manual",
                    &format!(
                        "{} Unrecognized apt-based distribution: add any missing package sources manually",
                        char::from(NerdFont::Info)
                    ),
                    None,
                );
                Ok(BootstrapReport::default())
            }
        }
    }

    fn bootstrap_ubuntu(&self) -> Result<BootstrapReport> {
        let tools: Vec<String> = BOOTSTRAP_TOOLS.iter().map(|s| s.to_string()).collect();
        BatchInstaller::new(self.runner, self.assume_yes)
            .install(&tools)
            .context("Failed to install repository tooling")?;

        let mut report = BootstrapReport::default();

        if self.ppa_registered() {
            self.already(
                "repos.ppa.present",
                &format!("{} is already registered", HYPRLAND_PPA),
            );
        } else {
            emit(
                Level::Info,
                "repos.ppa.add",
                &format!("{} Adding {}", char::from(NerdFont::Package), HYPRLAND_PPA),
                None,
            );
            self.runner
                .run(
                    &CommandSpec::new("add-apt-repository")
                        .args(["-y", HYPRLAND_PPA])
                        .privileged(),
                )
                .with_context(|| format!("Failed to add {}", HYPRLAND_PPA))?;
            report.ppa_added = true;
        }

        let keyring = self.layout.path(WEZTERM_KEYRING);
        if keyring_installed(&keyring) {
            self.already("repos.keyring.present", "wezterm signing key is already installed");
        } else {
            emit(
                Level::Info,
                "repos.keyring.fetch",
                &format!("{} Fetching wezterm signing key", char::from(NerdFont::Key)),
                None,
            );
            self.runner
                .run(&keyring_command(&keyring))
                .context("Failed to install the wezterm signing key")?;
            report.keyring_created = true;
        }

        let source_file = self.layout.path(WEZTERM_SOURCE_FILE);
        if source_file.exists() {
            self.already("repos.source.present", "wezterm source entry already exists");
        } else {
            emit(
                Level::Info,
                "repos.source.write",
                &format!("{} Registering wezterm repository", char::from(NerdFont::Package)),
                None,
            );
            self.runner
                .run(
                    &CommandSpec::new("install")
                        .args(["-D", "-m", "644", "/dev/stdin"])
                        .path_arg(&source_file)
                        .stdin(wezterm_source_entry())
                        .privileged(),
                )
                .with_context(|| format!("Failed to write {}", source_file.display()))?;
            report.source_written = true;
        }

        self.runner
            .run(&CommandSpec::new("apt").arg("update").privileged())
            .context("Failed to refresh package indexes")?;
        report.refreshed = true;

        Ok(report)
    }

    fn ppa_registered(&self) -> bool {
        self.layout
            .source_files()
            .iter()
            .filter_map(|path| fs::read_to_string(path).ok())
            .any(|content| content.contains(HYPRLAND_PPA_MARKER))
    }

    fn already(&self, code: &str, message: &str) {
        emit(
            Level::Info,
            code,
            &format!("{} {}", char::from(NerdFont::Check), message),
            None,
        );
    }
}

/// An empty keyring is what an interrupted download leaves behind.
fn keyring_installed(keyring: &Path) -> bool {
    fs::metadata(keyring).is_ok_and(|meta| meta.len() > 0)
}

/// Download and dearmor the wezterm key.
///
/// The key is written next to the keyring and only moved into place once the
/// whole pipeline succeeded, so a failed fetch never leaves a keyring behind.
pub fn keyring_command(keyring: &Path) -> CommandSpec {
    let target = keyring.to_string_lossy();
    let partial = format!("{}.partial", target);
    CommandSpec::pipeline(format!(
        "curl -fsSL {url} | gpg --yes --dearmor -o {partial} && mv -f {partial} {target} \
         || {{ rm -f {partial}; exit 1; }}",
        url = WEZTERM_KEY_URL,
        partial = shell_words::quote(&partial),
        target = shell_words::quote(&target),
    ))
    .privileged()
}

/// One-line apt source entry for the wezterm repository.
pub fn wezterm_source_entry() -> String {
    format!("deb [signed-by={}] {} * *\n", WEZTERM_KEYRING, WEZTERM_REPO)
}
