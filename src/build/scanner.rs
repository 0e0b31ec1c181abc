//! pkg-config metadata for `wayland-scanner`.
//!
//! Some Debian-family releases ship the scanner binary without a `.pc`
//! descriptor, which breaks CMake's `pkg_check_modules`. When pkg-config
//! cannot find it, a descriptor is written under `/usr/local`.

use anyhow::{Context, Result};
use regex::Regex;

use crate::common::paths::HostLayout;
use crate::common::runner::{CommandRunner, CommandSpec};
use crate::ui::prelude::*;

pub const DESCRIPTOR_PATH: &str = "/usr/local/share/pkgconfig/wayland-scanner.pc";

/// Used when the installed scanner cannot report its version. May not match
/// the real binary.
pub const FALLBACK_VERSION: &str = "1.22.0";

/// Scanner version as detected, or the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerVersion {
    pub version: String,
    pub detected: bool,
}

/// Extract `X.Y` or `X.Y.Z` from `wayland-scanner --version` output.
pub fn parse_version(output: &str) -> Option<String> {
    let re = Regex::new(r"\b(\d+\.\d+(?:\.\d+)?)\b").ok()?;
    re.captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn probe_version(runner: &dyn CommandRunner) -> ScannerVersion {
    let detected = runner
        .read(&CommandSpec::new("wayland-scanner").arg("--version"))
        .ok()
        .filter(|out| out.succeeded())
        // wayland-scanner prints its version on stderr
        .and_then(|out| parse_version(&format!("{}\n{}", out.stdout, out.stderr)));

    match detected {
        Some(version) => ScannerVersion {
            version,
            detected: true,
        },
        None => ScannerVersion {
            version: FALLBACK_VERSION.to_string(),
            detected: false,
        },
    }
}

pub fn render_descriptor(version: &str) -> String {
    format!(
        "prefix=/usr\n\
         exec_prefix=${{prefix}}\n\
         datarootdir=${{prefix}}/share\n\
         pkgdatadir=${{datarootdir}}/wayland\n\
         bindir=${{exec_prefix}}/bin\n\
         wayland_scanner=${{bindir}}/wayland-scanner\n\
         \n\
         Name: Wayland Scanner\n\
         Description: Wayland scanner\n\
         Version: {}\n",
        version
    )
}

pub fn descriptor_present(runner: &dyn CommandRunner) -> bool {
    runner
        .read(&CommandSpec::new("pkg-config").args(["--exists", "wayland-scanner"]))
        .map(|out| out.succeeded())
        .unwrap_or(false)
}

/// Make sure pkg-config can resolve `wayland-scanner`.
///
/// Returns whether a descriptor was written.
pub fn ensure_descriptor(runner: &dyn CommandRunner, layout: &HostLayout) -> Result<bool> {
    if descriptor_present(runner) {
        emit(
            Level::Debug,
            "build.scanner.present",
            "wayland-scanner.pc is visible to pkg-config",
            None,
        );
        return Ok(false);
    }

    let probe = probe_version(runner);
    if !probe.detected {
        emit(
            Level::Warn,
            "build.scanner.fallback_version",
            &format!(
                "{} Could not determine the wayland-scanner version, assuming {} (may not match the installed scanner)",
                char::from(NerdFont::Warning),
                probe.version
            ),
            None,
        );
    }

    let destination = layout.path(DESCRIPTOR_PATH);
    emit(
        Level::Info,
        "build.scanner.write",
        &format!(
            "{} Writing {} (version {})",
            char::from(NerdFont::Wrench),
            destination.display(),
            probe.version
        ),
        Some(serde_json::json!({
            "path": destination.display().to_string(),
            "version": probe.version,
            "detected": probe.detected,
        })),
    );
    runner
        .run(
            &CommandSpec::new("install")
                .args(["-D", "-m", "644", "/dev/stdin"])
                .path_arg(&destination)
                .stdin(render_descriptor(&probe.version))
                .privileged(),
        )
        .with_context(|| format!("Failed to write {}", destination.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fake_runner::FakeRunner;
    use crate::common::runner::CommandOutput;

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("wayland-scanner 1.22.0").as_deref(), Some("1.22.0"));
        assert_eq!(parse_version("wayland-scanner 1.23").as_deref(), Some("1.23"));
        assert_eq!(parse_version("wayland-scanner: unknown option"), None);
    }

    #[test]
    fn test_probe_reads_stderr() {
        let fake = FakeRunner::new();
        fake.respond(
            "wayland-scanner --version",
            CommandOutput {
                stdout: String::new(),
                stderr: "wayland-scanner 1.21.0\n".to_string(),
                status: Some(0),
            },
        );
        assert_eq!(
            probe_version(&fake),
            ScannerVersion {
                version: "1.21.0".to_string(),
                detected: true
            }
        );
    }

    #[test]
    fn test_probe_failure_falls_back() {
        let fake = FakeRunner::new();
        fake.respond("wayland-scanner --version", CommandOutput::failure(127));
        let probe = probe_version(&fake);
        assert_eq!(probe.version, FALLBACK_VERSION);
        assert!(!probe.detected);
    }

    #[test]
    fn test_descriptor_lists_version() {
        let pc = render_descriptor("1.21.0");
        assert!(pc.contains("Version: 1.21.0\n"));
        assert!(pc.contains("wayland_scanner=${bindir}/wayland-scanner\n"));
        assert!(pc.starts_with("prefix=/usr\n"));
    }

    #[test]
    fn test_present_descriptor_is_kept() {
        let fake = FakeRunner::new();
        let layout = HostLayout::system();
        assert!(!ensure_descriptor(&fake, &layout).unwrap());
        assert!(fake.runs().is_empty());
    }

    #[test]
    fn test_missing_descriptor_is_written() {
        let fake = FakeRunner::new();
        fake.respond("pkg-config --exists", CommandOutput::failure(1));
        fake.respond(
            "wayland-scanner --version",
            CommandOutput {
                stdout: String::new(),
                stderr: "wayland-scanner 1.20.0\n".to_string(),
                status: Some(0),
            },
        );
        let layout = HostLayout::with_root("/tmp/host");

        assert!(ensure_descriptor(&fake, &layout).unwrap());
        let runs = fake.runs_of("install");
        assert_eq!(runs.len(), 1);
        assert!(runs[0].privileged);
        assert_eq!(
            runs[0].args.last().map(String::as_str),
            Some("/tmp/host/usr/local/share/pkgconfig/wayland-scanner.pc")
        );
        assert!(runs[0].stdin.as_deref().unwrap().contains("Version: 1.20.0"));
    }
}
