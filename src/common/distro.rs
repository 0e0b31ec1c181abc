use std::fs;

use super::paths::HostLayout;

/// Packaging flavor of the Debian family that deskstrap is running on.
///
/// Detected once per run; every component that needs variant-specific
/// package names or repositories receives it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Ubuntu and derivatives. Needs the extra PPA and signed repository.
    Ubuntu,
    /// Debian proper. Ships everything natively.
    Debian,
    /// Anything else apt-based. Extra sources are left to the operator.
    Generic,
}

/// Substring of an apt source entry that identifies the Ubuntu archive.
const UBUNTU_SOURCE_MARKER: &str = "ubuntu.com";

/// os-release `ID` that identifies Debian.
const DEBIAN_OS_ID: &str = "debian";

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Ubuntu, Variant::Debian, Variant::Generic];

    /// Detect the variant from host state under `layout`.
    ///
    /// Priority is fixed: Ubuntu sources win over a Debian os-release, and
    /// missing or unreadable files count as no evidence.
    pub fn detect(layout: &HostLayout) -> Self {
        let ubuntu_sources = layout
            .source_files()
            .iter()
            .filter_map(|path| fs::read_to_string(path).ok())
            .any(|content| sources_mention_ubuntu(&content));
        if ubuntu_sources {
            return Self::Ubuntu;
        }

        let os_id = fs::read_to_string(layout.os_release())
            .ok()
            .and_then(|content| parse_os_release_id(&content));
        match os_id.as_deref() {
            Some(DEBIAN_OS_ID) => Self::Debian,
            _ => Self::Generic,
        }
    }

    /// Whether extra package sources must be registered before installing.
    pub fn needs_extra_repositories(&self) -> bool {
        matches!(self, Self::Ubuntu)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ubuntu => "Ubuntu",
            Self::Debian => "Debian",
            Self::Generic => "Generic",
        }
    }

    /// Stable lowercase identifier used in JSON output.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Ubuntu => "ubuntu",
            Self::Debian => "debian",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Check apt source content (one-line `.list` or deb822 `.sources`) for an
/// active entry pointing at the Ubuntu archive.
pub fn sources_mention_ubuntu(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .any(|line| line.contains(UBUNTU_SOURCE_MARKER))
}

/// Extract the `ID=` value from os-release content.
pub fn parse_os_release_id(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("ID="))
        .map(|val| val.trim_matches('"').trim_matches('\'').to_string())
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DEBIAN_OS_RELEASE: &str = r#"PRETTY_NAME="Debian GNU/Linux 12 (bookworm)"
NAME="Debian GNU/Linux"
VERSION_ID="12"
VERSION="12 (bookworm)"
VERSION_CODENAME=bookworm
ID=debian
HOME_URL="https://www.debian.org/"
SUPPORT_URL="https://www.debian.org/support"
BUG_REPORT_URL="https://bugs.debian.org/""#;

    const UBUNTU_SOURCES: &str = r#"# See http://help.ubuntu.com/community/UpgradeNotes
deb http://archive.ubuntu.com/ubuntu/ noble main restricted
deb http://security.ubuntu.com/ubuntu/ noble-security main restricted
"#;

    const UBUNTU_DEB822: &str = r#"Types: deb
URIs: http://archive.ubuntu.com/ubuntu/
Suites: noble noble-updates noble-backports
Components: main restricted universe multiverse
Signed-By: /usr/share/keyrings/ubuntu-archive-keyring.gpg
"#;

    fn host() -> (TempDir, HostLayout) {
        let root = TempDir::new().unwrap();
        let layout = HostLayout::with_root(root.path());
        fs::create_dir_all(layout.sources_dir()).unwrap();
        (root, layout)
    }

    #[test]
    fn test_detect_ubuntu_from_sources_list() {
        let (_root, layout) = host();
        fs::write(layout.sources_list(), UBUNTU_SOURCES).unwrap();
        assert_eq!(Variant::detect(&layout), Variant::Ubuntu);
    }

    #[test]
    fn test_detect_ubuntu_from_deb822_dropin() {
        let (_root, layout) = host();
        fs::write(layout.sources_dir().join("ubuntu.sources"), UBUNTU_DEB822).unwrap();
        assert_eq!(Variant::detect(&layout), Variant::Ubuntu);
    }

    #[test]
    fn test_detect_debian_from_os_release() {
        let (_root, layout) = host();
        fs::write(
            layout.sources_list(),
            "deb http://deb.debian.org/debian bookworm main\n",
        )
        .unwrap();
        fs::write(layout.os_release(), DEBIAN_OS_RELEASE).unwrap();
        assert_eq!(Variant::detect(&layout), Variant::Debian);
    }

    #[test]
    fn test_detect_generic_without_evidence() {
        let (_root, layout) = host();
        assert_eq!(Variant::detect(&layout), Variant::Generic);

        fs::write(layout.os_release(), "ID=linuxmint\nID_LIKE=\"ubuntu debian\"\n").unwrap();
        assert_eq!(Variant::detect(&layout), Variant::Generic);
    }

    #[test]
    fn test_ubuntu_marker_takes_priority_over_debian_id() {
        let (_root, layout) = host();
        fs::write(layout.sources_list(), UBUNTU_SOURCES).unwrap();
        fs::write(layout.os_release(), DEBIAN_OS_RELEASE).unwrap();
        assert_eq!(Variant::detect(&layout), Variant::Ubuntu);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let (_root, layout) = host();
        fs::write(layout.os_release(), DEBIAN_OS_RELEASE).unwrap();
        let first = Variant::detect(&layout);
        assert!((0..5).all(|_| Variant::detect(&layout) == first));
    }

    #[test]
    fn test_commented_entries_are_ignored() {
        assert!(!sources_mention_ubuntu(
            "# deb http://archive.ubuntu.com/ubuntu noble main\n"
        ));
        assert!(sources_mention_ubuntu(UBUNTU_SOURCES));
        assert!(sources_mention_ubuntu(UBUNTU_DEB822));
    }

    #[test]
    fn test_parse_os_release_id() {
        assert_eq!(parse_os_release_id(DEBIAN_OS_RELEASE).as_deref(), Some("debian"));
        assert_eq!(parse_os_release_id("ID=\"pop\"").as_deref(), Some("pop"));
        assert_eq!(parse_os_release_id("ID_LIKE=debian"), None);
        assert_eq!(parse_os_release_id("ID="), None);
    }

    #[test]
    fn test_only_ubuntu_needs_extra_repositories() {
        assert!(Variant::Ubuntu.needs_extra_repositories());
        assert!(!Variant::Debian.needs_extra_repositories());
        assert!(!Variant::Generic.needs_extra_repositories());
    }
}
