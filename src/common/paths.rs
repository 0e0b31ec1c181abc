use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Where host state lives.
///
/// Every read of system files (apt sources, os-release, keyrings) and every
/// system path deskstrap writes to is resolved through this layout, so a
/// whole host can be faked with a directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLayout {
    root: PathBuf,
}

impl HostLayout {
    /// The running system, rooted at `/`.
    pub fn system() -> Self {
        Self {
            root: PathBuf::from("/"),
        }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an absolute system path into this layout.
    pub fn path(&self, absolute: impl AsRef<Path>) -> PathBuf {
        let absolute = absolute.as_ref();
        let relative = absolute.strip_prefix("/").unwrap_or(absolute);
        self.root.join(relative)
    }

    pub fn sources_list(&self) -> PathBuf {
        self.path("/etc/apt/sources.list")
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.path("/etc/apt/sources.list.d")
    }

    pub fn os_release(&self) -> PathBuf {
        self.path("/etc/os-release")
    }

    /// All apt source files: the main list plus `*.list` and `*.sources`
    /// drop-ins, sorted for deterministic reads.
    pub fn source_files(&self) -> Vec<PathBuf> {
        let mut files = vec![self.sources_list()];
        if let Ok(entries) = std::fs::read_dir(self.sources_dir()) {
            let mut dropins: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("list") | Some("sources")
                    )
                })
                .collect();
            dropins.sort();
            files.extend(dropins);
        }
        files
    }
}

impl Default for HostLayout {
    fn default() -> Self {
        Self::system()
    }
}

/// Get the deskstrap config directory
pub fn deskstrap_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("deskstrap");
    Ok(config_dir)
}

/// Default location of the config file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(deskstrap_config_dir()?.join("config.toml"))
}

/// User-local binary directory (`~/.local/bin`)
pub fn user_bin_dir() -> Result<PathBuf> {
    let bin_dir = dirs::executable_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/bin")))
        .context("Unable to determine user binary directory")?;
    Ok(bin_dir)
}
