use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const UBUNTU_SOURCES: &str =
    "deb http://archive.ubuntu.com/ubuntu/ noble main restricted universe\n";
pub const DEBIAN_OS_RELEASE: &str = "PRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"\nID=debian\nVERSION_CODENAME=bookworm\n";

/// A fake host filesystem plus a private home directory.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        fs::create_dir_all(temp_dir.path().join("root/etc/apt/sources.list.d"))?;
        fs::create_dir_all(temp_dir.path().join("home"))?;
        Ok(Self { temp_dir })
    }

    pub fn ubuntu() -> Result<Self> {
        let env = Self::new()?;
        env.write_host_file("etc/apt/sources.list", UBUNTU_SOURCES)?;
        Ok(env)
    }

    pub fn debian() -> Result<Self> {
        let env = Self::new()?;
        env.write_host_file("etc/os-release", DEBIAN_OS_RELEASE)?;
        Ok(env)
    }

    /// Host root passed with `--root`.
    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join("root")
    }

    pub fn home(&self) -> PathBuf {
        self.temp_dir.path().join("home")
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_host_file(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Write a config file and return its path.
    pub fn write_config(&self, content: &str) -> Result<PathBuf> {
        let path = self.path().join("config.toml");
        fs::write(&path, content)?;
        Ok(path)
    }
}
