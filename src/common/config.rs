//! User configuration for deskstrap.
//!
//! Lives at `~/.config/deskstrap/config.toml`. Every field has a default, so
//! a missing file simply means "defaults". The file is never created by
//! deskstrap itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::common::paths;
use crate::package::catalog::Category;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0} does not exist")]
    NotFound(PathBuf),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unknown package category `{0}` in extra_packages")]
    UnknownCategory(String),

    #[error("{0}")]
    Location(String),
}

fn default_install_prefix() -> PathBuf {
    PathBuf::from("/usr/local/bin")
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("scripts")
}

fn default_pipx_tools() -> Vec<String> {
    vec!["pywalfox".to_string(), "hyprshade".to_string()]
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Pass `-y` to apt so the transaction does not prompt.
    pub assume_yes: bool,
    /// Build parallelism; detected logical cores when unset.
    pub jobs: Option<usize>,
    /// Where source-built tools are installed.
    #[serde(default = "default_install_prefix")]
    pub install_prefix: PathBuf,
    /// Directory holding the collaborator setup scripts.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,
    /// Collaborator scripts to leave out, by file name.
    pub skip_scripts: Vec<String>,
    /// Python tools installed into isolated pipx environments.
    #[serde(default = "default_pipx_tools")]
    pub pipx_tools: Vec<String>,
    /// Extra package names appended to a request category.
    pub extra_packages: BTreeMap<String, Vec<String>>,
    /// Source-built tools to leave out, by name.
    pub skip_source_builds: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            assume_yes: false,
            jobs: None,
            install_prefix: default_install_prefix(),
            scripts_dir: default_scripts_dir(),
            skip_scripts: Vec::new(),
            pipx_tools: default_pipx_tools(),
            extra_packages: BTreeMap::new(),
            skip_source_builds: Vec::new(),
        }
    }
}

impl Config {
    /// Load the config.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used and a missing file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::load_from_path(path)
            }
            None => {
                let path = paths::default_config_path()
                    .map_err(|e| ConfigError::Location(e.to_string()))?;
                if path.exists() {
                    Self::load_from_path(&path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self
            .extra_packages
            .keys()
            .find(|key| Category::from_id(key).is_none())
        {
            Some(key) => Err(ConfigError::UnknownCategory(key.clone())),
            None => Ok(()),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Extra packages configured for `category`.
    pub fn extras_for(&self, category: Category) -> &[String] {
        self.extra_packages
            .get(category.id())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn skips_script(&self, name: &str) -> bool {
        self.skip_scripts.iter().any(|s| s == name)
    }

    pub fn skips_source_build(&self, name: &str) -> bool {
        self.skip_source_builds.iter().any(|s| s == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.install_prefix, PathBuf::from("/usr/local/bin"));
        assert_eq!(config.pipx_tools, vec!["pywalfox", "hyprshade"]);
        assert!(!config.assume_yes);
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
assume_yes = true
jobs = 4
install_prefix = "/opt/bin"
scripts_dir = "/srv/dotfiles/setup"
skip_scripts = ["icons.sh"]
pipx_tools = ["pywalfox"]
skip_source_builds = ["cliphist"]

[extra_packages]
cli_tools = ["htop", "tldr"]
gui_apps = ["gimp"]
"#,
        )
        .unwrap();

        assert!(config.assume_yes);
        assert_eq!(config.jobs, Some(4));
        assert_eq!(config.install_prefix, PathBuf::from("/opt/bin"));
        assert!(config.skips_script("icons.sh"));
        assert!(!config.skips_script("fonts.sh"));
        assert!(config.skips_source_build("cliphist"));
        assert_eq!(config.extras_for(Category::CliTools), ["htop", "tldr"]);
        assert_eq!(config.extras_for(Category::GuiApps), ["gimp"]);
        assert!(config.extras_for(Category::Desktop).is_empty());
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[extra_packages]\nmystery = [\"x\"]\n").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCategory(ref c) if c == "mystery"));
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_reports_parse_errors_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "jobs = \"many\"").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
