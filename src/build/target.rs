use std::path::Path;

use crate::common::runner::CommandSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildSystem {
    CMake,
    Go,
}

impl BuildSystem {
    pub fn configure_command(&self, src: &Path) -> CommandSpec {
        match self {
            Self::CMake => CommandSpec::new("cmake")
                .args(["-S", ".", "-B", "build", "-DCMAKE_BUILD_TYPE=Release"])
                .dir(src),
            Self::Go => CommandSpec::new("go").args(["mod", "download"]).dir(src),
        }
    }

    pub fn build_command(&self, src: &Path, name: &str, jobs: usize) -> CommandSpec {
        let jobs = jobs.max(1).to_string();
        match self {
            Self::CMake => CommandSpec::new("cmake")
                .args(["--build", "build", "--parallel"])
                .arg(jobs)
                .dir(src),
            Self::Go => CommandSpec::new("go")
                .args(["build", "-p"])
                .arg(jobs)
                .args(["-o", name, "."])
                .dir(src),
        }
    }
}

/// A tool that is built from source when no binary package provides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTarget {
    /// Command name; also the installed file name.
    pub name: &'static str,
    pub repo_url: &'static str,
    pub system: BuildSystem,
    /// Built binary, relative to the checkout.
    pub artifact: &'static str,
    /// Packages needed to build.
    pub dependencies: &'static [&'static str],
    /// Needs a `wayland-scanner.pc` visible to pkg-config.
    pub needs_scanner_descriptor: bool,
}

pub const HYPRPICKER: BuildTarget = BuildTarget {
    name: "hyprpicker",
    repo_url: "https://github.com/hyprwm/hyprpicker.git",
    system: BuildSystem::CMake,
    artifact: "build/hyprpicker",
    dependencies: &[
        "build-essential",
        "cmake",
        "pkg-config",
        "libwayland-dev",
        "wayland-protocols",
        "libcairo2-dev",
        "libpango1.0-dev",
        "libxkbcommon-dev",
        "libjpeg-dev",
        "libhyprutils-dev",
    ],
    needs_scanner_descriptor: true,
};

pub const CLIPHIST: BuildTarget = BuildTarget {
    name: "cliphist",
    repo_url: "https://github.com/sentriz/cliphist.git",
    system: BuildSystem::Go,
    artifact: "cliphist",
    dependencies: &["golang-go", "git"],
    needs_scanner_descriptor: false,
};

/// Tools with a source-build fallback, in build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Tool {
    Hyprpicker,
    Cliphist,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::Hyprpicker, Tool::Cliphist];

    pub fn target(&self) -> &'static BuildTarget {
        match self {
            Self::Hyprpicker => &HYPRPICKER,
            Self::Cliphist => &CLIPHIST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cmake_commands() {
        let src = PathBuf::from("/tmp/ws/src");
        let configure = BuildSystem::CMake.configure_command(&src);
        assert_eq!(
            configure.display(),
            "cmake -S . -B build -DCMAKE_BUILD_TYPE=Release"
        );
        assert_eq!(configure.dir.as_deref(), Some(src.as_path()));

        let build = BuildSystem::CMake.build_command(&src, "hyprpicker", 8);
        assert_eq!(build.display(), "cmake --build build --parallel 8");
    }

    #[test]
    fn test_go_commands() {
        let src = PathBuf::from("/tmp/ws/src");
        assert_eq!(
            BuildSystem::Go.configure_command(&src).display(),
            "go mod download"
        );
        assert_eq!(
            BuildSystem::Go.build_command(&src, "cliphist", 0).display(),
            "go build -p 1 -o cliphist ."
        );
    }

    #[test]
    fn test_tool_targets() {
        assert_eq!(Tool::Hyprpicker.target().name, "hyprpicker");
        assert!(Tool::Hyprpicker.target().needs_scanner_descriptor);
        assert_eq!(Tool::Cliphist.target().system, BuildSystem::Go);
        assert!(!Tool::Cliphist.target().needs_scanner_descriptor);
    }
}
