use crate::common::runner::{CommandRunner, CommandSpec};

/// `dpkg-query` status of a fully installed package.
pub const INSTALLED_STATUS: &str = "install ok installed";

/// Answers "is this package installed?" against the package database.
///
/// Every call asks dpkg again; nothing is cached.
#[derive(Clone, Copy)]
pub struct PackageQuery<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> PackageQuery<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub fn status_command(package: &str) -> CommandSpec {
        CommandSpec::new("dpkg-query").args(["-W", "-f=${Status}", package])
    }

    /// Unknown packages, query errors and half-configured states all count
    /// as not installed.
    pub fn is_installed(&self, package: &str) -> bool {
        match self.runner.read(&Self::status_command(package)) {
            Ok(output) => output.succeeded() && output.stdout.trim() == INSTALLED_STATUS,
            Err(_) => false,
        }
    }
}
