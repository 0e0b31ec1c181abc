mod build;
mod common;
mod completions;
mod package;
mod provision;
mod repos;
mod setup;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::build::{SourceBuilder, Tool};
use crate::common::config::Config;
use crate::common::distro::Variant;
use crate::common::paths::HostLayout;
use crate::common::runner::{CommandRunner, DryRunRunner, SystemRunner};
use crate::completions::CompletionCommands;
use crate::package::Category;
use crate::provision::{HostContext, Provisioner};
use crate::ui::prelude::*;

/// Provision a Hyprland desktop on Debian and Ubuntu hosts
#[derive(Parser, Debug)]
#[command(name = "deskstrap", author, version, about, long_about = None)]
struct Cli {
    /// Show every command before it runs
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Print what would change without changing anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Config file (defaults to ~/.config/deskstrap/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Read host state from this directory instead of /
    #[arg(long, global = true, value_name = "PATH", hide = true)]
    root: Option<PathBuf>,

    /// Answer yes to package manager prompts
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full provisioning sequence (default)
    Run,
    /// Print the detected distribution variant
    Detect,
    /// Show the package sets for this host and what is installed
    Packages {
        /// Only show one category (general, gui_apps, cli_tools, distro_specific, desktop)
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },
    /// Build and install one tool from source
    Build {
        #[arg(value_enum)]
        tool: Tool,
    },
    /// Shell completion scripts
    Completions {
        #[command(subcommand)]
        command: CompletionCommands,
    },
}

fn parse_category(value: &str) -> Result<Category, String> {
    Category::from_id(value).ok_or_else(|| {
        let valid: Vec<&str> = Category::ALL.iter().map(|c| c.id()).collect();
        format!("unknown category `{}` (expected one of: {})", value, valid.join(", "))
    })
}

pub fn cli_command() -> clap::Command {
    Cli::command()
}

fn main() {
    let cli = Cli::parse();

    let color = !cli.no_color
        && std::env::var_os("NO_COLOR").is_none()
        && std::io::stdout().is_terminal();
    if !color {
        colored::control::set_override(false);
    }
    ui::init(cli.output, color);
    ui::set_debug_mode(cli.debug);

    match dispatch(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            emit(
                Level::Error,
                "deskstrap.error",
                &format!("Error: {:#}", e),
                None,
            );
            std::process::exit(1);
        }
    }
}

/// Run the selected command and return the process exit code.
fn dispatch(cli: Cli) -> Result<i32> {
    let layout = cli
        .root
        .clone()
        .map(HostLayout::with_root)
        .unwrap_or_default();

    let system = SystemRunner::new();
    let runner: Box<dyn CommandRunner> = if cli.dry_run {
        Box::new(DryRunRunner::new(system))
    } else {
        Box::new(system)
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Detect => {
            let variant = Variant::detect(&layout);
            emit(
                Level::Info,
                "distro.detected",
                variant.name(),
                Some(serde_json::json!({
                    "variant": variant.id(),
                    "needs_extra_repositories": variant.needs_extra_repositories(),
                })),
            );
            Ok(0)
        }
        Commands::Packages { category } => {
            let config = Config::load(cli.config.as_deref())?;
            let ctx = HostContext::detect(layout, &config, cli.yes)?;
            provision::list_packages(runner.as_ref(), &ctx, &config, category);
            Ok(0)
        }
        Commands::Build { tool } => {
            let config = Config::load(cli.config.as_deref())?;
            let ctx = HostContext::detect(layout, &config, cli.yes)?;
            let outcome = SourceBuilder::new(
                runner.as_ref(),
                &ctx.layout,
                ctx.jobs,
                &ctx.install_prefix,
            )
            .assume_yes(ctx.assume_yes)
            .build(tool.target())?;
            Ok(outcome.exit_code())
        }
        Commands::Completions { command } => {
            match command {
                CompletionCommands::Generate { shell } => {
                    print!("{}", completions::generate(shell)?);
                }
                CompletionCommands::Install {
                    shell,
                    output,
                    force,
                } => {
                    let path = completions::install(shell, output, force)?;
                    emit(
                        Level::Success,
                        "completions.installed",
                        &completions::installed_message(shell, &path),
                        Some(serde_json::json!({ "path": path.display().to_string() })),
                    );
                }
            }
            Ok(0)
        }
        Commands::Run => {
            let config = Config::load(cli.config.as_deref())?;
            let ctx = HostContext::detect(layout, &config, cli.yes)?;
            Provisioner::new(runner.as_ref(), &config, &ctx).run()?;
            Ok(0)
        }
    }
}
