//! Command tree for minikube.
//!
//! Subcommands are declared with clap's derive macros. Global flags, both the
//! root command's own and those imported from the logging layer, are attached
//! as [`FlagDef`]s so they are parsed into one [`FlagSet`]. The bootstrap
//! sequence runs once, after parsing and before the chosen subcommand.

pub mod config;

use crate::bootstrap::{Bootstrap, RuntimeConfig};
use crate::error::BootstrapError;
use crate::flags::{FlagDef, FlagSet};
use crate::logging;
use crate::machine::USE_VENDORED_DRIVER_FLAG;
use crate::paths::MiniPaths;
use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use self::config::ConfigCommand;
use std::ffi::OsString;
use std::io::Write;

pub const SHOW_LIBMACHINE_LOGS_FLAG: &str = "show-libmachine-logs";

/// Root flags mirrored into the config store.
pub const ROOT_FLAG_NAMES: &[&str] = &[SHOW_LIBMACHINE_LOGS_FLAG, USE_VENDORED_DRIVER_FLAG];

/// The root command's persistent flags.
pub fn root_flag_definitions() -> Vec<FlagDef> {
    vec![
        FlagDef::new(
            SHOW_LIBMACHINE_LOGS_FLAG,
            false,
            "Deprecated: To enable libmachine logs, set --v=3 or higher",
        ),
        FlagDef::new(
            USE_VENDORED_DRIVER_FLAG,
            false,
            "Use the vendored in drivers instead of RPC",
        ),
    ]
}

/// Minikube is a tool for managing local Kubernetes clusters.
#[derive(Parser, Debug)]
#[command(name = "minikube", version)]
#[command(
    long_about = "Minikube is a CLI tool that provisions and manages single-node Kubernetes clusters optimized for development workflows."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Modify minikube config
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print the version of minikube
    Version,
}

impl Command {
    /// Whether startup notices may be printed for this command.
    pub fn shows_notices(&self) -> bool {
        match self {
            Command::Config(cmd) => cmd.shows_notices(),
            Command::Version => true,
        }
    }
}

/// A parsed command line.
#[derive(Debug)]
pub struct Invocation {
    pub cli: Cli,
    pub flags: FlagSet,
}

/// Parse `args`, registering the root flags plus `external` flags as globals.
pub fn parse_from<I, T>(args: I, external: Vec<FlagDef>) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let defs: Vec<FlagDef> = root_flag_definitions().into_iter().chain(external).collect();
    let matches = Cli::command()
        .args(defs.iter().map(FlagDef::to_arg))
        .try_get_matches_from(args)?;
    let cli = Cli::from_arg_matches(&matches)?;
    let flags = FlagSet::from_matches(defs, &matches)
        .map_err(|e: BootstrapError| clap::Error::raw(ErrorKind::ValueValidation, e.to_string()))?;
    Ok(Invocation { cli, flags })
}

/// Run the selected subcommand against the resolved configuration.
pub fn dispatch(command: &Command, runtime: &RuntimeConfig, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Config(cmd) => config::run(cmd, runtime, out)?,
        Command::Version => writeln!(out, "minikube version: v{}", env!("CARGO_PKG_VERSION"))?,
    }
    Ok(())
}

/// Entry point for the binary.
pub async fn run() -> Result<()> {
    let paths = MiniPaths::discover()?;
    let invocation = match parse_from(std::env::args_os(), logging::flag_definitions(&paths.logs_dir())) {
        Ok(invocation) => invocation,
        Err(e) => e.exit(),
    };
    let Invocation { cli, flags } = invocation;

    let mut bootstrap = Bootstrap::new(paths);
    let runtime = bootstrap.run(flags, cli.command.shows_notices())?;
    let result = dispatch(&cli.command, runtime, &mut std::io::stdout().lock());

    if let Some(notices) = bootstrap.take_notices() {
        notices.finish().await;
    }
    result
}
