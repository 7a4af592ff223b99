mod cargo;
mod commands;
mod core;
mod graph;
mod registry;
mod release;
mod ui;

use clap::{Parser, Subcommand};
use core::context::ReleaseContext;
use core::error::{ReleaseError, print_error};
use release::workflow::ALL_PACKAGES;

/// Publish Cargo workspace packages exactly once, in dependency order
#[derive(Parser)]
#[command(name = "cargo")]
#[command(bin_name = "cargo")]
#[command(styles = get_styles())]
enum CargoCli {
  PublishGate(GateCli),
}

#[derive(Parser)]
#[command(name = "publish-gate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct GateCli {
  /// Enable debug logging (RUST_LOG overrides)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Publish packages that are not yet on the registry
  Publish {
    /// Package to publish, or "all" for every package in publish order
    #[arg(short, long, default_value = ALL_PACKAGES)]
    package: String,
    /// Target registry (default: [publish] default_registry, usually crates-io)
    #[arg(short, long)]
    registry: Option<String>,
    /// Package and verify without uploading
    #[arg(long)]
    dry_run: bool,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Show package versions, or set the workspace version
  #[command(args_conflicts_with_subcommands = true)]
  Version {
    #[command(subcommand)]
    action: Option<VersionAction>,
    /// Package to show (default: all packages)
    package: Option<String>,
    /// Show the version derived from git tags instead
    #[arg(long)]
    derived: bool,
  },

  /// Show the order packages are published in
  Order {
    /// Output the order as a JSON array
    #[arg(long)]
    json: bool,
  },

  /// Build release-ready WebAssembly provider artifacts
  Build {
    /// Provider to build, or "all" for [build] providers
    #[arg(default_value = ALL_PACKAGES)]
    provider: String,
    /// Keep debug information (skips wasm-opt)
    #[arg(short, long)]
    debug: bool,
  },

  /// Check tools, workspace, config and registries
  Doctor {
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },
}

#[derive(Subcommand)]
enum VersionAction {
  /// Set workspace.package.version (or one package's version)
  Set {
    /// New version (semver)
    #[arg(id = "new_version", value_name = "VERSION")]
    version: String,
    /// Only change this package
    #[arg(short, long)]
    package: Option<String>,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let CargoCli::PublishGate(cli) = CargoCli::parse();

  let default_filter = if cli.verbose { "debug" } else { "warn" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
    .format_timestamp(None)
    .init();

  let current_dir = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  // Doctor diagnoses broken workspaces, so it cannot depend on the context
  if let Commands::Doctor { json } = cli.command {
    if let Err(err) = commands::run_doctor(&current_dir, json) {
      handle_error(err);
    }
    return;
  }

  // Build workspace context once (metadata + config)
  let mut ctx = match ReleaseContext::build(&current_dir) {
    Ok(ctx) => ctx,
    Err(err) => handle_error(err),
  };

  let result = match cli.command {
    Commands::Publish {
      package,
      registry,
      dry_run,
      json,
    } => commands::run_publish(&mut ctx, package, registry, dry_run, json),
    Commands::Version {
      action: Some(VersionAction::Set { version, package }),
      ..
    } => commands::run_version_set(&ctx, version, package),
    Commands::Version {
      action: None,
      package,
      derived,
    } => commands::run_version(&ctx, package, derived),
    Commands::Order { json } => commands::run_order(&ctx, json),
    Commands::Build { provider, debug } => commands::run_build(&ctx, provider, debug),
    Commands::Doctor { .. } => Ok(()),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
