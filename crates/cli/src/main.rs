//! depot CLI - refresh and inspect the artifact metadata depot

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod commands;
mod logging;

use commands::{RefreshTarget, Settings, cmd_evict, cmd_exclude, cmd_refresh, cmd_serve, cmd_show};
use logging::{init_cli_logging, init_serve_logging};

#[derive(Parser)]
#[command(name = "depot")]
#[command(about = "Artifact metadata depot: refresh versions and resolve their dependency graphs")]
#[command(after_help = "\
QUICK START:
  depot --repository ./repo refresh project org.example core --transitive
  depot show org.example core latest

COMMON WORKFLOWS:
  depot refresh all               # Queue new releases of every known project
  depot refresh snapshots         # Re-resolve default branch snapshots
  depot serve                     # Run workers and lease sweeper until ctrl-c")]
struct Cli {
  /// Config file (default: user config dir)
  #[arg(long, global = true, value_name = "FILE")]
  config: Option<PathBuf>,
  /// Repository root, overrides [repository].path
  #[arg(long, global = true, value_name = "DIR")]
  repository: Option<PathBuf>,
  /// Data directory, overrides [daemon].data_dir
  #[arg(long, global = true, value_name = "DIR")]
  data_dir: Option<PathBuf>,
  #[command(subcommand)]
  command: Commands,
}

/// Flags shared by the refresh subcommands
#[derive(Args, Clone, Copy)]
pub struct RefreshFlags {
  /// Reprocess every artifact file of snapshot versions
  #[arg(long)]
  full_update: bool,
  /// Queue releases that are already stored
  #[arg(long)]
  all_versions: bool,
  /// Also refresh missing and stale snapshot dependencies
  #[arg(long)]
  transitive: bool,
  /// Output as JSON
  #[arg(long)]
  json: bool,
}

/// Subcommands for `depot refresh`
#[derive(Subcommand)]
pub enum RefreshCommand {
  /// Every known project
  All {
    #[command(flatten)]
    flags: RefreshFlags,
  },
  /// The default branch snapshot of every known project
  Snapshots {
    #[command(flatten)]
    flags: RefreshFlags,
  },
  /// One project: its default snapshot and new releases
  Project {
    group: String,
    artifact: String,
    #[command(flatten)]
    flags: RefreshFlags,
  },
  /// One version (accepts `latest` and `head`)
  Version {
    group: String,
    artifact: String,
    version: String,
    #[command(flatten)]
    flags: RefreshFlags,
  },
}

#[derive(Subcommand)]
enum Commands {
  /// Refresh versions from the repository and wait for completion
  Refresh {
    #[command(subcommand)]
    command: RefreshCommand,
  },
  /// Run the worker pool and scheduler until ctrl-c
  Serve {
    /// Log to a rolling file in the data directory instead of the console
    #[arg(long)]
    log_to_file: bool,
  },
  /// Show a stored version (accepts `latest` and `head`)
  Show {
    group: String,
    artifact: String,
    version: String,
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
  /// Mark a stored version as unresolvable
  Exclude {
    group: String,
    artifact: String,
    version: String,
    /// Why the version is excluded
    #[arg(long)]
    reason: String,
  },
  /// Retire a stored version from bulk refreshes
  Evict {
    group: String,
    artifact: String,
    version: String,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let settings = Settings::load(cli.config.as_deref(), cli.repository, cli.data_dir)?;

  // File logging only for serve, console for everything else
  let _guard = match &cli.command {
    Commands::Serve { log_to_file: true } => init_serve_logging(&settings.config.daemon, &settings.data_dir()),
    _ => {
      init_cli_logging(&settings.config.daemon.log_level);
      None
    }
  };

  match cli.command {
    Commands::Refresh { command } => {
      let (target, flags) = match command {
        RefreshCommand::All { flags } => (RefreshTarget::All, flags),
        RefreshCommand::Snapshots { flags } => (RefreshTarget::Snapshots, flags),
        RefreshCommand::Project { group, artifact, flags } => (RefreshTarget::Project { group, artifact }, flags),
        RefreshCommand::Version {
          group,
          artifact,
          version,
          flags,
        } => (
          RefreshTarget::Version {
            group,
            artifact,
            version,
          },
          flags,
        ),
      };
      cmd_refresh(settings, target, flags.into(), flags.json).await
    }
    Commands::Serve { .. } => cmd_serve(settings).await,
    Commands::Show {
      group,
      artifact,
      version,
      json,
    } => cmd_show(&settings, &group, &artifact, &version, json).await,
    Commands::Exclude {
      group,
      artifact,
      version,
      reason,
    } => cmd_exclude(&settings, &group, &artifact, &version, &reason).await,
    Commands::Evict {
      group,
      artifact,
      version,
    } => cmd_evict(&settings, &group, &artifact, &version).await,
  }
}

impl From<RefreshFlags> for depot::service::bulk::RefreshOptions {
  fn from(flags: RefreshFlags) -> Self {
    Self {
      full_update: flags.full_update,
      all_versions: flags.all_versions,
      transitive: flags.transitive,
    }
  }
}
