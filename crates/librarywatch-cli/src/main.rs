use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::serve::ServeOptions;
use library_sync_config::{Config, PathManager};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;
mod server;

#[derive(Parser)]
#[command(name = "librarywatch")]
#[command(about = "LibraryWatch - Track what comes and goes in your Emby library")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also write logs to this file, rotated daily
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve webhooks and reconcile the library on an interval
    #[command(long_about = "Start the HTTP webhook receiver (/ping, /hook) and reconcile the Emby library against the local store on the configured interval. Runs until interrupted.")]
    Serve {
        /// Run a reconciliation pass right after startup
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "no_startup_sync")]
        startup_sync: bool,

        /// Skip the startup pass even if the config enables it
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,

        /// Time between passes, e.g. '30m' or '6h'
        #[arg(long, value_name = "DURATION")]
        interval: Option<String>,
    },
    /// Run a single reconciliation pass and print the result
    Sync,
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration (masks the API key)
    Show {
        /// Show the API key unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let paths = PathManager::default();
    let config_file = cli.config.clone().unwrap_or_else(|| paths.config_file());
    let loaded = Config::load(&config_file);

    // `debug = true` (or DEBUG=true) acts as a single -v
    let debug = loaded.as_ref().map(|c| c.debug).unwrap_or(false);
    let verbose = if debug { cli.verbose.max(1) } else { cli.verbose };

    logging::init_logging(logging::LogOptions {
        verbose,
        quiet: cli.quiet,
        log_file: cli.log_file.as_deref(),
    })
    .map_err(|e| eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Serve {
            startup_sync,
            no_startup_sync,
            interval,
        } => {
            let config = loaded.map_err(|e| eyre!("{}", e))?;
            let startup_sync = match (startup_sync, no_startup_sync) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let options = ServeOptions {
                startup_sync,
                interval,
            };
            commands::serve::run_serve(config, &paths, options, &output).await
        }
        Commands::Sync => {
            let config = loaded.map_err(|e| eyre!("{}", e))?;
            commands::sync::run_sync(config, &paths, &output).await
        }
        Commands::Config { cmd } => commands::config::run_config(cmd, loaded, &config_file, &output),
    }
}
