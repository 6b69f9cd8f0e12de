use clap::{Parser, Subcommand};
use nexus_cli::config::{ENV_PASS, ENV_URL, ENV_USER};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::download::DownloadFlags;
use cli::{GlobalArgs, TransferArgs};

#[derive(Parser)]
#[command(name = "nexuscli")]
#[command(about = "Sync files between local directories and Nexus raw repositories")]
#[command(version)]
struct Cli {
    /// Nexus server URL
    #[arg(long, global = true, env = ENV_URL)]
    url: Option<String>,

    /// Nexus username
    #[arg(long, global = true, env = ENV_USER)]
    username: Option<String>,

    /// Nexus password
    #[arg(long, global = true, env = ENV_PASS, hide_env_values = true)]
    password: Option<String>,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a local directory to a repository folder
    Upload {
        /// Local directory to upload
        src: PathBuf,
        /// Target as repository[/folder[/archive]]
        dest: String,
        #[command(flatten)]
        transfer: TransferArgs,
    },
    /// Download a repository folder to a local directory
    Download {
        /// Source as repository/folder[/archive]
        src: String,
        /// Local destination directory
        dest: PathBuf,
        #[command(flatten)]
        transfer: TransferArgs,
        /// Place files relative to the source folder instead of the repository root
        #[arg(short, long)]
        flatten: bool,
        /// Delete local files that do not exist in the repository
        #[arg(long = "delete")]
        delete_extra: bool,
        /// Accepted for compatibility; folders are always listed recursively
        #[arg(short, long)]
        recursive: bool,
    },
    /// Manage pinned dependencies declared in deps.ini
    Deps {
        #[command(subcommand)]
        command: DepsCommands,
    },
}

#[derive(Subcommand)]
enum DepsCommands {
    /// Create a template deps.ini
    Init,
    /// Resolve dependencies and write deps-lock.yaml
    Lock,
    /// Download and verify locked dependencies
    Sync {
        /// Keep files that are not tracked by the lock file
        #[arg(long)]
        no_cleanup: bool,
    },
    /// Write deps.env with variables for each dependency
    Env,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let global = GlobalArgs {
        url: cli.url,
        username: cli.username,
        password: cli.password,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Upload {
            src,
            dest,
            transfer,
        } => cli::upload::run(&global, &src, &dest, &transfer).await,
        Commands::Download {
            src,
            dest,
            transfer,
            flatten,
            delete_extra,
            recursive,
        } => {
            let flags = DownloadFlags {
                flatten,
                delete_extra,
                recursive,
            };
            cli::download::run(&global, &src, &dest, &transfer, flags).await
        }
        Commands::Deps { command } => match command {
            DepsCommands::Init => cli::deps::init(&global),
            DepsCommands::Lock => cli::deps::lock(&global).await,
            DepsCommands::Sync { no_cleanup } => cli::deps::sync(&global, no_cleanup).await,
            DepsCommands::Env => cli::deps::env(&global),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
