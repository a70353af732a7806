//! Cairn CLI
//!
//! Version-controlled sync of a working directory to cloud object storage.
//!
//! # Commands
//!
//! - `init`, `clone` - Create a repository, optionally linked to a remote
//! - `add`, `rm`, `reset`, `commit`, `amend` - Stage and record changes
//! - `status`, `log`, `diff` - Inspect local and remote state
//! - `push`, `pull` - Move committed files to and from a remote
//! - `remote` - Show the linked remote
//! - `object` - Raw object commands against one store
//! - `security` - Encryption settings

mod app;
mod commands;
mod credentials;
mod error;
mod output;
mod prompt;

use app::App;
use cairn_core::BackendKind;
use clap::{Parser, Subcommand};
use error::CliResult;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Sync a working directory to Google Drive, S3, GCS or Azure.
#[derive(Parser)]
#[command(name = "cairn")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Repository root (defaults to the current directory)
    #[arg(global = true, long)]
    root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a repository in the root directory
    Init {
        /// Also create a remote of this kind, named after the directory
        #[arg(long)]
        remote: Option<BackendKind>,
    },

    /// Clone a Drive folder into a new directory
    Clone {
        /// Folder id
        folder_id: String,
    },

    /// Stage files (`.` stages the whole tree)
    Add {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Unstage files
    Rm {
        /// Files to unstage
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Unstage the given files, or everything
    Reset {
        /// Files to unstage (all if omitted)
        paths: Vec<String>,
    },

    /// Record the staged files
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Change the message of the last, unpushed commit
    Amend {
        /// New message
        #[arg(short, long)]
        message: String,
    },

    /// Show staged files and unpushed commits
    Status,

    /// Show commit history
    Log {
        /// Maximum number of commits
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// List files of each commit
        #[arg(long)]
        files: bool,
    },

    /// Compare tracked files with the remote
    Diff {
        /// Remote kind
        #[arg(long, default_value = "drive")]
        remote: BackendKind,

        /// Folder id, bucket or container
        #[arg(long)]
        target: Option<String>,
    },

    /// Upload unpushed commits
    Push {
        /// Re-check every committed file
        #[arg(short, long)]
        force: bool,

        /// Remote kind
        #[arg(long, default_value = "drive")]
        remote: BackendKind,

        /// Folder id, bucket or container
        #[arg(long)]
        target: Option<String>,
    },

    /// Download remote files
    Pull {
        /// Skip the confirmation
        #[arg(short, long)]
        force: bool,

        /// Show what would be pulled
        #[arg(long)]
        dry_run: bool,

        /// Keep local files on conflict
        #[arg(long, conflicts_with = "theirs")]
        ours: bool,

        /// Take remote files on conflict
        #[arg(long)]
        theirs: bool,

        /// Remote kind
        #[arg(long, default_value = "drive")]
        remote: BackendKind,

        /// Folder id, bucket or container
        #[arg(long)]
        target: Option<String>,

        /// Only these keys
        files: Vec<String>,
    },

    /// Show the linked remote
    Remote {
        /// Remote kind to probe
        #[arg(long)]
        remote: Option<BackendKind>,
    },

    /// Raw object commands against one store
    Object {
        /// Store kind
        kind: BackendKind,

        /// Folder id, bucket or container
        #[arg(global = true, long)]
        target: Option<String>,

        #[command(subcommand)]
        action: commands::object::ObjectAction,
    },

    /// Encryption settings
    Security {
        #[command(subcommand)]
        action: commands::security::SecurityAction,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli, app: App) -> CliResult<()> {
    match cli.command {
        Commands::Init { remote } => commands::repo::init(&app, remote).await,
        Commands::Clone { folder_id } => commands::repo::clone(&app, &folder_id).await,
        Commands::Add { paths } => commands::repo::add(&app, &paths),
        Commands::Rm { paths } => commands::repo::remove(&app, &paths),
        Commands::Reset { paths } => commands::repo::reset(&app, &paths),
        Commands::Commit { message } => commands::repo::commit(&app, &message).await,
        Commands::Amend { message } => commands::repo::amend(&app, &message),
        Commands::Status => commands::repo::status(&app),
        Commands::Log { limit, files } => commands::repo::log(&app, limit, files),
        Commands::Diff { remote, target } => {
            commands::sync::diff(&app, remote, target.as_deref()).await
        }
        Commands::Push {
            force,
            remote,
            target,
        } => commands::sync::push(&app, remote, target.as_deref(), force).await,
        Commands::Pull {
            force,
            dry_run,
            ours,
            theirs,
            remote,
            target,
            files,
        } => {
            let args = commands::sync::PullArgs {
                force,
                dry_run,
                ours,
                theirs,
                files,
            };
            commands::sync::pull(&app, remote, target.as_deref(), args).await
        }
        Commands::Remote { remote } => commands::sync::remote(&app, remote).await,
        Commands::Object {
            kind,
            target,
            action,
        } => commands::object::run(&app, kind, target.as_deref(), action).await,
        Commands::Security { action } => commands::security::run(&app, action),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let app = match App::from_env(cli.root.clone()) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("✗ {err}");
            return ExitCode::FAILURE;
        }
    };
    let verbose = cli.verbose || app.settings().verbose_logging;
    init_logging(verbose);
    let app = app.with_verbose(verbose);

    match run(cli, app).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_cancelled() => {
            println!("Cancelled.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("✗ {err}");
            ExitCode::FAILURE
        }
    }
}
