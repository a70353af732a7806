//! Raw object commands against one store.

use crate::app::App;
use crate::error::CliResult;
use crate::output::{delete_summary, format_bytes, pull_summary, push_summary};
use cairn_core::BackendKind;
use cairn_sync::{SyncDirection, SyncSummary};
use clap::Subcommand;
use std::path::PathBuf;

/// What to do with the store's objects.
#[derive(Subcommand)]
pub enum ObjectAction {
    /// List objects
    List {
        /// Only keys starting with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Upload files, keyed by their path relative to the repository root
    Upload {
        /// Files to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Download objects
    Download {
        /// Keys to download
        #[arg(required = true)]
        keys: Vec<String>,

        /// Write into this directory instead of the working tree
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Delete objects
    Delete {
        /// Keys to delete
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Mirror the whole working tree up, or the whole store down
    Sync {
        /// push or pull
        #[arg(long, default_value = "push")]
        direction: SyncDirection,
    },
}

/// Runs an object command.
pub async fn run(
    app: &App,
    kind: BackendKind,
    target: Option<&str>,
    action: ObjectAction,
) -> CliResult<()> {
    let engine = app.engine(kind, target).await?;
    match action {
        ObjectAction::List { prefix } => {
            let objects = engine.list_remote(prefix.as_deref()).await?;
            for object in &objects {
                let modified = object
                    .last_modified
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!("{:>10}  {:16}  {}", format_bytes(object.size), modified, object.key);
            }
            println!("{} object(s) in {}", objects.len(), engine.target());
        }
        ObjectAction::Upload { paths } => {
            let summary = engine.upload_paths(&paths).await?;
            push_summary(&summary, app.verbose());
        }
        ObjectAction::Download { keys, out } => {
            let summary = engine.download_keys(&keys, out).await?;
            pull_summary(&summary, app.verbose());
        }
        ObjectAction::Delete { keys } => {
            let summary = engine.delete_keys(&keys).await?;
            delete_summary(&summary);
        }
        ObjectAction::Sync { direction } => match engine.sync(direction).await? {
            SyncSummary::Push(summary) => push_summary(&summary, app.verbose()),
            SyncSummary::Pull(summary) => pull_summary(&summary, app.verbose()),
        },
    }
    Ok(())
}
