//! Local repository commands: init, clone, staging and history.

use crate::app::App;
use crate::error::{CliError, CliResult};
use crate::output::format_bytes;
use cairn_core::{BackendKind, Repository, StageOutcome, UnstageOutcome};
use cairn_sync::{clone_repository, create_remote};
use tracing::info;

/// Creates a repository, optionally with a freshly created remote.
pub async fn init(app: &App, remote: Option<BackendKind>) -> CliResult<()> {
    let repo = Repository::init(app.context().clone())?;
    println!("✓ Initialized empty repository");
    println!("  Root: {}", repo.context().root().display());

    if let Some(kind) = remote {
        let backend = app.backend(kind).await?;
        let name = repo.config().name;
        let info = create_remote(&repo, backend.as_ref(), &name).await?;
        println!("✓ Created {} {} `{}`", kind.label(), kind.target_noun(), info.target);
        if let Some(url) = &info.url {
            println!("  URL: {url}");
        }
    }
    Ok(())
}

/// Clones a Drive folder into `<cwd>/<folder name>`.
pub async fn clone(app: &App, folder_id: &str) -> CliResult<()> {
    info!(folder_id, "cloning");
    let backend = app.backend(BackendKind::Drive).await?;
    let cloned = clone_repository(
        app.context().home(),
        app.context().root(),
        folder_id,
        backend,
        app.prompter().clone(),
        app.sync_config(),
    )
    .await?;

    println!("✓ Cloned `{}`", cloned.remote.name);
    println!("  Root: {}", cloned.root.display());
    crate::output::pull_summary(&cloned.summary, app.verbose());
    Ok(())
}

/// Stages paths.
pub fn add(app: &App, paths: &[String]) -> CliResult<()> {
    let repo = app.open()?;
    let outcomes = repo.add(paths)?;
    let mut staged = 0;
    for (path, outcome) in &outcomes {
        match outcome {
            StageOutcome::Staged => staged += 1,
            StageOutcome::AlreadyStaged => {
                if app.verbose() {
                    println!("  = {path} (already staged)");
                }
            }
            StageOutcome::NotFound => println!("  ✗ {path}: not found"),
            StageOutcome::Ignored => println!("  - {path}: ignored"),
        }
    }
    println!("✓ Staged {staged} file(s)");
    Ok(())
}

/// Unstages paths.
pub fn remove(app: &App, paths: &[String]) -> CliResult<()> {
    let repo = app.open()?;
    let outcomes = repo.remove(paths)?;
    let removed = outcomes
        .iter()
        .filter(|(_, o)| *o == UnstageOutcome::Unstaged)
        .count();
    for (path, outcome) in &outcomes {
        if *outcome == UnstageOutcome::NotStaged {
            println!("  - {path}: not staged");
        }
    }
    println!("✓ Unstaged {removed} file(s)");
    Ok(())
}

/// Unstages the given paths, or clears the stage.
pub fn reset(app: &App, paths: &[String]) -> CliResult<()> {
    if !paths.is_empty() {
        return remove(app, paths);
    }
    let repo = app.open()?;
    let cleared = repo.reset()?;
    println!("✓ Unstaged {cleared} file(s)");
    Ok(())
}

/// Records the stage.
pub async fn commit(app: &App, message: &str) -> CliResult<()> {
    let message = message.trim();
    if message.is_empty() {
        return Err(CliError::usage("commit message must not be empty"));
    }
    let repo = app.open()?;
    let commit = repo.commit(message).await?;
    println!("✓ [{}] {}", short_id(&commit.id), commit.message);
    println!("  {} file(s)", commit.file_count);
    Ok(())
}

/// Rewrites the last commit's message.
pub fn amend(app: &App, message: &str) -> CliResult<()> {
    let message = message.trim();
    if message.is_empty() {
        return Err(CliError::usage("commit message must not be empty"));
    }
    let repo = app.open()?;
    let commit = repo.amend(message)?;
    println!("✓ Amended [{}] {}", short_id(&commit.id), commit.message);
    Ok(())
}

/// Shows the stage, the remote and recent commits.
pub fn status(app: &App) -> CliResult<()> {
    let repo = app.open()?;
    let report = repo.status();

    println!("On branch {}", report.branch);
    if let Some(remote) = &report.remote {
        println!("Remote: {} ({} {})", remote.name, remote.kind.label(), remote.target);
    }
    println!();

    if report.staged.is_empty() {
        println!("Nothing staged.");
    } else {
        println!("Staged ({}):", report.staged.len());
        for entry in &report.staged {
            match entry.size {
                Some(size) => println!("  {} ({})", entry.path, format_bytes(size)),
                None => println!("  {} (deleted)", entry.path),
            }
        }
    }
    println!();
    println!(
        "{} commit(s), {} not pushed",
        report.total_commits, report.unpushed
    );
    for commit in &report.recent {
        println!(
            "  {} {} {}",
            short_id(&commit.id),
            if commit.pushed { "✓" } else { "•" },
            commit.message
        );
    }
    Ok(())
}

/// Prints history, newest first.
pub fn log(app: &App, limit: Option<usize>, files: bool) -> CliResult<()> {
    let repo = app.open()?;
    let commits = repo.log(limit);
    if commits.is_empty() {
        println!("No commits yet.");
        return Ok(());
    }
    for commit in commits {
        let state = if commit.pushed { "pushed" } else { "local" };
        println!("commit {} ({state})", commit.id);
        println!("Date:  {}", commit.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
        if let Some(amended) = commit.amended_at {
            println!("Amended: {}", amended.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        println!();
        println!("    {}", commit.message);
        println!();
        if files {
            for file in &commit.files {
                println!("    {} ({})", file.path, format_bytes(file.size));
            }
            println!();
        }
    }
    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}
