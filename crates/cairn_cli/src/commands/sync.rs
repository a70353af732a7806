//! Commands that talk to a remote: diff, push, pull, remote.

use crate::app::App;
use crate::error::CliResult;
use crate::output::{pull_summary, push_summary};
use cairn_core::{BackendKind, ConflictPolicy};
use cairn_sync::PullOptions;

/// Arguments of `cairn pull`.
pub struct PullArgs {
    /// Skip the confirmation.
    pub force: bool,
    /// Plan only.
    pub dry_run: bool,
    /// Keep local files on conflict.
    pub ours: bool,
    /// Take remote files on conflict.
    pub theirs: bool,
    /// Only these keys.
    pub files: Vec<String>,
}

impl PullArgs {
    /// The flags win over the configured default policy.
    fn policy(&self, default: ConflictPolicy) -> ConflictPolicy {
        if self.ours {
            ConflictPolicy::KeepLocal
        } else if self.theirs {
            ConflictPolicy::TakeRemote
        } else {
            default
        }
    }
}

/// Compares tracked files with the remote.
pub async fn diff(app: &App, kind: BackendKind, target: Option<&str>) -> CliResult<()> {
    let engine = app.engine(kind, target).await?;
    let report = engine.diff().await?;
    if report.is_clean() {
        println!("✓ Everything matches {}", engine.target());
        return Ok(());
    }
    for path in &report.added {
        println!("  + {path}");
    }
    for path in &report.modified {
        println!("  ~ {path}");
    }
    for path in &report.deleted {
        println!("  - {path}");
    }
    for path in &report.remote_only {
        println!("  ? {path} (remote only)");
    }
    println!(
        "{} added, {} modified, {} deleted, {} remote only",
        report.added.len(),
        report.modified.len(),
        report.deleted.len(),
        report.remote_only.len()
    );
    Ok(())
}

/// Pushes unpushed commits.
pub async fn push(app: &App, kind: BackendKind, target: Option<&str>, force: bool) -> CliResult<()> {
    let engine = app.engine(kind, target).await?;
    let summary = if force {
        engine.force_push().await?
    } else {
        engine.push().await?
    };
    if summary.files.is_empty() && summary.commits == 0 {
        println!("Everything is up to date. Nothing to push.");
        return Ok(());
    }
    push_summary(&summary, app.verbose());
    println!("  {} commit(s) marked pushed", summary.commits);
    Ok(())
}

/// Pulls remote files.
pub async fn pull(
    app: &App,
    kind: BackendKind,
    target: Option<&str>,
    args: PullArgs,
) -> CliResult<()> {
    let engine = app.engine(kind, target).await?;
    let policy = args.policy(app.settings().conflict_resolution);
    let options = PullOptions::new()
        .force(args.force)
        .dry_run(args.dry_run)
        .policy(policy)
        .files(args.files.clone());
    let summary = engine.pull(options).await?;

    if args.dry_run {
        if summary.planned.is_empty() {
            println!("Remote is empty.");
        }
        for object in &summary.planned {
            println!("  {} ({})", object.key, crate::output::format_bytes(object.size));
        }
        println!("{} file(s) would be considered (dry run)", summary.planned.len());
        return Ok(());
    }
    pull_summary(&summary, app.verbose());
    Ok(())
}

/// Shows the stored remote and probes it.
pub async fn remote(app: &App, kind: Option<BackendKind>) -> CliResult<()> {
    let repo = app.open()?;
    let stored = repo.remote();
    let Some(kind) = kind.or(stored.as_ref().map(|r| r.kind)) else {
        println!("No remote linked. Use `cairn init --remote <kind>` or pass --remote.");
        return Ok(());
    };

    let engine = app.engine(kind, None).await?;
    let (info, reachable) = engine.remote_info().await?;
    if let Some(info) = info {
        println!("Name:    {}", info.name);
        println!("Kind:    {}", info.kind.label());
        if let Some(url) = &info.url {
            println!("URL:     {url}");
        }
        if let Some(at) = info.cloned_at {
            println!("Cloned:  {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }
    println!("Target:  {} ({})", engine.target(), kind.target_noun());
    if reachable {
        println!("✓ Reachable");
    } else {
        println!("✗ Not reachable (check credentials and the {})", kind.target_noun());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_default_policy() {
        let args = |ours, theirs| PullArgs {
            force: false,
            dry_run: false,
            ours,
            theirs,
            files: Vec::new(),
        };
        assert_eq!(args(true, false).policy(ConflictPolicy::Ask), ConflictPolicy::KeepLocal);
        assert_eq!(args(false, true).policy(ConflictPolicy::Ask), ConflictPolicy::TakeRemote);
        assert_eq!(
            args(false, false).policy(ConflictPolicy::KeepLocal),
            ConflictPolicy::KeepLocal
        );
    }
}
