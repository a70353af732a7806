//! Cloning a remote into a new repository, and linking a new remote.

use crate::config::SyncConfig;
use crate::engine::SyncEngine;
use crate::error::{SyncError, SyncResult};
use crate::pull::PullOptions;
use crate::report::PullSummary;
use cairn_backend::{RemoteBackend, TargetInfo};
use cairn_core::{ConflictPolicy, Prompter, RemoteInfo, RepoConfig, RepoContext, Repository};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of [`clone_repository`].
#[derive(Debug)]
pub struct Cloned {
    /// Root of the new working tree.
    pub root: PathBuf,
    /// Descriptor stored in the new repository.
    pub remote: RemoteInfo,
    /// What the initial pull did.
    pub summary: PullSummary,
}

/// Creates `<parent_dir>/<remote name>` as a repository bound to `target`
/// and fills it with a forced take-remote pull.
///
/// # Errors
///
/// Returns [`SyncError::RemoteInaccessible`] if the target cannot be read,
/// a validation error if the destination already exists, or any error
/// from the initial pull.
pub async fn clone_repository(
    home: &Path,
    parent_dir: &Path,
    target: &str,
    backend: Arc<dyn RemoteBackend>,
    prompter: Arc<dyn Prompter>,
    config: SyncConfig,
) -> SyncResult<Cloned> {
    let kind = backend.kind();
    if !backend.check_reachable(target).await {
        return Err(SyncError::RemoteInaccessible {
            kind,
            target: target.to_string(),
        });
    }
    let info = backend
        .describe_target(target)
        .await?
        .unwrap_or_else(|| TargetInfo {
            id: target.to_string(),
            name: target.to_string(),
            url: None,
        });

    let name = directory_name(&info.name, target);
    let root = parent_dir.join(&name);
    if root.exists() {
        return Err(SyncError::validation(format!(
            "destination {} already exists",
            root.display()
        )));
    }
    tokio::fs::create_dir_all(&root)
        .await
        .map_err(cairn_core::CoreError::from)?;

    let mut repo_config = RepoConfig {
        name: info.name.clone(),
        ..RepoConfig::default()
    };
    repo_config.set_target(kind, target);
    let remote = RemoteInfo {
        name: info.name,
        kind,
        target: target.to_string(),
        url: info.url,
        created_at: None,
        cloned_at: Some(Utc::now()),
    };
    let repo = Repository::create(
        RepoContext::new(&root, home),
        repo_config,
        Some(remote.clone()),
    )?;
    tracing::info!(root = %root.display(), target, "cloning");

    let engine = SyncEngine::new(repo, backend, target, prompter, config);
    let summary = engine
        .pull(
            PullOptions::new()
                .force(true)
                .policy(ConflictPolicy::TakeRemote),
        )
        .await?;
    Ok(Cloned {
        root,
        remote,
        summary,
    })
}

/// Creates a new target named `name` and links it to `repo`.
///
/// # Errors
///
/// Returns an error if the store cannot create targets or the repository
/// documents cannot be written.
pub async fn create_remote(
    repo: &Repository,
    backend: &dyn RemoteBackend,
    name: &str,
) -> SyncResult<RemoteInfo> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SyncError::validation("a remote name is required"));
    }
    let info = backend.create_target(name).await?;
    let kind = backend.kind();
    repo.update_config(|config| config.set_target(kind, info.id.clone()))?;
    let remote = RemoteInfo {
        name: info.name,
        kind,
        target: info.id,
        url: info.url,
        created_at: Some(Utc::now()),
        cloned_at: None,
    };
    repo.save_remote(&remote)?;
    tracing::info!(kind = %kind, target = %remote.target, "remote created");
    Ok(remote)
}

/// A safe single path component for the clone directory.
fn directory_name(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => fallback.replace(['/', '\\'], "_"),
        _ => cleaned,
    }
}
