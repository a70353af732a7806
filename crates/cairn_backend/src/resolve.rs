//! Choosing the folder, bucket or container an operation runs against.

use crate::error::{BackendError, BackendResult};
use cairn_core::{BackendKind, Prompter, Repository};

/// Resolves the target for `kind`.
///
/// An explicit argument wins, then the value cached in the repository
/// config. Otherwise the user is asked, and offered to save the answer.
///
/// # Errors
///
/// Returns [`BackendError::Validation`] if nothing resolves, or a core
/// error if prompting or saving fails.
pub fn resolve_target(
    explicit: Option<&str>,
    kind: BackendKind,
    repo: &Repository,
    prompter: &dyn Prompter,
) -> BackendResult<String> {
    if let Some(target) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(target.to_string());
    }
    if let Some(target) = repo.config().target(kind) {
        return Ok(target.to_string());
    }

    let answer = prompter.input(&format!("{} {}", kind.label(), kind.target_noun()))?;
    let target = answer.trim().to_string();
    if target.is_empty() {
        return Err(BackendError::Validation(format!(
            "no {} configured for {} (pass --target or save one in the repository config)",
            kind.target_noun(),
            kind.label()
        )));
    }

    if prompter.confirm(
        &format!("Save {} `{target}` to repository config?", kind.target_noun()),
        true,
    )? {
        repo.update_config(|c| c.set_target(kind, target.clone()))?;
        tracing::info!(kind = %kind, target = %target, "target saved");
    }
    Ok(target)
}
