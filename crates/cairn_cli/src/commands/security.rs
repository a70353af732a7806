//! Encryption settings and stored secrets.

use crate::app::{App, PASSPHRASE_VAR};
use crate::error::CliResult;
use cairn_storage::{Document, StateStore};
use cairn_sync::{load_or_create_vault, SyncError};
use clap::Subcommand;

/// Security subcommands.
#[derive(Subcommand)]
pub enum SecurityAction {
    /// Show encryption and credential state
    Status,
    /// Encrypt files on push from now on
    Enable,
    /// Stop encrypting files on push
    Disable,
    /// Delete stored tokens, credentials, settings and the vault
    Purge,
}

/// Global documents removed by `purge`.
const PURGED: [Document; 4] = [
    Document::Token,
    Document::Credentials,
    Document::Settings,
    Document::Vault,
];

/// Runs a security command.
pub fn run(app: &App, action: SecurityAction) -> CliResult<()> {
    match action {
        SecurityAction::Status => status(app),
        SecurityAction::Enable => enable(app),
        SecurityAction::Disable => disable(app),
        SecurityAction::Purge => purge(app),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn status(app: &App) -> CliResult<()> {
    let store = app.global_store();
    match app.open() {
        Ok(repo) => println!(
            "Encryption:      {}",
            if repo.config().encryption { "enabled" } else { "disabled" }
        ),
        Err(_) => println!("Encryption:      (not in a repository)"),
    }
    println!("Vault:           {}", yes_no(store.exists(Document::Vault)?));
    println!("Access token:    {}", yes_no(store.exists(Document::Token)?));
    println!("Credentials:     {}", yes_no(store.exists(Document::Credentials)?));
    println!(
        "{PASSPHRASE_VAR}: {}",
        yes_no(std::env::var_os(PASSPHRASE_VAR).is_some())
    );
    Ok(())
}

fn enable(app: &App) -> CliResult<()> {
    let repo = app.open()?;
    if repo.config().encryption {
        println!("Encryption is already enabled.");
        return Ok(());
    }
    load_or_create_vault(app.global_store().as_ref())?;
    repo.set_encryption(true)?;
    println!("✓ Encryption enabled");
    println!("  Files are encrypted with a key derived from your passphrase.");
    println!("  Without the passphrase they cannot be recovered.");
    Ok(())
}

fn disable(app: &App) -> CliResult<()> {
    let repo = app.open()?;
    if !repo.config().encryption {
        println!("Encryption is already disabled.");
        return Ok(());
    }
    if !app.prompter().confirm(
        "Disable encryption? Files already uploaded stay encrypted.",
        false,
    )? {
        return Err(SyncError::Cancelled.into());
    }
    repo.set_encryption(false)?;
    println!("✓ Encryption disabled");
    Ok(())
}

fn purge(app: &App) -> CliResult<()> {
    if !app.prompter().confirm(
        "Delete the stored token, credentials, settings and encryption vault? \
         Encrypted remote files will be unreadable without the vault.",
        false,
    )? {
        return Err(SyncError::Cancelled.into());
    }
    let store = app.global_store();
    let mut removed = 0;
    for document in PURGED {
        if store.remove(document)? {
            removed += 1;
        }
    }
    println!("✓ Removed {removed} stored document(s)");
    Ok(())
}
