//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{Result, TokenVaultError};
use crate::store::TokenStore;
use crate::vault::Vault;

/// Minimum passphrase length to prevent trivially weak passphrases.
const MIN_PASSPHRASE_LEN: usize = 8;

/// TokenVault CLI: encrypted API credential vault.
#[derive(Parser)]
#[command(
    name = "tokenvault",
    about = "Encrypted API credential vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: .tokenvault, or vault_dir from .tokenvault.toml)
    #[arg(long, global = true)]
    pub vault_dir: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Initialize a new vault
    Init {
        /// Skip recording a passphrase hash for early typo detection
        #[arg(long)]
        no_passphrase_hash: bool,
    },

    /// Add a token (secret value via prompt, stdin, or --value)
    Add {
        /// Service the credential belongs to (e.g. "GitHub")
        service: String,

        /// Secret value (omit for interactive prompt)
        #[arg(long)]
        value: Option<String>,

        /// Kind of credential (e.g. "personal access token")
        #[arg(long = "type", default_value = "")]
        token_type: String,

        /// Usage notes
        #[arg(long, default_value = "")]
        notes: String,

        /// Where to regenerate this credential
        #[arg(long)]
        url: Option<String>,

        /// How to regenerate this credential
        #[arg(long)]
        instructions: Option<String>,

        /// Expiration date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        expires: Option<String>,

        /// Priority: critical, high, medium, low
        #[arg(long)]
        priority: Option<String>,

        /// Status: active, expired, revoked, testing
        #[arg(long)]
        status: Option<String>,

        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Consumer of this credential (repeatable)
        #[arg(long = "used-by")]
        used_by: Vec<String>,
    },

    /// List tokens
    List {
        /// Substring search across service, type, notes, and tags
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by status
        #[arg(long)]
        status: Option<String>,

        /// Filter by priority
        #[arg(long)]
        priority: Option<String>,

        /// Sort field: service-name, created, updated, expiration, priority
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Decrypt and print a token's secret value
    Reveal {
        /// Token id (from `list`)
        id: i64,

        /// Copy to the clipboard instead of printing
        #[arg(long)]
        copy: bool,
    },

    /// Update a token's metadata, or rotate its secret with --rotate
    Update {
        /// Token id (from `list`)
        id: i64,

        /// New service name
        #[arg(long)]
        service: Option<String>,

        /// New credential kind
        #[arg(long = "type")]
        token_type: Option<String>,

        /// New usage notes
        #[arg(long)]
        notes: Option<String>,

        /// New regeneration URL
        #[arg(long)]
        url: Option<String>,

        /// New regeneration instructions
        #[arg(long)]
        instructions: Option<String>,

        /// New expiration date (YYYY-MM-DD, RFC 3339, or "none" to clear)
        #[arg(long)]
        expires: Option<String>,

        /// New priority
        #[arg(long)]
        priority: Option<String>,

        /// New status
        #[arg(long)]
        status: Option<String>,

        /// Replace tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Replace consumers (repeatable)
        #[arg(long = "used-by")]
        used_by: Vec<String>,

        /// Rotate the secret value (prompts for the new value)
        #[arg(long)]
        rotate: bool,
    },

    /// Soft-delete a token
    Delete {
        /// Token id (from `list`)
        id: i64,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show active tokens expiring soon
    Expiring {
        /// Window in days (default from .tokenvault.toml, usually 30)
        #[arg(long)]
        days: Option<i64>,
    },

    /// View the access log
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,

        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get the vault passphrase, trying in order:
/// 1. `TOKENVAULT_PASSPHRASE` env var (CI/CD)
/// 2. OS keyring (if compiled with `keyring-store` feature)
/// 3. Interactive prompt
///
/// Returns `Zeroizing<String>` so the passphrase is wiped from memory on drop.
pub fn prompt_passphrase_for_vault(vault_id: Option<&str>) -> Result<Zeroizing<String>> {
    // 1. Check the environment variable first (CI/CD friendly).
    if let Ok(pw) = std::env::var("TOKENVAULT_PASSPHRASE") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    // 2. Try the OS keyring (if feature enabled and vault_id provided).
    #[cfg(feature = "keyring-store")]
    if let Some(id) = vault_id {
        match crate::keyring::get_passphrase(id) {
            Ok(Some(pw)) => return Ok(Zeroizing::new(pw)),
            Ok(None) => {} // No stored passphrase, continue to prompt.
            Err(_) => {}   // Keyring unavailable, continue to prompt.
        }
    }

    // Suppress unused variable warning when keyring feature is off.
    #[cfg(not(feature = "keyring-store"))]
    let _ = vault_id;

    // 3. Fall back to interactive prompt.
    let pw = dialoguer::Password::new()
        .with_prompt("Enter vault passphrase")
        .interact()
        .map_err(|e| TokenVaultError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new passphrase with confirmation (used during `init`).
///
/// Also respects `TOKENVAULT_PASSPHRASE` for scripted/CI usage.
/// Enforces a minimum passphrase length.
pub fn prompt_new_passphrase() -> Result<Zeroizing<String>> {
    // Check the environment variable first (CI/CD friendly).
    if let Ok(pw) = std::env::var("TOKENVAULT_PASSPHRASE") {
        if !pw.is_empty() {
            if pw.len() < MIN_PASSPHRASE_LEN {
                return Err(TokenVaultError::CommandFailed(format!(
                    "passphrase must be at least {MIN_PASSPHRASE_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let passphrase = dialoguer::Password::new()
            .with_prompt("Choose vault passphrase")
            .with_confirmation(
                "Confirm vault passphrase",
                "Passphrases do not match, try again",
            )
            .interact()
            .map_err(|e| TokenVaultError::CommandFailed(format!("passphrase prompt: {e}")))?;

        if passphrase.len() < MIN_PASSPHRASE_LEN {
            output::warning(&format!(
                "Passphrase must be at least {MIN_PASSPHRASE_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(passphrase));
    }
}

/// Resolve the vault directory: the `--vault-dir` flag wins, then the
/// configured `vault_dir`, then the default.
pub fn resolve_vault_dir(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let dir = cli
        .vault_dir
        .clone()
        .unwrap_or_else(|| settings.vault_dir.clone());
    Ok(cwd.join(dir))
}

/// Load settings and open the vault for the current invocation.
pub fn open_vault(cli: &Cli) -> Result<(Vault, Settings)> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    let vault_dir = resolve_vault_dir(cli, &settings)?;
    let store = TokenStore::open(&vault_dir)?;
    let vault = Vault::initialize(store, &settings);
    Ok((vault, settings))
}

/// Fail fast when a bootstrap passphrase hash exists and the supplied
/// passphrase definitively does not match it.
///
/// A missing or malformed hash skips the check entirely: the GCM tag
/// check at decrypt time stays the authority.
pub fn check_bootstrap_passphrase(store: &TokenStore, passphrase: &[u8]) -> Result<()> {
    let Ok(Some(hash)) = store.passphrase_hash() else {
        return Ok(());
    };
    match crate::crypto::verify_passphrase(passphrase, &hash) {
        Ok(false) => Err(TokenVaultError::AuthenticationFailed),
        _ => Ok(()),
    }
}

/// Read a secret value from one of three sources: an inline flag value
/// (with a shell-history warning), piped stdin, or a hidden prompt.
pub fn read_secret_value(prompt: &str, inline: Option<&str>) -> Result<Zeroizing<String>> {
    use std::io::{IsTerminal, Read};

    if let Some(v) = inline {
        // Source 1: Inline value on the command line.
        output::warning("Value provided on command line; it may appear in shell history.");
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !std::io::stdin().is_terminal() {
        // Source 2: Piped input (stdin is not a terminal).
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(Zeroizing::new(buf.trim_end().to_string()));
    }

    // Source 3: Interactive secure prompt (default).
    let value = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| TokenVaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

/// Parse an expiration date: bare `YYYY-MM-DD` (midnight UTC) or a full
/// RFC 3339 timestamp.
pub fn parse_expiration(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| {
            TokenVaultError::ValidationFailed(format!("invalid date '{input}'"))
        })?;
        return Ok(DateTime::from_naive_utc_and_offset(midnight, Utc));
    }

    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            TokenVaultError::ValidationFailed(format!(
                "invalid expiration '{input}' (use YYYY-MM-DD or RFC 3339)"
            ))
        })
}
