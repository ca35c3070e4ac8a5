//! `tokenvault update` — patch a token's metadata or rotate its secret.

use crate::cli::output;
use crate::cli::{
    check_bootstrap_passphrase, open_vault, parse_expiration, prompt_passphrase_for_vault,
    read_secret_value, Cli,
};
use crate::errors::Result;
use crate::token::TokenPatch;

/// Arguments collected from the `update` subcommand flags.
pub struct UpdateArgs<'a> {
    pub service: Option<&'a str>,
    pub token_type: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub url: Option<&'a str>,
    pub instructions: Option<&'a str>,
    pub expires: Option<&'a str>,
    pub priority: Option<&'a str>,
    pub status: Option<&'a str>,
    pub tags: &'a [String],
    pub used_by: &'a [String],
    pub rotate: bool,
}

/// Execute the `update` command.
pub fn execute(cli: &Cli, id: i64, args: &UpdateArgs<'_>) -> Result<()> {
    // "none" clears the expiration date; anything else must parse.
    let expiration = match args.expires {
        Some("none") => Some(None),
        Some(s) => Some(Some(parse_expiration(s)?)),
        None => None,
    };

    let secret = if args.rotate {
        Some(read_secret_value("Enter new secret value", None)?)
    } else {
        None
    };

    let patch = TokenPatch {
        service_name: args.service.map(str::to_string),
        token_type: args.token_type.map(str::to_string),
        secret,
        regeneration_url: args.url.map(|u| Some(u.to_string())),
        regeneration_instructions: args.instructions.map(|i| Some(i.to_string())),
        expiration_date: expiration,
        status: args.status.map(str::parse).transpose()?,
        priority: args.priority.map(str::parse).transpose()?,
        usage_notes: args.notes.map(str::to_string),
        tags: if args.tags.is_empty() {
            None
        } else {
            Some(args.tags.to_vec())
        },
        used_by: if args.used_by.is_empty() {
            None
        } else {
            Some(args.used_by.to_vec())
        },
        locations: None,
    };

    let (mut vault, _settings) = open_vault(cli)?;

    // Rotating the secret needs the passphrase; metadata-only patches don't.
    let passphrase = if args.rotate {
        let vault_id = vault.store().path().to_string_lossy().to_string();
        let pw = prompt_passphrase_for_vault(Some(&vault_id))?;
        check_bootstrap_passphrase(vault.store(), pw.as_bytes())?;
        Some(pw)
    } else {
        None
    };

    let token = vault.update_token(id, patch, passphrase.as_deref().map(|p| p.as_bytes()))?;

    if args.rotate {
        output::success(&format!(
            "Secret for '{}' (id {}) rotated",
            token.service_name, token.id
        ));
    } else {
        output::success(&format!(
            "Token '{}' (id {}) updated",
            token.service_name, token.id
        ));
    }

    Ok(())
}
