//! `tokenvault add` — encrypt and store a new token.

use crate::cli::output;
use crate::cli::{
    check_bootstrap_passphrase, open_vault, parse_expiration, prompt_passphrase_for_vault,
    read_secret_value, Cli,
};
use crate::errors::Result;
use crate::token::TokenDraft;

/// Arguments collected from the `add` subcommand flags.
pub struct AddArgs<'a> {
    pub service: &'a str,
    pub value: Option<&'a str>,
    pub token_type: &'a str,
    pub notes: &'a str,
    pub url: Option<&'a str>,
    pub instructions: Option<&'a str>,
    pub expires: Option<&'a str>,
    pub priority: Option<&'a str>,
    pub status: Option<&'a str>,
    pub tags: &'a [String],
    pub used_by: &'a [String],
}

/// Execute the `add` command.
pub fn execute(cli: &Cli, args: &AddArgs<'_>) -> Result<()> {
    let secret = read_secret_value(&format!("Enter secret value for {}", args.service), args.value)?;

    let draft = TokenDraft {
        service_name: args.service.to_string(),
        token_type: args.token_type.to_string(),
        secret: secret.to_string(),
        regeneration_url: args.url.map(str::to_string),
        regeneration_instructions: args.instructions.map(str::to_string),
        expiration_date: args.expires.map(parse_expiration).transpose()?,
        status: args.status.map(str::parse).transpose()?,
        priority: args.priority.map(str::parse).transpose()?,
        usage_notes: args.notes.to_string(),
        tags: args.tags.to_vec(),
        used_by: args.used_by.to_vec(),
        locations: Vec::new(),
    };

    let (mut vault, _settings) = open_vault(cli)?;

    let vault_id = vault.store().path().to_string_lossy().to_string();
    let passphrase = prompt_passphrase_for_vault(Some(&vault_id))?;
    check_bootstrap_passphrase(vault.store(), passphrase.as_bytes())?;

    let token = vault.add_token(draft, passphrase.as_bytes())?;

    output::success(&format!(
        "Token for '{}' stored with id {}",
        token.service_name, token.id
    ));
    output::tip("Run `tokenvault reveal <ID>` to decrypt it again.");

    Ok(())
}
