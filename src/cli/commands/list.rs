//! `tokenvault list` — display tokens in a table.

use crate::cli::output;
use crate::cli::{open_vault, Cli};
use crate::errors::Result;
use crate::token::{SortDirection, SortField, TokenFilter};

/// Execute the `list` command.
pub fn execute(
    cli: &Cli,
    search: Option<&str>,
    status: Option<&str>,
    priority: Option<&str>,
    sort: Option<&str>,
    desc: bool,
) -> Result<()> {
    let (mut vault, settings) = open_vault(cli)?;
    vault.refresh()?;

    let filter = TokenFilter {
        search: search.map(str::to_string),
        status: status.map(str::parse).transpose()?,
        priority: priority.map(str::parse).transpose()?,
    };

    // Explicit flags win; the configured display preferences fill in.
    let field: SortField = match sort {
        Some(s) => s.parse()?,
        None => settings.default_sort.parse().unwrap_or(SortField::ServiceName),
    };
    let direction = if desc || (sort.is_none() && settings.default_descending) {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };

    let tokens = vault.query(&filter, Some((field, direction)));

    output::info(&format!(
        "{} token(s) ({} total)",
        tokens.len(),
        vault.tokens().len()
    ));
    output::print_tokens_table(&tokens);

    Ok(())
}
