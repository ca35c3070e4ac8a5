//! `tokenvault audit` — display the access log.
//!
//! Usage:
//!   tokenvault audit               # show last 50 entries
//!   tokenvault audit --last 20     # show last 20
//!   tokenvault audit --since 7d    # entries from last 7 days

use chrono::Utc;

use crate::audit::{AuditEntry, AuditLog};
use crate::cli::output;
use crate::cli::{resolve_vault_dir, Cli};
use crate::config::Settings;
use crate::errors::{Result, TokenVaultError};

/// Execute the `audit` command.
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    let vault_dir = resolve_vault_dir(cli, &settings)?;

    let audit = AuditLog::open(&vault_dir)
        .ok_or_else(|| TokenVaultError::AuditError("failed to open access log".into()))?;

    let since_dt = match since {
        Some(s) => Some(parse_duration(s)?),
        None => None,
    };

    let entries = audit.query(last, since_dt)?;

    if entries.is_empty() {
        output::info("No access log entries found.");
        return Ok(());
    }

    print_audit_table(&entries);

    Ok(())
}

/// Parse a human-friendly duration string like "7d", "24h", "30m".
fn parse_duration(input: &str) -> Result<chrono::DateTime<Utc>> {
    let input = input.trim();

    let (num_str, unit) = if let Some(s) = input.strip_suffix('d') {
        (s, 'd')
    } else if let Some(s) = input.strip_suffix('h') {
        (s, 'h')
    } else if let Some(s) = input.strip_suffix('m') {
        (s, 'm')
    } else {
        return Err(TokenVaultError::CommandFailed(format!(
            "invalid duration '{input}' (use format like 7d, 24h, or 30m)"
        )));
    };

    let num: i64 = num_str.parse().map_err(|_| {
        TokenVaultError::CommandFailed(format!(
            "invalid duration '{input}' (number part is not valid)"
        ))
    })?;

    let duration = match unit {
        'd' => chrono::Duration::days(num),
        'h' => chrono::Duration::hours(num),
        'm' => chrono::Duration::minutes(num),
        _ => unreachable!(),
    };

    Ok(Utc::now() - duration)
}

/// Print access log entries in a formatted table.
fn print_audit_table(entries: &[AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Action", "Token", "Result", "Error"]);

    for entry in entries {
        let time = entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let token = entry
            .token_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let result = if entry.success {
            style("ok").green().to_string()
        } else {
            style("failed").red().to_string()
        };
        let error = entry.error_message.as_deref().unwrap_or("-");

        table.add_row(vec![
            time,
            colorize_action(&entry.action),
            token,
            result,
            error.to_string(),
        ]);
    }

    println!(
        "{}",
        style(format!("{} access log entries:", entries.len())).bold()
    );
    println!("{table}");
}

/// Colorize action names for display.
fn colorize_action(action: &str) -> String {
    use console::style;

    match action {
        "init" => style(action).green().to_string(),
        "create" | "update" => style(action).blue().to_string(),
        "delete" => style(action).red().to_string(),
        "reveal" => style(action).yellow().to_string(),
        _ => action.to_string(),
    }
}
