//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::token::Token;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of token metadata.  Secret values never appear here.
pub fn print_tokens_table(tokens: &[Token]) {
    if tokens.is_empty() {
        info("No tokens match.");
        tip("Run `tokenvault add <SERVICE>` to store a credential.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "ID", "Service", "Type", "Status", "Priority", "Expires", "Updated",
    ]);

    for t in tokens {
        table.add_row(vec![
            t.id.to_string(),
            t.service_name.clone(),
            t.token_type.clone(),
            colorize_status(t),
            t.priority.to_string(),
            t.expiration_date
                .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string()),
            t.last_updated.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

fn colorize_status(token: &Token) -> String {
    use crate::token::TokenStatus;

    match token.status {
        TokenStatus::Active => style("active").green().to_string(),
        TokenStatus::Expired => style("expired").red().to_string(),
        TokenStatus::Revoked => style("revoked").red().to_string(),
        TokenStatus::Testing => style("testing").yellow().to_string(),
    }
}
