use clap::Parser;
use tokenvault::cli::commands::{add, audit_cmd, completions, delete, expiring, init, list, reveal, update};
use tokenvault::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { no_passphrase_hash } => init::execute(&cli, no_passphrase_hash),
        Commands::Add {
            ref service,
            ref value,
            ref token_type,
            ref notes,
            ref url,
            ref instructions,
            ref expires,
            ref priority,
            ref status,
            ref tags,
            ref used_by,
        } => add::execute(
            &cli,
            &add::AddArgs {
                service,
                value: value.as_deref(),
                token_type,
                notes,
                url: url.as_deref(),
                instructions: instructions.as_deref(),
                expires: expires.as_deref(),
                priority: priority.as_deref(),
                status: status.as_deref(),
                tags,
                used_by,
            },
        ),
        Commands::List {
            ref search,
            ref status,
            ref priority,
            ref sort,
            desc,
        } => list::execute(
            &cli,
            search.as_deref(),
            status.as_deref(),
            priority.as_deref(),
            sort.as_deref(),
            desc,
        ),
        Commands::Reveal { id, copy } => reveal::execute(&cli, id, copy),
        Commands::Update {
            id,
            ref service,
            ref token_type,
            ref notes,
            ref url,
            ref instructions,
            ref expires,
            ref priority,
            ref status,
            ref tags,
            ref used_by,
            rotate,
        } => update::execute(
            &cli,
            id,
            &update::UpdateArgs {
                service: service.as_deref(),
                token_type: token_type.as_deref(),
                notes: notes.as_deref(),
                url: url.as_deref(),
                instructions: instructions.as_deref(),
                expires: expires.as_deref(),
                priority: priority.as_deref(),
                status: status.as_deref(),
                tags,
                used_by,
                rotate,
            },
        ),
        Commands::Delete { id, force } => delete::execute(&cli, id, force),
        Commands::Expiring { days } => expiring::execute(&cli, days),
        Commands::Audit { last, ref since } => audit_cmd::execute(&cli, last, since.as_deref()),
        Commands::Completions { ref shell } => completions::execute(shell),
    };

    if let Err(e) = result {
        tokenvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
