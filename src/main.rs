use clap::Parser;
use issuedb::cli::commands;
use issuedb::cli::{Cli, Commands};
use issuedb::config;
use issuedb::logging::init_logging;
use issuedb::{IssueDbError, StructuredError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let overrides = build_cli_overrides(&cli);
    let json = cli.json;

    let result = match cli.command {
        Commands::Init { force } => commands::init::execute(force, None, json),
        Commands::User { command } => commands::user::execute(&command, json, &overrides),
        Commands::Label { command } => commands::label::execute(&command, json, &overrides),
        Commands::Create(args) => commands::create::execute(&args, json, &overrides),
        Commands::List(args) => commands::list::execute(&args, json, &overrides),
        Commands::Show { id } => commands::show::execute(id, json, &overrides),
        Commands::Update(args) => commands::update::execute(&args, json, &overrides),
        Commands::Comment { command } => commands::comment::execute(&command, json, &overrides),
        Commands::BulkStatus(args) => commands::bulk_status::execute(&args, json, &overrides),
        Commands::Import(args) => commands::import::execute(&args, json, &overrides),
        Commands::Timeline { id } => commands::timeline::execute(id, json, &overrides),
        Commands::Report { command } => commands::report::execute(&command, json, &overrides),
        Commands::Dashboard => commands::dashboard::execute(json, &overrides),
        Commands::Config { command } => {
            commands::config_cmd::execute(&command, json, &overrides)
        }
        Commands::Schema(args) => commands::schema::execute(&args),
        Commands::Completions(args) => commands::completions::execute(&args),
        Commands::Version => commands::version::execute(json),
    };

    if let Err(e) = result {
        handle_error(&e, json);
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &IssueDbError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_cli_overrides(cli: &Cli) -> config::CliOverrides {
    config::CliOverrides {
        db: cli.db.clone(),
        actor: cli.actor.clone(),
        json: cli.json.then_some(true),
        lock_timeout: cli.lock_timeout,
    }
}
