use clap::Parser;
use issue_triage::cli::commands;
use issue_triage::cli::{Cli, Commands};
use issue_triage::config;
use issue_triage::logging::init_logging;
use issue_triage::{StructuredError, TriageError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let overrides = build_cli_overrides(&cli);

    let result = match &cli.command {
        Commands::Init(args) => commands::init::execute(args, None),
        Commands::Release { command } => commands::release::execute(command, cli.json, &overrides),
        Commands::Group { command } => commands::group::execute(command, cli.json, &overrides),
        Commands::Event { command } => commands::event::execute(command, cli.json, &overrides),
        Commands::Resolve(args) => commands::resolve::execute(args, cli.json, &overrides),
        Commands::Check(args) => commands::check::execute(args, cli.json, &overrides),
        Commands::Levels(args) => commands::levels::execute(args, cli.json, &overrides),
        Commands::Feature { command } => commands::feature::execute(command, cli.json, &overrides),
        Commands::Config { command } => commands::config::execute(command, cli.json, &overrides),
        Commands::Completions(args) => commands::completions::execute(args),
        Commands::Schema(args) => commands::schema::execute(args),
        Commands::Version => commands::version::execute(cli.json),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &TriageError, json_mode: bool) -> ! {
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
        json: Some(cli.json),
        lock_timeout: cli.lock_timeout,
        organization: cli.organization,
        project: cli.project,
    }
}
