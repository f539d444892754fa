use clap::Parser;
use issue_board::cli::commands::{self, BoardContext};
use issue_board::cli::{Cli, Commands};
use issue_board::config::{self, BoardConfig};
use issue_board::format::OutputMode;
use issue_board::logging::init_logging;
use issue_board::{BoardError, Result, StructuredError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();
    let mode = OutputMode::from_flags(cli.json, cli.quiet);

    let result = match &cli.command {
        Commands::Init => {
            start_logging(&cli, None);
            commands::init::execute(cli.dir.as_deref(), mode)
        }
        command => run(&cli, command, mode),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

fn run(cli: &Cli, command: &Commands, mode: OutputMode) -> Result<()> {
    let overrides = build_cli_overrides(cli);
    let board_config = match BoardConfig::load(cli.dir.as_deref(), &overrides) {
        Ok(board_config) => board_config,
        Err(e) => {
            start_logging(cli, None);
            return Err(e);
        }
    };
    start_logging(cli, Some(&board_config));

    let mut ctx = BoardContext::open(board_config)?;

    match command {
        Commands::Init => commands::init::execute(cli.dir.as_deref(), mode),
        Commands::Columns => commands::columns::execute(&ctx, mode),
        Commands::Ingest(args) => commands::ingest::execute(args, &mut ctx, mode),
        Commands::Show(args) => commands::show::execute(args, &ctx, mode),
        Commands::Links { id } => commands::links::execute(id, &ctx, mode),
        Commands::Move(args) => commands::move_issue::execute(args, &mut ctx, mode),
        Commands::Remove { id } => commands::remove::execute(id, &mut ctx, mode),
    }
}

fn start_logging(cli: &Cli, board_config: Option<&BoardConfig>) {
    let log_level = board_config.and_then(|c| c.log_level.as_deref());
    let log_file = board_config.and_then(|c| c.log_file.as_deref());
    if let Err(e) = init_logging(cli.verbose, cli.quiet, log_level, log_file) {
        eprintln!("Failed to initialize logging: {e}");
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &BoardError, json_mode: bool) -> ! {
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
        // Relative to the CWD, not the board directory.
        dump: cli
            .dump
            .as_deref()
            .map(|path| std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())),
        log_file: None,
        json: Some(cli.json),
    }
}
