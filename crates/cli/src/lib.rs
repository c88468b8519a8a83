pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "pvquote",
    about = "pvquote operator CLI",
    long_about = "Operate pvquote migrations, seed data, pricing checks, and runtime readiness.",
    after_help = "Examples:\n  pvquote migrate\n  pvquote seed\n  pvquote price request.json\n  pvquote doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic price sheet and demo fixtures (idempotent)")]
    Seed,
    #[command(about = "Compute a pricing breakdown for a request read from a JSON file")]
    Price {
        #[arg(help = "Path to a JSON file holding a pricing request")]
        file: PathBuf,
        #[arg(long, help = "Use compiled-in catalog defaults instead of the database overrides")]
        defaults: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config,
    #[command(about = "Validate config, database connectivity, and catalog readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Price { file, defaults } => commands::price::run(&file, defaults),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
