pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "amendex",
    about = "Amendex operator CLI",
    long_about = "Apply contract amendment rounds to a base record set, inspect record sets, \
                  and audit their referential invariants.",
    after_help = "Examples:\n  amendex apply --base extracted.json --delta amendment_1.json\n  \
                  amendex inspect extracted.json\n  amendex check extracted.json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Apply one or more amendment deltas to a base record set, strictly in order"
    )]
    Apply {
        #[arg(long, help = "Base record set JSON file")]
        base: PathBuf,
        #[arg(long, required = true, help = "Amendment delta JSON file(s), applied in order")]
        delta: Vec<PathBuf>,
        #[arg(long, help = "Output path (defaults to <base stem>_updated.json)")]
        out: Option<PathBuf>,
    },
    #[command(about = "Summarize a record set: tables, row counts, amendment log tail")]
    Inspect {
        #[arg(help = "Record set JSON file")]
        file: PathBuf,
    },
    #[command(about = "Audit referential invariants: dangling references and duplicate keys")]
    Check {
        #[arg(help = "Record set JSON file")]
        file: PathBuf,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Apply { base, delta, out } => commands::apply::run(&base, &delta, out.as_deref()),
        Command::Inspect { file } => commands::inspect::run(&file),
        Command::Check { file } => commands::check::run(&file),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
