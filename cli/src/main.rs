use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{Cli, Commands};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Info => commands::info::run(),
        Commands::EnvPrefix(args) => commands::env_prefix::run(&args),
        Commands::Read(args) => commands::read::run(args),
        Commands::Deploy(args) => commands::deploy::run(&args),
        Commands::GenerateExamples(args) => commands::generate::run(&args),
        Commands::Fail => commands::fail::run()
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::report(&err, cli.traceback);
            ExitCode::FAILURE
        }
    }
}
