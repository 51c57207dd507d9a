use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use taskform::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:?}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
