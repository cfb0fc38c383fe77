//! `mml` - apply changes to MML model documents.

use std::io::{self, IsTerminal, Write};

use clap::Parser;
use mml_cli::commands::{run_apply, run_show};
use mml_cli::logging::{init_logging, LogConfig};

mod cli;

use crate::cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    let log_config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        use_env_filter: !cli.verbosity.is_present(),
        with_ansi: io::stderr().is_terminal(),
    };
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let result = match &cli.command {
        Command::Apply(args) => run_apply(&args.to_options()),
        Command::Show(args) => run_show(&args.to_options()),
    };
    let exit_code = match result {
        Ok(document) => {
            let mut stdout = io::stdout().lock();
            match stdout.write_all(document.as_bytes()) {
                Ok(()) => 0,
                Err(error) => {
                    eprintln!("error: {error}");
                    1
                }
            }
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}
