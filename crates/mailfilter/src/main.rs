//! `mailfilter` - Gmail filter document converter
//!
//! Reads a filter document in one format and writes it in the other.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use cli::{Cli, init_tracing};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let options = cli.convert_options();
    info!("Converting {} to {}", options.source, options.target);

    let input = read_input(cli)?;
    let output = mailfilter_core::convert(&input, &options)?;
    write_output(cli, &output)
}

fn read_input(cli: &Cli) -> Result<String> {
    match &cli.input {
        Some(path) => {
            debug!("Reading {}", path.display());
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            debug!("Reading stdin");
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

fn write_output(cli: &Cli, output: &str) -> Result<()> {
    match &cli.output {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(output.as_bytes())
                .and_then(|()| stdout.flush())
                .context("Failed to write stdout")?;
        }
    }
    Ok(())
}

/// Prints the error chain, then one line per schema violation.
fn report(err: &anyhow::Error) {
    eprintln!("error: {err:#}");
    if let Some(mailfilter_core::Error::Validation(violations)) =
        err.downcast_ref::<mailfilter_core::Error>()
    {
        for violation in violations {
            eprintln!("  {violation}");
        }
    }
}
