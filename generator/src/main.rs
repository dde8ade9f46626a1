mod cli;
mod error;
mod fetch;
mod generators;
mod output;

use std::{error::Error as _, process::ExitCode};

use clap::Parser;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use error::GeneratorError;
use generators::Options;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &cli::Cli) -> Result<(), GeneratorError> {
    let html = fetch::load(&cli.input)?;
    let registry = dt_botdoc::extract_str(&html)?;
    info!(
        types = registry.types.len(),
        methods = registry.operations.len(),
        "extracted API reference"
    );

    let options = Options {
        types_module: cli.types_module.clone(),
    };
    let code = cli.generator.generate(&registry, &options)?;
    output::write(&cli.output, &code)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let mut message = err.to_string();
            let mut source = err.source();
            while let Some(cause) = source {
                message.push_str(": ");
                message.push_str(&cause.to_string());
                source = cause.source();
            }
            error!("{message}");
            ExitCode::FAILURE
        }
    }
}
