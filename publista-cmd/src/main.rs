//! `publista` regenerates publication listings from BibTeX sources.

use std::process::ExitCode;

use clap::Parser;
use publistalib::Error;
use tracing::error;

mod cli;

use cli::Cli;

#[repr(u8)]
enum Exit {
    Success = 0,
    DataError = 1,
    ConfigError = 2,
    IoError = 3,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

impl From<&Error> for Exit {
    fn from(e: &Error) -> Self {
        match e {
            Error::MalformedEntry { .. } | Error::DuplicateKey { .. } | Error::MissingField { .. } => {
                Exit::DataError
            }
            Error::InvalidConfig { .. } => Exit::ConfigError,
            Error::Io { .. } => Exit::IoError,
        }
    }
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match cli.verbose {
        0 if cli.quiet => EnvFilter::new("error"),
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(cli.verbose >= 2)
                .without_time(),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli::run(&cli) {
        Ok(()) => Exit::Success.into(),
        Err(e) => {
            error!("{e}");
            Exit::from(&e).into()
        }
    }
}
