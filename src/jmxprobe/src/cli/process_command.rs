use clap::{CommandFactory, Parser};
use colored::Colorize;
use std::ffi::OsString;
use std::io;

use super::commands::Cli;
use crate::config::ConfigLoader;
use crate::error::{exit_codes, ProbeError};
use crate::logging::setup_logging;
use crate::mbeans::JolokiaConnector;
use crate::output::{install_shutdown_handlers, SystemPacer};
use crate::pipeline::{Pipeline, Request};
use crate::process::{HotSpotProcessSource, SelfMarker};
use crate::{error_message, warning_message};

/// Processes the process's own command line and returns the exit code.
pub fn process_command() -> i32 {
    process_args(std::env::args_os())
}

pub fn process_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() <= 1 {
        eprintln!("{}", Cli::command().render_help());
        return exit_codes::UNEXPECTED_FAILURE;
    }

    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) => {
            // help and version go to stdout and are not failures
            let code = if e.use_stderr() {
                exit_codes::UNEXPECTED_FAILURE
            } else {
                exit_codes::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };

    if let Err(e) = setup_logging(cli.verbose) {
        warning_message!("{:#}", e);
    }

    match run(&cli) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            report(&e);
            e.exit_code()
        }
    }
}

fn run(cli: &Cli) -> Result<(), ProbeError> {
    let request = cli.request()?;
    let config = ConfigLoader::load_config(&cli.overrides())?;

    let source = HotSpotProcessSource::new(&config);
    let connector = JolokiaConnector::new(config.http_timeout());
    let pipeline = Pipeline {
        source: &source,
        connector: &connector,
        config: &config,
        marker: SelfMarker::generate(),
    };

    if let Request::Probe(probe) = &request {
        if probe.watch.is_some() {
            install_shutdown_handlers()?;
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    pipeline.run(&request, &mut out, &SystemPacer)
}

fn report(error: &ProbeError) {
    if let ProbeError::Usage(_) = error {
        eprintln!("{}", Cli::command().render_usage());
    }

    let chain = error.chain();
    let mut messages = chain.iter();
    if let Some(message) = messages.next() {
        error_message!("{}", message);
    }
    for cause in messages {
        eprintln!("          caused by: {}", cause);
    }
}
