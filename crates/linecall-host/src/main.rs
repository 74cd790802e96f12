//! Binary entrypoint for the `linecall` host.

use std::io::{self, BufReader, Write};
use std::process::ExitCode;

use linecall_config::Config;
use linecall_host::{SETUP_FAILURE, serve, telemetry};

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(error) if error.is_informational() => {
            return match error.print() {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        }
        Err(error) => {
            error.print().ok();
            return ExitCode::from(SETUP_FAILURE);
        }
    };

    if let Err(error) = telemetry::initialise(&config) {
        writeln!(io::stderr().lock(), "{error}").ok();
        return ExitCode::from(SETUP_FAILURE);
    }

    let stdin = io::stdin();
    let reader = BufReader::new(stdin.lock());
    let stdout = io::stdout();
    let writer = stdout.lock();

    match serve(&config, reader, writer) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            writeln!(io::stderr().lock(), "{error}").ok();
            ExitCode::from(error.exit_status())
        }
    }
}
