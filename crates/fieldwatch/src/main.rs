mod exit;
mod logging;
mod supervise;

use std::path::PathBuf;

use clap::Parser;

use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "fieldwatch",
    version,
    about = "Serial field-device supervisor with heartbeat watchdog and email alerts"
)]
struct Cli {
    /// Path to the YAML settings document.
    #[arg(value_name = "CONFIG", env = "FIELDWATCH_CONFIG")]
    config: PathBuf,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match supervise::run(&cli.config) {
        Ok(never) => match never {},
        Err(err) => {
            tracing::error!(code = err.code, error = %err, "fieldwatch cannot start");
            std::process::exit(err.code);
        }
    }
}
