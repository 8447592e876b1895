mod cmd;
mod logging;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "qlink", version, about = "Framing, integrity and encryption pipeline CLI")]
struct Cli {
    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    if let Err(err) = cmd::run(cli.command) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
