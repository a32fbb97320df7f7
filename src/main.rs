use std::process::ExitCode;

use clap::Parser;

use fontherd::cli::{self, Cli};
use fontherd::utils::init_logging;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.config());
    ExitCode::from(cli::run(&cli))
}
