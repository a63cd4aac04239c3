use std::process::ExitCode;

use clap::Parser;
use hyskin::{cli, logger};

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();

    // Session log (overwrites previous session log)
    logger::init(args.verbose);

    cli::run(args)
}
