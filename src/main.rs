// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use pose_relay::cli::args::Cli;
use pose_relay::cli::logging::set_verbose;
use pose_relay::cli::run::run_command;

fn main() {
    let cli = Cli::parse();
    set_verbose(cli.command.pose().verbose);
    run_command(&cli.command);
}
