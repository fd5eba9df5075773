use anyhow::Result;
use clap::Parser;

use photomatch::cli::SubCommandExtend;
use photomatch::config::{Opts, SubCommand};

fn main() -> Result<()> {
    env_logger::init();

    let opts = Opts::parse();
    match &opts.subcmd {
        SubCommand::Search(cmd) => cmd.run(&opts),
        SubCommand::Add(cmd) => cmd.run(&opts),
        SubCommand::List(cmd) => cmd.run(&opts),
    }
}
