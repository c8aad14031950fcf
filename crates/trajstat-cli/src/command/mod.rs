use clap::{Parser, Subcommand};
use env_logger::Env;

use self::{
    bootstrap::BootstrapArg, merge::MergeArg, rank::RankArg, summarize::SummarizeArg,
};

mod args;
mod bootstrap;
mod merge;
mod rank;
mod summarize;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Align the runs of each experiment on one time axis
    Merge(#[clap(flatten)] MergeArg),
    /// Summarize each experiment by mean/std or median/quartiles over time
    Summarize(#[clap(flatten)] SummarizeArg),
    /// Rank estimators per dataset and average the ranks over datasets
    Rank(#[clap(flatten)] RankArg),
    /// Estimate best-of-train test performance by bootstrapping runs
    Bootstrap(#[clap(flatten)] BootstrapArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match args.mode {
        Mode::Merge(arg) => merge::run(&arg)?,
        Mode::Summarize(arg) => summarize::run(&arg)?,
        Mode::Rank(arg) => rank::run(&arg)?,
        Mode::Bootstrap(arg) => bootstrap::run(&arg)?,
    }
    Ok(())
}
