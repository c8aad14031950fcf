use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use trajstat_analysis::merge::MergedTrajectory;

use crate::{
    command::args::{InputArg, MergerArg},
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct MergeArg {
    #[clap(flatten)]
    input: InputArg,
    #[clap(flatten)]
    merger: MergerArg,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Experiments as `<NAME> <FILE>.csv...`, repeated
    #[arg(required = true, num_args = 2..)]
    experiments: Vec<String>,
}

#[derive(Debug, Serialize)]
struct MergedExperiment {
    name: String,
    #[serde(flatten)]
    trajectory: MergedTrajectory,
}

pub(crate) fn run(arg: &MergeArg) -> anyhow::Result<()> {
    let merger = arg.merger.merger();
    let mut results = vec![];
    for experiment in util::group_experiment_args(&arg.experiments, 1)? {
        let runs = util::read_experiment_runs(&experiment, arg.input.value_column)?;
        let trajectory = merger
            .merge(&runs)
            .with_context(|| format!("Failed to merge runs of {}", experiment.name()))?;
        log::info!(
            "{}: {} run(s) on {} time step(s)",
            experiment.name(),
            trajectory.num_runs(),
            trajectory.len()
        );
        results.push(MergedExperiment {
            name: experiment.name().to_owned(),
            trajectory,
        });
    }
    Output::save_json(&results, arg.output.clone())
}
