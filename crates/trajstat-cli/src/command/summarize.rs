use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use trajstat_analysis::{
    aggregate::{Aggregation, Aggregator, DEFAULT_SPREAD_SCALE, SummaryCurve},
    run::Experiment,
};

use crate::{
    command::args::{InputArg, MergerArg},
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SummarizeArg {
    #[clap(flatten)]
    input: InputArg,
    #[clap(flatten)]
    merger: MergerArg,
    /// How to aggregate runs at each time step (mean or median)
    #[arg(long, default_value_t = Aggregation::Mean)]
    aggregation: Aggregation,
    /// Width of the band in standard deviations (mean only)
    #[arg(long, default_value_t = DEFAULT_SPREAD_SCALE)]
    spread_scale: f64,
    /// Clamp all curves to at least this value
    #[arg(long)]
    log_floor: Option<f64>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Experiments as `<NAME> <FILE>.csv...`, repeated
    #[arg(required = true, num_args = 2..)]
    pub(crate) experiments: Vec<String>,
}

impl SummarizeArg {
    pub(crate) fn aggregator(&self) -> Aggregator {
        Aggregator::new(self.aggregation)
            .with_spread_scale(self.spread_scale)
            .with_log_floor(self.log_floor)
    }
}

#[derive(Debug, Serialize)]
struct ExperimentSummary {
    name: String,
    #[serde(flatten)]
    curve: SummaryCurve,
}

pub(crate) fn run(arg: &SummarizeArg) -> anyhow::Result<()> {
    let aggregator = arg.aggregator();
    aggregator.validate()?;
    let merger = arg.merger.merger();

    let mut experiments = vec![];
    for files in util::group_experiment_args(&arg.experiments, 1)? {
        let runs = util::read_experiment_runs(&files, arg.input.value_column)?;
        experiments.push(Experiment::new(files.name(), runs));
    }
    experiments.sort_by(|a, b| a.name.cmp(&b.name));

    let mut summaries = Vec::with_capacity(experiments.len());
    for experiment in experiments {
        let trajectory = merger
            .merge(&experiment.runs)
            .with_context(|| format!("Failed to merge runs of {}", experiment.name))?;
        let curve = aggregator
            .aggregate(&trajectory)
            .with_context(|| format!("Failed to aggregate runs of {}", experiment.name))?;
        if !curve.has_band() {
            log::warn!("{} has a single run, its band is empty", experiment.name);
        }
        summaries.push(ExperimentSummary {
            name: experiment.name,
            curve,
        });
    }
    Output::save_json(&summaries, arg.output.clone())
}
