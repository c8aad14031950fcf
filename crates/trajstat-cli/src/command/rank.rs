use std::{collections::BTreeMap, path::PathBuf};

use serde::Serialize;
use trajstat_analysis::{
    aggregate::SummaryCurve,
    ranking::{self, DatasetRuns, RankConfig},
};

use crate::{
    command::args::{InputArg, MergerArg},
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RankArg {
    #[clap(flatten)]
    input: InputArg,
    #[clap(flatten)]
    merger: MergerArg,
    /// Number of run combinations drawn per dataset
    #[arg(long, default_value_t = 10)]
    samples: usize,
    /// Seed for drawing run combinations
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Results as `<DATASET> <ESTIMATOR> <FILE>.csv...`, repeated
    #[arg(required = true, num_args = 3..)]
    experiments: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RankReport {
    datasets: Vec<String>,
    times: Vec<f64>,
    estimators: Vec<EstimatorRanks>,
}

#[derive(Debug, Serialize)]
struct EstimatorRanks {
    name: String,
    /// Average rank per dataset, in `datasets` order
    ranks: Vec<Vec<f64>>,
    summary: SummaryCurve,
}

pub(crate) fn run(arg: &RankArg) -> anyhow::Result<()> {
    let mut datasets = BTreeMap::<String, DatasetRuns>::new();
    for experiment in util::group_experiment_args(&arg.experiments, 2)? {
        let runs = util::read_experiment_runs(&experiment, arg.input.value_column)?;
        let (dataset, estimator) = (&experiment.names[0], &experiment.names[1]);
        datasets
            .entry(dataset.clone())
            .or_insert_with(|| DatasetRuns::new(dataset.clone()))
            .add_runs(estimator.clone(), runs);
    }
    let datasets = datasets.into_values().collect::<Vec<_>>();

    let config = RankConfig {
        bootstrap_samples: arg.samples,
        seed: arg.seed,
        merger: arg.merger.merger(),
        ..RankConfig::default()
    };
    let trajectories = ranking::rank_datasets(&datasets, &config)?;
    log::info!(
        "Ranked {} estimator(s) on {} dataset(s)",
        trajectories.estimators.len(),
        trajectories.datasets.len()
    );

    let summaries = trajectories.summarize()?;
    let report = RankReport {
        estimators: summaries
            .into_iter()
            .zip(trajectories.ranks)
            .map(|((name, summary), ranks)| EstimatorRanks {
                name,
                ranks,
                summary,
            })
            .collect(),
        datasets: trajectories.datasets,
        times: trajectories.times,
    };
    Output::save_json(&report, arg.output.clone())
}
