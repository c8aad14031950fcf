use std::{fmt, path::PathBuf, str::FromStr};

use anyhow::Context;
use rand::SeedableRng as _;
use rand_pcg::Pcg64;
use serde::Serialize;
use trajstat_analysis::{
    aggregate::{Aggregation, Aggregator, SummaryCurve},
    bootstrap::{self, BootstrapConfig, ValidationRun},
    run::Run,
};

use crate::{
    command::args::MergerArg,
    util::{self, Output},
};

/// Repetitions and sample size, written as `<N>x<M>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BootstrapSpec {
    repetitions: usize,
    sample_size: usize,
}

impl Default for BootstrapSpec {
    fn default() -> Self {
        let config = BootstrapConfig::default();
        Self {
            repetitions: config.repetitions,
            sample_size: config.sample_size,
        }
    }
}

impl fmt::Display for BootstrapSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.repetitions, self.sample_size)
    }
}

impl FromStr for BootstrapSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (repetitions, sample_size) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected <N>x<M>, got {s}"))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("expected a positive integer, got {part}"))
        };
        Ok(Self {
            repetitions: parse(repetitions)?,
            sample_size: parse(sample_size)?,
        })
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct BootstrapArg {
    /// Number of pseudo-runs and runs drawn per pseudo-run, as `<N>x<M>`
    #[arg(long, default_value_t = BootstrapSpec::default())]
    bootstrap: BootstrapSpec,
    /// Seed for sampling runs; random if omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Clip train and test values to at most this value
    #[arg(long)]
    max_value: Option<f64>,
    /// How to aggregate pseudo-runs at each time step (mean or median)
    #[arg(long, default_value_t = Aggregation::Median)]
    aggregation: Aggregation,
    /// Experiments summarized from their test values without bootstrapping
    #[arg(long = "raw", value_name = "NAME")]
    raw: Vec<String>,
    #[clap(flatten)]
    merger: MergerArg,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Experiments as `<NAME> <FILE>.csv...`, repeated; files hold time, train and test columns
    #[arg(required = true, num_args = 2..)]
    experiments: Vec<String>,
}

#[derive(Debug, Serialize)]
struct BootstrapSummary {
    name: String,
    bootstrapped: bool,
    #[serde(flatten)]
    curve: SummaryCurve,
}

pub(crate) fn run(arg: &BootstrapArg) -> anyhow::Result<()> {
    let aggregator = Aggregator::new(arg.aggregation);
    aggregator.validate()?;
    let config = BootstrapConfig {
        repetitions: arg.bootstrap.repetitions,
        sample_size: arg.bootstrap.sample_size,
        max_value: arg.max_value,
    };
    let mut rng = match arg.seed {
        Some(seed) => Pcg64::seed_from_u64(seed),
        None => Pcg64::from_os_rng(),
    };

    let mut summaries = vec![];
    for experiment in util::group_experiment_args(&arg.experiments, 1)? {
        let name = experiment.name().to_owned();
        let mut runs = vec![];
        for path in &experiment.files {
            let run = util::read_validation_file(path)?;
            if run.times.is_empty() {
                log::warn!("Found empty file {}", path.display());
                continue;
            }
            runs.push(run);
        }

        let bootstrapped = !arg.raw.contains(&name);
        let trajectory = if bootstrapped {
            log::info!(
                "{name}: drawing {} best-of-{} pseudo-run(s) from {} run(s)",
                config.repetitions,
                config.sample_size,
                runs.len()
            );
            bootstrap::best_of_train(&runs, &config, &mut rng)
                .with_context(|| format!("Failed to bootstrap {name}"))?
        } else {
            let test_runs = runs
                .into_iter()
                .map(|run| test_run(run, config.max_value))
                .collect::<Vec<_>>();
            arg.merger
                .merger()
                .merge(&test_runs)
                .with_context(|| format!("Failed to merge runs of {name}"))?
        };
        let curve = aggregator
            .aggregate(&trajectory)
            .with_context(|| format!("Failed to aggregate {name}"))?;
        summaries.push(BootstrapSummary {
            name,
            bootstrapped,
            curve,
        });
    }
    Output::save_json(&summaries, arg.output.clone())
}

fn test_run(run: ValidationRun, max_value: Option<f64>) -> Run {
    let values = run
        .test
        .into_iter()
        .map(|value| max_value.map_or(value, |max| value.min(max)))
        .collect();
    Run::new(run.times, values)
}
