//! Bootstrap rank aggregation across datasets
//!
//! Comparing estimators over many datasets by raw performance is misleading
//! when datasets live on different scales. Instead, each estimator is ranked
//! against the others at every time step, and the ranks are averaged.
//!
//! # Algorithm
//!
//! For each dataset that has runs for every estimator:
//!
//! 1. Merge the runs of all estimators onto one time axis.
//! 2. Draw `bootstrap_samples` combinations, picking one run per estimator.
//! 3. At each time step, rank the picked runs' values (rounded to
//!    `round_decimals`), sharing ranks between ties, and average the ranks
//!    over all combinations.
//!
//! The per-dataset rank trajectories are then merged onto a single axis, giving
//! each estimator a datasets × time-steps matrix that can be reduced with
//! [`Aggregator`].

use std::collections::{BTreeMap, BTreeSet};

use log::{info, warn};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg64;
use trajstat_stats::rank::rank_average;

use crate::{
    aggregate::{AggregateError, Aggregation, Aggregator, SummaryCurve},
    merge::{MergeError, TrajectoryMerger},
    run::Run,
};

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum RankError {
    #[display("no estimators to rank")]
    NoEstimators,
    #[display("number of bootstrap samples must be positive")]
    NoBootstrapSamples,
    #[display("no dataset has results for every estimator")]
    NoCompleteDatasets,
    #[display("failed to merge runs of dataset '{dataset}': {source}")]
    MergeDataset { dataset: String, source: MergeError },
    #[display("failed to merge rank trajectories across datasets: {source}")]
    MergeRanks { source: MergeError },
}

/// Runs of every estimator on one dataset, keyed by estimator name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetRuns {
    pub name: String,
    pub estimators: BTreeMap<String, Vec<Run>>,
}

impl DatasetRuns {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            estimators: BTreeMap::new(),
        }
    }

    /// Appends runs to the given estimator.
    pub fn add_runs(&mut self, estimator: impl Into<String>, runs: impl IntoIterator<Item = Run>) {
        self.estimators
            .entry(estimator.into())
            .or_default()
            .extend(runs);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankConfig {
    /// Number of run combinations drawn per dataset.
    pub bootstrap_samples: usize,
    /// Seed of the generator used for every dataset.
    pub seed: u64,
    /// Values are rounded to this many decimals before ranking.
    pub round_decimals: i32,
    /// Merger used per dataset and for combining the rank trajectories.
    pub merger: TrajectoryMerger,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            bootstrap_samples: 500,
            seed: 1,
            round_decimals: 5,
            merger: TrajectoryMerger::default(),
        }
    }
}

/// Average rank of every estimator over time, per dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RankTrajectories {
    /// Estimator names, sorted.
    pub estimators: Vec<String>,
    /// Names of the datasets that were ranked, sorted.
    pub datasets: Vec<String>,
    pub times: Vec<f64>,
    /// `ranks[estimator][dataset][step]`
    pub ranks: Vec<Vec<Vec<f64>>>,
}

impl RankTrajectories {
    /// Averages every estimator's rank over datasets.
    ///
    /// Ranks are summarized by their mean without a dispersion band.
    pub fn summarize(&self) -> Result<Vec<(String, SummaryCurve)>, AggregateError> {
        let aggregator = Aggregator::new(Aggregation::Mean).with_spread_scale(0.0);
        self.estimators
            .iter()
            .zip(&self.ranks)
            .map(|(name, matrix)| {
                let curve = aggregator.aggregate_matrix(&self.times, matrix)?;
                Ok((name.clone(), curve))
            })
            .collect()
    }
}

/// Ranks estimators on every complete dataset and aligns the results.
///
/// Datasets that lack runs for any estimator are skipped with a warning.
pub fn rank_datasets(
    datasets: &[DatasetRuns],
    config: &RankConfig,
) -> Result<RankTrajectories, RankError> {
    if config.bootstrap_samples == 0 {
        return Err(RankError::NoBootstrapSamples);
    }

    let estimators = datasets
        .iter()
        .flat_map(|dataset| dataset.estimators.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    if estimators.is_empty() {
        return Err(RankError::NoEstimators);
    }

    let mut complete = datasets
        .iter()
        .filter(|dataset| {
            let missing = estimators
                .iter()
                .filter(|est| dataset.estimators.get(*est).is_none_or(Vec::is_empty))
                .cloned()
                .collect::<Vec<_>>();
            if !missing.is_empty() {
                warn!(
                    "skipping dataset {}: no runs for {}",
                    dataset.name,
                    missing.join(", ")
                );
            }
            missing.is_empty()
        })
        .collect::<Vec<_>>();
    complete.sort_by(|a, b| a.name.cmp(&b.name));
    if complete.is_empty() {
        return Err(RankError::NoCompleteDatasets);
    }

    let mut rank_runs = Vec::with_capacity(complete.len() * estimators.len());
    for dataset in &complete {
        info!("ranking estimators on dataset {}", dataset.name);
        rank_runs.extend(rank_dataset(dataset, &estimators, config)?);
    }

    let merged = config
        .merger
        .merge(&rank_runs)
        .map_err(|source| RankError::MergeRanks { source })?;
    let (times, mut values) = merged.into_parts();

    // rows are dataset-major, estimator-minor
    let mut ranks = vec![Vec::with_capacity(complete.len()); estimators.len()];
    for (row_index, row) in values.drain(..).enumerate() {
        ranks[row_index % estimators.len()].push(row);
    }

    Ok(RankTrajectories {
        estimators,
        datasets: complete.iter().map(|d| d.name.clone()).collect(),
        times,
        ranks,
    })
}

/// Average rank trajectory of each estimator on one dataset, in `estimators` order.
#[expect(clippy::cast_precision_loss)]
fn rank_dataset(
    dataset: &DatasetRuns,
    estimators: &[String],
    config: &RankConfig,
) -> Result<Vec<Run>, RankError> {
    let mut all_runs = vec![];
    let mut offsets = Vec::with_capacity(estimators.len());
    for est in estimators {
        let runs = &dataset.estimators[est];
        offsets.push((all_runs.len(), runs.len()));
        all_runs.extend(runs.iter().cloned());
    }

    let merged = config
        .merger
        .merge(&all_runs)
        .map_err(|source| RankError::MergeDataset {
            dataset: dataset.name.clone(),
            source,
        })?;

    let mut rng = Pcg64::seed_from_u64(config.seed);
    let combinations = (0..config.bootstrap_samples)
        .map(|_| {
            offsets
                .iter()
                .map(|&(offset, count)| offset + rng.random_range(0..count))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let scale = 10_f64.powi(config.round_decimals);
    let mut sums = vec![vec![0.0; merged.len()]; estimators.len()];
    let mut picked = Vec::with_capacity(estimators.len());
    for step in 0..merged.len() {
        for combination in &combinations {
            picked.clear();
            picked.extend(
                combination
                    .iter()
                    .map(|&row| (merged.values()[row][step] * scale).round() / scale),
            );
            for (sum, rank) in sums.iter_mut().zip(rank_average(&picked)) {
                sum[step] += rank;
            }
        }
    }

    let n = combinations.len() as f64;
    Ok(sums
        .into_iter()
        .map(|mut sum| {
            sum.iter_mut().for_each(|s| *s /= n);
            Run::new(merged.times().to_vec(), sum)
        })
        .collect())
}
