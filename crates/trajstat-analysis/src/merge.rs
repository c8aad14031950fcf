//! Alignment of irregularly sampled runs onto a shared time axis
//!
//! Runs of an experiment are recorded independently, so their timestamps rarely
//! coincide. [`TrajectoryMerger`] builds the sorted, deduplicated union of all
//! timestamps and evaluates every run's step function on that axis, holding the
//! last observed value until the run reports a new one.
//!
//! # Missing values
//!
//! A run has no value at axis points before its first timestamp. By default this
//! is an error ([`MergeError::IncompleteData`]); with
//! [`MissingValuePolicy::Fill`] the undefined cells take a caller-supplied value.
//!
//! # Compaction
//!
//! The raw union axis contains many points where no run changes. Compaction keeps
//! only the first and last points and the points where at least one run's value
//! differs from the previous point. It is enabled by default and can be applied
//! separately with [`MergedTrajectory::compacted`].
//!
//! # Example
//!
//! ```
//! use trajstat_analysis::{merge::TrajectoryMerger, run::Run};
//!
//! let runs = [
//!     Run::new(vec![0.5, 1.0, 2.0, 3.0, 4.0], vec![10.0, 9.0, 8.0, 7.0, 6.0]),
//!     Run::new(vec![0.5, 2.5, 3.0], vec![5.0, 4.0, 2.0]),
//! ];
//! let merged = TrajectoryMerger::new().merge(&runs).unwrap();
//!
//! assert_eq!(merged.times(), &[0.5, 1.0, 2.0, 2.5, 3.0, 4.0]);
//! assert_eq!(merged.run_values(0), Some(&[10.0, 9.0, 8.0, 8.0, 7.0, 6.0][..]));
//! assert_eq!(merged.run_values(1), Some(&[5.0, 5.0, 5.0, 4.0, 2.0, 2.0][..]));
//! ```

use log::{debug, warn};
use serde::Serialize;

use crate::run::Run;

/// How to treat axis points that precede a run's first timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum MissingValuePolicy {
    /// Fail the merge with [`MergeError::IncompleteData`].
    #[default]
    Error,
    /// Use the given value for every undefined cell.
    Fill(f64),
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum MergeError {
    #[display("no runs to merge")]
    NoRuns,
    #[display(
        "run {run_index}: array length mismatch: {times_len} timestamps != {values_len} values"
    )]
    LengthMismatch {
        run_index: usize,
        times_len: usize,
        values_len: usize,
    },
    #[display("run {run_index} has no samples")]
    EmptyRun { run_index: usize },
    #[display("run {run_index}: timestamp at position {position} is not finite")]
    NonFiniteTime { run_index: usize, position: usize },
    #[display(
        "run {run_index} has no value at time {time}: runs do not start at the same time and no fill value is set"
    )]
    IncompleteData { run_index: usize, time: f64 },
    #[display("run {run_index} has a non-finite value at time {time}")]
    NonFiniteValue { run_index: usize, time: f64 },
}

/// Runs aligned on a common time axis.
///
/// `values()[r][i]` is the value of run `r` at `times()[i]`. The axis is
/// strictly increasing and every row has the same length as the axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedTrajectory {
    times: Vec<f64>,
    values: Vec<Vec<f64>>,
}

impl MergedTrajectory {
    pub(crate) fn from_parts(times: Vec<f64>, values: Vec<Vec<f64>>) -> Self {
        debug_assert!(times.is_sorted_by(|a, b| a < b));
        debug_assert!(values.iter().all(|row| row.len() == times.len()));
        Self { times, values }
    }

    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Aligned values, one row per run.
    #[must_use]
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    #[must_use]
    pub fn run_values(&self, run_index: usize) -> Option<&[f64]> {
        self.values.get(run_index).map(Vec::as_slice)
    }

    /// Returns one aligned run as a standalone [`Run`].
    #[must_use]
    pub fn run(&self, run_index: usize) -> Option<Run> {
        let values = self.values.get(run_index)?;
        Some(Run::new(self.times.clone(), values.clone()))
    }

    /// Values of every run at axis index `index`.
    pub fn column(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().map(move |row| row[index])
    }

    #[must_use]
    pub fn num_runs(&self) -> usize {
        self.values.len()
    }

    /// Number of points on the time axis.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Drops axis points where no run's value changed.
    ///
    /// The first and last points are always kept. Compacting twice gives the
    /// same result as compacting once.
    #[must_use]
    pub fn compacted(&self) -> Self {
        let last = self.times.len().saturating_sub(1);
        let keep = (0..self.times.len())
            .filter(|&i| {
                i == 0 || i == last || self.values.iter().any(|row| row[i] != row[i - 1])
            })
            .collect::<Vec<_>>();

        let times = keep.iter().map(|&i| self.times[i]).collect();
        let values = self
            .values
            .iter()
            .map(|row| keep.iter().map(|&i| row[i]).collect())
            .collect();
        Self { times, values }
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<f64>, Vec<Vec<f64>>) {
        (self.times, self.values)
    }
}

/// Aligns runs onto the union of their timestamps with step-hold semantics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryMerger {
    on_missing: MissingValuePolicy,
    compact: bool,
}

impl Default for TrajectoryMerger {
    fn default() -> Self {
        Self {
            on_missing: MissingValuePolicy::Error,
            compact: true,
        }
    }
}

impl TrajectoryMerger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills undefined cells with `value` instead of failing.
    #[must_use]
    pub fn with_fill(self, value: f64) -> Self {
        self.with_missing_policy(MissingValuePolicy::Fill(value))
    }

    #[must_use]
    pub fn with_missing_policy(mut self, on_missing: MissingValuePolicy) -> Self {
        self.on_missing = on_missing;
        self
    }

    #[must_use]
    pub fn with_compaction(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    #[must_use]
    pub fn missing_policy(&self) -> MissingValuePolicy {
        self.on_missing
    }

    #[must_use]
    pub fn compacts(&self) -> bool {
        self.compact
    }

    /// Merges `runs` onto one time axis.
    ///
    /// Every run must have as many values as timestamps. Empty runs are only
    /// accepted with a fill value, in which case their whole row is filled.
    /// Out-of-order samples are sorted and, for repeated timestamps, the last
    /// sample wins; both are reported as warnings.
    pub fn merge(&self, runs: &[Run]) -> Result<MergedTrajectory, MergeError> {
        if runs.is_empty() {
            return Err(MergeError::NoRuns);
        }

        let mut samples = Vec::with_capacity(runs.len());
        for (run_index, run) in runs.iter().enumerate() {
            samples.push(self.normalize_run(run_index, run)?);
        }

        let mut times = samples
            .iter()
            .flat_map(|run| run.iter().map(|&(t, _)| t))
            .collect::<Vec<_>>();
        times.sort_by(f64::total_cmp);
        times.dedup();

        let values = samples
            .iter()
            .enumerate()
            .map(|(run_index, run)| self.forward_fill(run_index, run, &times))
            .collect::<Result<Vec<_>, _>>()?;

        let merged = MergedTrajectory::from_parts(times, values);
        if !self.compact {
            debug!(
                "merged {} runs onto {} time steps",
                merged.num_runs(),
                merged.len()
            );
            return Ok(merged);
        }

        let compacted = merged.compacted();
        debug!(
            "merged {} runs onto {} time steps ({} after compaction)",
            merged.num_runs(),
            merged.len(),
            compacted.len()
        );
        Ok(compacted)
    }

    /// Validates one run and returns its samples sorted by time without duplicates.
    fn normalize_run(&self, run_index: usize, run: &Run) -> Result<Vec<(f64, f64)>, MergeError> {
        if run.times.len() != run.values.len() {
            return Err(MergeError::LengthMismatch {
                run_index,
                times_len: run.times.len(),
                values_len: run.values.len(),
            });
        }
        if run.is_empty() && self.on_missing == MissingValuePolicy::Error {
            return Err(MergeError::EmptyRun { run_index });
        }
        if let Some(position) = run.times.iter().position(|t| !t.is_finite()) {
            return Err(MergeError::NonFiniteTime {
                run_index,
                position,
            });
        }

        let negative = run.times.iter().filter(|&&t| t < 0.0).count();
        if negative > 0 {
            warn!("run {run_index}: found {negative} time stamp(s) < 0");
        }

        let mut samples = run
            .times
            .iter()
            .copied()
            .zip(run.values.iter().copied())
            .collect::<Vec<_>>();
        if !samples.is_sorted_by(|a, b| a.0 <= b.0) {
            warn!("run {run_index}: time stamps are not sorted, sorting them");
            samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        }

        let before = samples.len();
        samples.dedup_by(|later, earlier| {
            if later.0 == earlier.0 {
                *earlier = *later;
                true
            } else {
                false
            }
        });
        if samples.len() < before {
            warn!(
                "run {run_index}: dropped {} sample(s) with duplicated time stamps",
                before - samples.len()
            );
        }

        Ok(samples)
    }

    fn forward_fill(
        &self,
        run_index: usize,
        samples: &[(f64, f64)],
        times: &[f64],
    ) -> Result<Vec<f64>, MergeError> {
        let mut row = Vec::with_capacity(times.len());
        let mut next = 0;
        for &time in times {
            while next < samples.len() && samples[next].0 <= time {
                next += 1;
            }
            let value = match next.checked_sub(1) {
                Some(idx) => {
                    let value = samples[idx].1;
                    if !value.is_finite() {
                        return Err(MergeError::NonFiniteValue { run_index, time });
                    }
                    value
                }
                None => match self.on_missing {
                    MissingValuePolicy::Fill(value) if value.is_finite() => value,
                    _ => return Err(MergeError::IncompleteData { run_index, time }),
                },
            };
            row.push(value);
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(times: &[f64], values: &[f64]) -> Run {
        Run::new(times.to_vec(), values.to_vec())
    }

    #[test]
    fn test_no_runs() {
        assert_eq!(TrajectoryMerger::new().merge(&[]), Err(MergeError::NoRuns));
    }

    #[test]
    fn test_length_mismatch_names_run() {
        let runs = [run(&[100.0], &[5.0]), run(&[0.5, 2.0], &[10.0])];
        let err = TrajectoryMerger::new().merge(&runs).unwrap_err();
        assert_eq!(
            err,
            MergeError::LengthMismatch {
                run_index: 1,
                times_len: 2,
                values_len: 1,
            }
        );
        assert!(err.to_string().contains("array length mismatch"));
    }

    #[test]
    fn test_empty_run_without_fill() {
        let runs = [run(&[], &[]), run(&[0.5, 2.5, 3.0], &[5.0, 4.0, 2.0])];
        let err = TrajectoryMerger::new().merge(&runs).unwrap_err();
        assert_eq!(err, MergeError::EmptyRun { run_index: 0 });
    }

    #[test]
    fn test_empty_run_with_fill() {
        let runs = [run(&[], &[]), run(&[0.5, 2.5], &[5.0, 4.0])];
        let merged = TrajectoryMerger::new().with_fill(1.0).merge(&runs).unwrap();
        assert_eq!(merged.times(), &[0.5, 2.5]);
        assert_eq!(merged.values(), &[vec![1.0, 1.0], vec![5.0, 4.0]]);
    }

    #[test]
    fn test_single_samples_need_fill() {
        let runs = [run(&[0.5], &[10.0]), run(&[100.0], &[5.0])];
        let err = TrajectoryMerger::new().merge(&runs).unwrap_err();
        assert_eq!(
            err,
            MergeError::IncompleteData {
                run_index: 1,
                time: 0.5,
            }
        );

        let merged = TrajectoryMerger::new().with_fill(1.0).merge(&runs).unwrap();
        assert_eq!(merged.times(), &[0.5, 100.0]);
        assert_eq!(merged.values(), &[vec![10.0, 10.0], vec![1.0, 5.0]]);
    }

    #[test]
    fn test_non_finite_fill_is_not_a_fill() {
        let runs = [run(&[0.0], &[1.0]), run(&[1.0], &[2.0])];
        let err = TrajectoryMerger::new()
            .with_fill(f64::NAN)
            .merge(&runs)
            .unwrap_err();
        assert!(matches!(err, MergeError::IncompleteData { run_index: 1, .. }));
    }

    #[test]
    fn test_non_finite_inputs() {
        let runs = [run(&[0.0, f64::NAN], &[1.0, 2.0])];
        assert_eq!(
            TrajectoryMerger::new().merge(&runs),
            Err(MergeError::NonFiniteTime {
                run_index: 0,
                position: 1,
            })
        );

        let runs = [run(&[0.0, 1.0], &[1.0, f64::INFINITY])];
        assert_eq!(
            TrajectoryMerger::new().merge(&runs),
            Err(MergeError::NonFiniteValue {
                run_index: 0,
                time: 1.0,
            })
        );
    }

    #[test]
    fn test_unsorted_and_duplicated_timestamps() {
        let runs = [run(&[2.0, 0.0, 1.0, 1.0], &[3.0, 9.0, 7.0, 5.0])];
        let merged = TrajectoryMerger::new()
            .with_compaction(false)
            .merge(&runs)
            .unwrap();
        assert_eq!(merged.times(), &[0.0, 1.0, 2.0]);
        assert_eq!(merged.values(), &[vec![9.0, 5.0, 3.0]]);
    }

    #[test]
    fn test_compaction_drops_unchanged_points() {
        let runs = [
            run(&[0.0, 1.0, 2.0, 3.0], &[5.0, 5.0, 4.0, 4.0]),
            run(&[0.0, 1.5], &[1.0, 1.0]),
        ];
        let raw = TrajectoryMerger::new()
            .with_compaction(false)
            .merge(&runs)
            .unwrap();
        assert_eq!(raw.times(), &[0.0, 1.0, 1.5, 2.0, 3.0]);

        let compacted = TrajectoryMerger::new().merge(&runs).unwrap();
        assert_eq!(compacted.times(), &[0.0, 2.0, 3.0]);
        assert_eq!(compacted.values(), &[vec![5.0, 4.0, 4.0], vec![1.0, 1.0, 1.0]]);
        assert_eq!(compacted, raw.compacted());
    }

    #[test]
    fn test_compaction_of_single_point() {
        let runs = [run(&[3.0], &[1.0])];
        let merged = TrajectoryMerger::new().merge(&runs).unwrap();
        assert_eq!(merged.times(), &[3.0]);
        assert_eq!(merged.run(0), Some(runs[0].clone()));
    }
}
