//! Per-time-step summary statistics over aligned runs
//!
//! Given runs aligned on one time axis (see [`crate::merge`]), [`Aggregator`]
//! reduces each time step to a central value and a dispersion band:
//!
//! - [`Aggregation::Mean`]: mean ± `spread_scale` × population standard deviation
//! - [`Aggregation::Median`]: median with the 25th and 75th percentiles as band
//!
//! An optional log floor clamps all three curves from below so they can be drawn
//! on a logarithmic axis.
//!
//! # Example
//!
//! ```
//! use trajstat_analysis::aggregate::{Aggregation, Aggregator};
//!
//! let curve = Aggregator::new(Aggregation::Mean)
//!     .aggregate_matrix(&[1.0], &[vec![4.0], vec![6.0]])
//!     .unwrap();
//! assert_eq!(curve.center, vec![5.0]);
//! assert_eq!(curve.lower, vec![4.0]);
//! assert_eq!(curve.upper, vec![6.0]);
//! ```

use std::str::FromStr;

use serde::Serialize;
use trajstat_stats::{descriptive::DescriptiveStats, percentiles::compute_percentile};

use crate::merge::MergedTrajectory;

pub const DEFAULT_SPREAD_SCALE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum AggregateError {
    #[display("unknown aggregation: {name}")]
    UnsupportedAggregation { name: String },
    #[display("invalid aggregation configuration: {reason}")]
    InvalidConfiguration { reason: String },
    #[display("no runs to aggregate")]
    NoRuns,
    #[display("run {run_index} has {actual} values but the time axis has {expected}")]
    RowLengthMismatch {
        run_index: usize,
        expected: usize,
        actual: usize,
    },
    #[display("run {run_index} has a non-finite value at time step {step}")]
    NonFiniteValue { run_index: usize, step: usize },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    #[display("mean")]
    Mean,
    #[display("median")]
    Median,
}

impl FromStr for Aggregation {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            _ => Err(AggregateError::UnsupportedAggregation {
                name: s.to_owned(),
            }),
        }
    }
}

/// Central tendency and dispersion band of one experiment over time.
///
/// All four sequences have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCurve {
    pub method: Aggregation,
    /// Number of runs the curve was computed from.
    pub num_runs: usize,
    pub times: Vec<f64>,
    pub center: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl SummaryCurve {
    /// Whether the band carries information worth drawing.
    ///
    /// A single run has no dispersion, so its band collapses onto the center.
    #[must_use]
    pub fn has_band(&self) -> bool {
        self.num_runs > 1
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregator {
    method: Aggregation,
    spread_scale: f64,
    log_floor: Option<f64>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(Aggregation::default())
    }
}

impl Aggregator {
    #[must_use]
    pub fn new(method: Aggregation) -> Self {
        Self {
            method,
            spread_scale: DEFAULT_SPREAD_SCALE,
            log_floor: None,
        }
    }

    /// Multiplier of the standard deviation in mean mode.
    ///
    /// Must be non-negative, and must stay at [`DEFAULT_SPREAD_SCALE`] in median mode.
    #[must_use]
    pub fn with_spread_scale(mut self, spread_scale: f64) -> Self {
        self.spread_scale = spread_scale;
        self
    }

    /// Lower bound applied to center, lower and upper curves.
    #[must_use]
    pub fn with_log_floor(mut self, log_floor: Option<f64>) -> Self {
        self.log_floor = log_floor;
        self
    }

    #[must_use]
    pub fn method(&self) -> Aggregation {
        self.method
    }

    #[must_use]
    pub fn spread_scale(&self) -> f64 {
        self.spread_scale
    }

    #[must_use]
    pub fn log_floor(&self) -> Option<f64> {
        self.log_floor
    }

    pub fn validate(&self) -> Result<(), AggregateError> {
        if !self.spread_scale.is_finite() || self.spread_scale < 0.0 {
            return Err(AggregateError::InvalidConfiguration {
                reason: format!(
                    "spread scale must be a non-negative number, got {}",
                    self.spread_scale
                ),
            });
        }
        if self.method == Aggregation::Median
            && (self.spread_scale - DEFAULT_SPREAD_SCALE).abs() > f64::EPSILON
        {
            return Err(AggregateError::InvalidConfiguration {
                reason: "cannot scale the spread when aggregating with the median".to_owned(),
            });
        }
        if let Some(floor) = self.log_floor.filter(|floor| !floor.is_finite()) {
            return Err(AggregateError::InvalidConfiguration {
                reason: format!("log floor must be finite, got {floor}"),
            });
        }
        Ok(())
    }

    pub fn aggregate(&self, trajectory: &MergedTrajectory) -> Result<SummaryCurve, AggregateError> {
        self.aggregate_matrix(trajectory.times(), trajectory.values())
    }

    /// Aggregates a runs × time-steps matrix aligned to `times`.
    pub fn aggregate_matrix(
        &self,
        times: &[f64],
        matrix: &[Vec<f64>],
    ) -> Result<SummaryCurve, AggregateError> {
        self.validate()?;
        if matrix.is_empty() {
            return Err(AggregateError::NoRuns);
        }
        if let Some((run_index, row)) = matrix
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != times.len())
        {
            return Err(AggregateError::RowLengthMismatch {
                run_index,
                expected: times.len(),
                actual: row.len(),
            });
        }
        for (run_index, row) in matrix.iter().enumerate() {
            if let Some(step) = row.iter().position(|v| !v.is_finite()) {
                return Err(AggregateError::NonFiniteValue { run_index, step });
            }
        }

        let mut center = Vec::with_capacity(times.len());
        let mut lower = Vec::with_capacity(times.len());
        let mut upper = Vec::with_capacity(times.len());
        let mut column = Vec::with_capacity(matrix.len());
        for i in 0..times.len() {
            column.clear();
            column.extend(matrix.iter().map(|row| row[i]));
            column.sort_by(f64::total_cmp);

            let (c, l, u) = match self.method {
                Aggregation::Mean => {
                    let stats =
                        DescriptiveStats::from_sorted(&column).ok_or(AggregateError::NoRuns)?;
                    let spread = stats.std_dev * self.spread_scale;
                    (stats.mean, stats.mean - spread, stats.mean + spread)
                }
                Aggregation::Median => (
                    compute_percentile(&column, 50.0),
                    compute_percentile(&column, 25.0),
                    compute_percentile(&column, 75.0),
                ),
            };
            center.push(c);
            lower.push(l);
            upper.push(u);
        }

        if let Some(floor) = self.log_floor {
            for value in center.iter_mut().chain(&mut lower).chain(&mut upper) {
                *value = value.max(floor);
            }
        }

        Ok(SummaryCurve {
            method: self.method,
            num_runs: matrix.len(),
            times: times.to_vec(),
            center,
            lower,
            upper,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aggregation() {
        assert_eq!("mean".parse::<Aggregation>(), Ok(Aggregation::Mean));
        assert_eq!("Median".parse::<Aggregation>(), Ok(Aggregation::Median));
        assert_eq!(
            "mode".parse::<Aggregation>(),
            Err(AggregateError::UnsupportedAggregation {
                name: "mode".to_owned(),
            })
        );
        assert_eq!(Aggregation::Median.to_string(), "median");
    }

    #[test]
    fn test_mean_band() {
        let curve = Aggregator::new(Aggregation::Mean)
            .aggregate_matrix(&[1.0], &[vec![4.0], vec![6.0]])
            .unwrap();
        assert_eq!(curve.center, vec![5.0]);
        assert_eq!(curve.lower, vec![4.0]);
        assert_eq!(curve.upper, vec![6.0]);
        assert!(curve.has_band());
    }

    #[test]
    fn test_scaled_mean_band() {
        let curve = Aggregator::new(Aggregation::Mean)
            .with_spread_scale(2.0)
            .aggregate_matrix(&[0.0, 1.0], &[vec![4.0, 1.0], vec![6.0, 1.0]])
            .unwrap();
        assert_eq!(curve.lower, vec![3.0, 1.0]);
        assert_eq!(curve.upper, vec![7.0, 1.0]);
    }

    #[test]
    fn test_single_run_collapses_band() {
        for method in [Aggregation::Mean, Aggregation::Median] {
            let curve = Aggregator::new(method)
                .aggregate_matrix(&[0.0, 1.0], &[vec![3.0, 2.0]])
                .unwrap();
            assert_eq!(curve.center, vec![3.0, 2.0]);
            assert_eq!(curve.lower, curve.center);
            assert_eq!(curve.upper, curve.center);
            assert!(!curve.has_band());
        }
    }

    #[test]
    fn test_median_quartiles() {
        let matrix = [vec![1.0], vec![2.0], vec![3.0], vec![4.0], vec![5.0]];
        let curve = Aggregator::new(Aggregation::Median)
            .aggregate_matrix(&[0.0], &matrix)
            .unwrap();
        assert_eq!(curve.center, vec![3.0]);
        assert_eq!(curve.lower, vec![2.0]);
        assert_eq!(curve.upper, vec![4.0]);
    }

    #[test]
    fn test_median_rejects_spread_scale() {
        let err = Aggregator::new(Aggregation::Median)
            .with_spread_scale(2.0)
            .aggregate_matrix(&[0.0], &[vec![1.0]])
            .unwrap_err();
        assert!(matches!(err, AggregateError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_negative_spread_scale() {
        let err = Aggregator::new(Aggregation::Mean)
            .with_spread_scale(-1.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AggregateError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_log_floor_clamps_all_curves() {
        let curve = Aggregator::new(Aggregation::Mean)
            .with_log_floor(Some(1e-4))
            .aggregate_matrix(&[0.0, 1.0], &[vec![-1.0, 2.0], vec![1.0, 4.0]])
            .unwrap();
        assert_eq!(curve.center, vec![1e-4, 3.0]);
        assert_eq!(curve.lower, vec![1e-4, 2.0]);
        assert_eq!(curve.upper, vec![1.0, 4.0]);
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        for method in [Aggregation::Mean, Aggregation::Median] {
            let aggregator = Aggregator::new(method);
            assert_eq!(
                aggregator.aggregate_matrix(&[0.0], &[vec![1.0], vec![f64::NAN]]),
                Err(AggregateError::NonFiniteValue {
                    run_index: 1,
                    step: 0,
                })
            );
            assert_eq!(
                aggregator.aggregate_matrix(&[0.0, 1.0], &[vec![1.0, f64::INFINITY]]),
                Err(AggregateError::NonFiniteValue {
                    run_index: 0,
                    step: 1,
                })
            );
        }
    }

    #[test]
    fn test_matrix_shape_errors() {
        let aggregator = Aggregator::default();
        assert_eq!(
            aggregator.aggregate_matrix(&[0.0], &[]),
            Err(AggregateError::NoRuns)
        );
        assert_eq!(
            aggregator.aggregate_matrix(&[0.0, 1.0], &[vec![1.0, 2.0], vec![1.0]]),
            Err(AggregateError::RowLengthMismatch {
                run_index: 1,
                expected: 2,
                actual: 1,
            })
        );
    }
}
