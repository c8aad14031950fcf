//! Bootstrapped best-of-train validation performance
//!
//! A common protocol runs a configurator several times and deploys the run with
//! the best training performance. To estimate the test performance of that
//! protocol with `m` parallel runs, pseudo-runs are drawn from the recorded runs:
//! at every time step, `m` runs are sampled with replacement and the test value
//! of the one with the lowest training value is kept.
//!
//! All runs must be recorded on the same time axis.

use rand::Rng;
use trajstat_stats::bootstrap::bootstrap_indices;

use crate::merge::MergedTrajectory;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum BootstrapError {
    #[display("no runs to bootstrap from")]
    NoRuns,
    #[display("repetitions and sample size must be positive")]
    InvalidSampleSize,
    #[display(
        "run {run_index}: {times_len} timestamps, {train_len} train values, {test_len} test values"
    )]
    ShapeMismatch {
        run_index: usize,
        times_len: usize,
        train_len: usize,
        test_len: usize,
    },
    #[display("run {run_index} does not use the same time steps as run 0")]
    TimeAxisMismatch { run_index: usize },
    #[display("time steps must be strictly increasing")]
    UnsortedTimes,
    #[display("run {run_index} has a non-finite value at time {time}")]
    NonFiniteValue { run_index: usize, time: f64 },
}

/// One run with training and test performance recorded at the same timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationRun {
    pub times: Vec<f64>,
    pub train: Vec<f64>,
    pub test: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapConfig {
    /// Number of pseudo-runs to produce.
    pub repetitions: usize,
    /// Number of runs drawn for each pseudo-run value.
    pub sample_size: usize,
    /// Values above this are replaced by it before sampling.
    pub max_value: Option<f64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            repetitions: 10,
            sample_size: 8,
            max_value: None,
        }
    }
}

/// Draws `config.repetitions` best-of-train pseudo-runs.
///
/// The result has one row per pseudo-run on the shared time axis of `runs`.
pub fn best_of_train<R>(
    runs: &[ValidationRun],
    config: &BootstrapConfig,
    rng: &mut R,
) -> Result<MergedTrajectory, BootstrapError>
where
    R: Rng + ?Sized,
{
    let Some(first) = runs.first() else {
        return Err(BootstrapError::NoRuns);
    };
    if config.repetitions == 0 || config.sample_size == 0 {
        return Err(BootstrapError::InvalidSampleSize);
    }
    for (run_index, run) in runs.iter().enumerate() {
        if run.train.len() != run.times.len() || run.test.len() != run.times.len() {
            return Err(BootstrapError::ShapeMismatch {
                run_index,
                times_len: run.times.len(),
                train_len: run.train.len(),
                test_len: run.test.len(),
            });
        }
        if run.times != first.times {
            return Err(BootstrapError::TimeAxisMismatch { run_index });
        }
        if let Some(step) =
            (0..run.times.len()).find(|&i| !run.train[i].is_finite() || !run.test[i].is_finite())
        {
            return Err(BootstrapError::NonFiniteValue {
                run_index,
                time: run.times[step],
            });
        }
    }
    if !first.times.is_sorted_by(|a, b| a < b) {
        return Err(BootstrapError::UnsortedTimes);
    }

    let clip = |value: f64| config.max_value.map_or(value, |max| value.min(max));
    let num_steps = first.times.len();
    let mut pseudo_runs = vec![Vec::with_capacity(num_steps); config.repetitions];
    for step in 0..num_steps {
        for pseudo_run in &mut pseudo_runs {
            let sample = bootstrap_indices(rng, runs.len(), config.sample_size)
                .ok_or(BootstrapError::NoRuns)?;
            // first minimum wins
            let best = sample
                .iter()
                .copied()
                .reduce(|best, idx| {
                    if clip(runs[idx].train[step]) < clip(runs[best].train[step]) {
                        idx
                    } else {
                        best
                    }
                })
                .ok_or(BootstrapError::InvalidSampleSize)?;
            pseudo_run.push(clip(runs[best].test[step]));
        }
    }

    Ok(MergedTrajectory::from_parts(first.times.clone(), pseudo_runs))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    #[expect(clippy::cast_precision_loss)]
    fn run(train: &[f64], test: &[f64]) -> ValidationRun {
        ValidationRun {
            times: (0..train.len()).map(|i| i as f64).collect(),
            train: train.to_vec(),
            test: test.to_vec(),
        }
    }

    #[test]
    fn test_single_run_is_repeated() {
        let runs = [run(&[3.0, 2.0], &[5.0, 4.0])];
        let mut rng = Pcg64::seed_from_u64(0);
        let result = best_of_train(&runs, &BootstrapConfig::default(), &mut rng).unwrap();
        assert_eq!(result.num_runs(), 10);
        assert!(result.values().iter().all(|row| row == &[5.0, 4.0]));
    }

    #[test]
    fn test_large_sample_picks_best_train() {
        let runs = [run(&[1.0], &[10.0]), run(&[2.0], &[20.0])];
        let config = BootstrapConfig {
            repetitions: 5,
            sample_size: 64,
            max_value: None,
        };
        let mut rng = Pcg64::seed_from_u64(1);
        let result = best_of_train(&runs, &config, &mut rng).unwrap();
        assert!(result.column(0).all(|v| v == 10.0));
    }

    #[test]
    fn test_values_are_clipped() {
        let runs = [run(&[1.0], &[1e9])];
        let config = BootstrapConfig {
            max_value: Some(100.0),
            ..BootstrapConfig::default()
        };
        let mut rng = Pcg64::seed_from_u64(1);
        let result = best_of_train(&runs, &config, &mut rng).unwrap();
        assert!(result.column(0).all(|v| v == 100.0));
    }

    #[test]
    fn test_time_axis_must_match() {
        let mut other = run(&[1.0, 2.0], &[1.0, 2.0]);
        other.times[1] = 5.0;
        let runs = [run(&[1.0, 2.0], &[1.0, 2.0]), other];
        let mut rng = Pcg64::seed_from_u64(1);
        assert_eq!(
            best_of_train(&runs, &BootstrapConfig::default(), &mut rng),
            Err(BootstrapError::TimeAxisMismatch { run_index: 1 })
        );
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let mut rng = Pcg64::seed_from_u64(1);
        let nan_test = run(&[1.0, 2.0], &[3.0, f64::NAN]);
        assert_eq!(
            best_of_train(&[nan_test], &BootstrapConfig::default(), &mut rng),
            Err(BootstrapError::NonFiniteValue {
                run_index: 0,
                time: 1.0,
            })
        );

        let nan_train = run(&[f64::NAN], &[1.0]);
        assert_eq!(
            best_of_train(
                &[run(&[1.0], &[1.0]), nan_train],
                &BootstrapConfig::default(),
                &mut rng
            ),
            Err(BootstrapError::NonFiniteValue {
                run_index: 1,
                time: 0.0,
            })
        );
    }

    #[test]
    fn test_invalid_inputs() {
        let mut rng = Pcg64::seed_from_u64(1);
        assert_eq!(
            best_of_train(&[], &BootstrapConfig::default(), &mut rng),
            Err(BootstrapError::NoRuns)
        );
        let config = BootstrapConfig {
            sample_size: 0,
            ..BootstrapConfig::default()
        };
        assert_eq!(
            best_of_train(&[run(&[1.0], &[1.0])], &config, &mut rng),
            Err(BootstrapError::InvalidSampleSize)
        );
        let broken = ValidationRun {
            times: vec![0.0],
            train: vec![],
            test: vec![1.0],
        };
        assert!(matches!(
            best_of_train(&[broken], &BootstrapConfig::default(), &mut rng),
            Err(BootstrapError::ShapeMismatch { run_index: 0, .. })
        ));
        let unsorted = ValidationRun {
            times: vec![1.0, 0.0],
            train: vec![1.0, 1.0],
            test: vec![1.0, 1.0],
        };
        assert_eq!(
            best_of_train(&[unsorted], &BootstrapConfig::default(), &mut rng),
            Err(BootstrapError::UnsortedTimes)
        );
    }
}
