//! Run and experiment data structures
//!
//! A [`Run`] is one repetition of an optimization experiment: a sequence of
//! timestamps and the performance observed at each of them. The pair describes
//! a right-continuous step function, where `values[i]` holds on
//! `[times[i], times[i + 1])` and the last value holds forever after.
//!
//! An [`Experiment`] groups the runs of one algorithm or configuration under a
//! common name. Runs of the same experiment need not share timestamps; use
//! [`TrajectoryMerger`](crate::merge::TrajectoryMerger) to align them.

/// One experiment repetition as a step function over time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    /// Elapsed time of each observation, expected to be strictly increasing.
    pub times: Vec<f64>,
    /// Observed performance at each timestamp.
    pub values: Vec<f64>,
}

impl Run {
    #[must_use]
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Self {
        Self { times, values }
    }

    /// Number of timestamps in the run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Evaluates the step function at `time`.
    ///
    /// Returns the value observed at the latest timestamp not after `time`,
    /// or `None` if `time` precedes the first observation. Assumes `times`
    /// is sorted.
    ///
    /// # Examples
    ///
    /// ```
    /// use trajstat_analysis::run::Run;
    ///
    /// let run = Run::new(vec![0.5, 2.5, 3.0], vec![5.0, 4.0, 2.0]);
    /// assert_eq!(run.value_at(0.1), None);
    /// assert_eq!(run.value_at(0.5), Some(5.0));
    /// assert_eq!(run.value_at(2.0), Some(5.0));
    /// assert_eq!(run.value_at(2.5), Some(4.0));
    /// assert_eq!(run.value_at(100.0), Some(2.0));
    /// ```
    #[must_use]
    pub fn value_at(&self, time: f64) -> Option<f64> {
        let idx = self.times.partition_point(|&t| t <= time);
        let idx = idx.checked_sub(1)?;
        self.values.get(idx).copied()
    }
}

/// Named collection of runs of one algorithm or configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Experiment {
    pub name: String,
    pub runs: Vec<Run>,
}

impl Experiment {
    #[must_use]
    pub fn new(name: impl Into<String>, runs: Vec<Run>) -> Self {
        Self {
            name: name.into(),
            runs,
        }
    }
}
