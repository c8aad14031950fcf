use trajstat_analysis::merge::TrajectoryMerger;

/// How CSV files are read
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct InputArg {
    /// Zero-based column holding the performance value
    #[arg(long, default_value_t = 2)]
    pub value_column: usize,
}

/// How runs are aligned on a common time axis
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct MergerArg {
    /// Fill time steps before a run's first observation with this value instead of failing
    #[arg(long)]
    pub fill: Option<f64>,
    /// Keep time steps at which no run changes its value
    #[arg(long)]
    pub no_compact: bool,
}

impl MergerArg {
    pub fn merger(&self) -> TrajectoryMerger {
        let merger = TrajectoryMerger::new().with_compaction(!self.no_compact);
        match self.fill {
            Some(value) => merger.with_fill(value),
            None => merger,
        }
    }
}

#[cfg(test)]
mod tests {
    use trajstat_analysis::merge::MissingValuePolicy;

    use super::*;

    #[test]
    fn test_merger_from_args() {
        let merger = MergerArg {
            fill: None,
            no_compact: false,
        }
        .merger();
        assert_eq!(merger.missing_policy(), MissingValuePolicy::Error);
        assert!(merger.compacts());

        let merger = MergerArg {
            fill: Some(1.0),
            no_compact: true,
        }
        .merger();
        assert_eq!(merger.missing_policy(), MissingValuePolicy::Fill(1.0));
        assert!(!merger.compacts());
    }
}
