//! Trajectory merging and aggregation for optimization benchmark results
//!
//! This crate turns raw per-run performance traces of an algorithm configurator
//! (or any optimizer) into curves that can be compared and plotted.
//!
//! # Overview
//!
//! ```text
//! per-run (times, values) ──► TrajectoryMerger ──► MergedTrajectory ──► Aggregator ──► SummaryCurve
//! ```
//!
//! 1. **Runs** ([`run::Run`]): one repetition as a step function over time
//! 2. **Merging** ([`merge::TrajectoryMerger`]): align runs on the union of their
//!    timestamps, holding each run's last value, and compact unchanged steps
//! 3. **Aggregation** ([`aggregate::Aggregator`]): per-step mean ± scaled standard
//!    deviation, or median with interquartile band
//!
//! Two analyses build on these steps:
//!
//! - **Ranking** ([`ranking::rank_datasets`]): bootstrap average ranks of
//!   estimators over time, aligned across datasets
//! - **Best-of-train bootstrap** ([`bootstrap::best_of_train`]): test performance
//!   of picking the best of `m` runs by training performance
//!
//! # Example
//!
//! ```
//! use trajstat_analysis::{
//!     aggregate::{Aggregation, Aggregator},
//!     merge::TrajectoryMerger,
//!     run::Run,
//! };
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let runs = vec![
//!     Run::new(vec![0.5, 1.0, 2.0], vec![10.0, 9.0, 8.0]),
//!     Run::new(vec![0.5, 1.5], vec![12.0, 7.0]),
//! ];
//!
//! let merged = TrajectoryMerger::new().merge(&runs)?;
//! let curve = Aggregator::new(Aggregation::Median).aggregate(&merged)?;
//!
//! assert_eq!(curve.times, vec![0.5, 1.0, 1.5, 2.0]);
//! assert_eq!(curve.center, vec![11.0, 10.5, 8.0, 7.5]);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod bootstrap;
pub mod merge;
pub mod ranking;
pub mod run;
