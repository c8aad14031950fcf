//! Statistical utilities for trajectory analysis.
//!
//! This crate provides the small set of statistics the trajectory tools need:
//!
//! - **Descriptive statistics**: mean, median, population variance and standard deviation
//! - **Percentiles**: linearly interpolated percentile values for a dataset
//! - **Ranking**: average ranks with tie handling
//! - **Bootstrap**: resampling indices drawn from an explicit random generator
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Linearly interpolated percentiles
//! - [`rank`]: Average ranking of observations
//! - [`bootstrap`]: Bootstrap resampling indices
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use trajstat_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Computing percentiles
//!
//! ```
//! use trajstat_stats::percentiles::compute_percentile;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! assert_eq!(compute_percentile(&values, 50.0), 3.0);
//! assert_eq!(compute_percentile(&values, 75.0), 4.0);
//! ```
//!
//! ## Ranking observations
//!
//! ```
//! use trajstat_stats::rank::rank_average;
//!
//! assert_eq!(rank_average(&[0.3, 0.1, 0.3]), vec![2.5, 1.0, 2.5]);
//! ```
//!
//! ## Drawing bootstrap indices
//!
//! ```
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg64;
//! use trajstat_stats::bootstrap::bootstrap_indices;
//!
//! let mut rng = Pcg64::seed_from_u64(1);
//! let indices = bootstrap_indices(&mut rng, 4, 8).unwrap();
//! assert_eq!(indices.len(), 8);
//! assert!(indices.iter().all(|&i| i < 4));
//! ```

pub mod bootstrap;
pub mod descriptive;
pub mod percentiles;
pub mod rank;
