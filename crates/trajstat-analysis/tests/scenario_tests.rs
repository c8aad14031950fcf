//! End-to-end scenarios for merging and aggregating benchmark runs

use trajstat_analysis::{
    aggregate::{AggregateError, Aggregation, Aggregator},
    merge::{MergeError, MissingValuePolicy, TrajectoryMerger},
    run::Run,
};

fn run_a() -> Run {
    Run::new(vec![0.5, 1.0, 2.0, 3.0, 4.0], vec![10.0, 9.0, 8.0, 7.0, 6.0])
}

#[test]
fn merge_overlapping_runs() {
    let run_b = Run::new(vec![0.5, 2.5, 3.0], vec![5.0, 4.0, 2.0]);
    let merged = TrajectoryMerger::new().merge(&[run_a(), run_b]).unwrap();

    assert_eq!(merged.times(), &[0.5, 1.0, 2.0, 2.5, 3.0, 4.0]);
    assert_eq!(
        merged.run_values(0).unwrap(),
        &[10.0, 9.0, 8.0, 8.0, 7.0, 6.0]
    );
    assert_eq!(merged.run_values(1).unwrap(), &[5.0, 5.0, 5.0, 4.0, 2.0, 2.0]);
}

#[test]
fn merge_non_overlapping_runs_requires_fill() {
    let run_b = Run::new(vec![100.0, 110.0, 111.0], vec![5.0, 4.0, 2.0]);
    let runs = [run_a(), run_b];

    let err = TrajectoryMerger::new().merge(&runs).unwrap_err();
    assert!(matches!(err, MergeError::IncompleteData { run_index: 1, .. }));

    let merged = TrajectoryMerger::new()
        .with_missing_policy(MissingValuePolicy::Fill(1.0))
        .merge(&runs)
        .unwrap();
    assert_eq!(
        merged.times(),
        &[0.5, 1.0, 2.0, 3.0, 4.0, 100.0, 110.0, 111.0]
    );
    assert_eq!(
        merged.run_values(0).unwrap(),
        &[10.0, 9.0, 8.0, 7.0, 6.0, 6.0, 6.0, 6.0]
    );
    assert_eq!(
        merged.run_values(1).unwrap(),
        &[1.0, 1.0, 1.0, 1.0, 1.0, 5.0, 4.0, 2.0]
    );
}

#[test]
fn merge_then_aggregate_mean() {
    let run_b = Run::new(vec![0.5, 2.5, 3.0], vec![5.0, 4.0, 2.0]);
    let merged = TrajectoryMerger::new().merge(&[run_a(), run_b]).unwrap();
    let curve = Aggregator::new(Aggregation::Mean)
        .aggregate(&merged)
        .unwrap();

    assert_eq!(curve.len(), merged.len());
    assert_eq!(curve.times, merged.times());
    assert_eq!(curve.center, vec![7.5, 7.0, 6.5, 6.0, 4.5, 4.0]);
    assert_eq!(curve.lower, vec![5.0, 5.0, 5.0, 4.0, 2.0, 2.0]);
    assert_eq!(curve.upper, vec![10.0, 9.0, 8.0, 8.0, 7.0, 6.0]);
    assert_eq!(curve.num_runs, 2);
}

#[test]
fn aggregate_median_with_scaled_spread_fails() {
    let merged = TrajectoryMerger::new().merge(&[run_a()]).unwrap();
    let err = Aggregator::new(Aggregation::Median)
        .with_spread_scale(2.0)
        .aggregate(&merged)
        .unwrap_err();
    assert!(matches!(err, AggregateError::InvalidConfiguration { .. }));
}

#[test]
fn summary_curve_serializes_for_plotting() {
    let merged = TrajectoryMerger::new().merge(&[run_a()]).unwrap();
    let curve = Aggregator::default().aggregate(&merged).unwrap();
    let json = serde_json::to_value(&curve).unwrap();

    assert_eq!(json["method"], "mean");
    assert_eq!(json["num_runs"], 1);
    assert_eq!(json["center"].as_array().unwrap().len(), 5);
}
