/// Assigns 1-based ranks to `values`, averaging the ranks of tied values.
///
/// The smallest value receives rank 1. Values that compare equal share the
/// mean of the ranks they would occupy, so the ranks always sum to
/// `n * (n + 1) / 2`.
///
/// # Examples
///
/// ```
/// use trajstat_stats::rank::rank_average;
///
/// assert_eq!(rank_average(&[10.0, 30.0, 20.0]), vec![1.0, 3.0, 2.0]);
/// assert_eq!(rank_average(&[1.0, 1.0, 1.0]), vec![2.0, 2.0, 2.0]);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn rank_average(values: &[f64]) -> Vec<f64> {
    let mut order = (0..values.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}
