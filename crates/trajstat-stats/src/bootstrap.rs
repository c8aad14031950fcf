use rand::Rng;

/// Draws `sample_size` indices uniformly from `0..num_samples`, with replacement.
///
/// The generator is passed in explicitly so callers control seeding and can
/// reuse one generator across repeated draws.
///
/// # Returns
///
/// * `Some(indices)` - the drawn indices, in draw order
/// * `None` - if `num_samples` is zero and there is nothing to draw from
///
/// # Examples
///
/// ```
/// use rand::SeedableRng as _;
/// use rand_pcg::Pcg64;
/// use trajstat_stats::bootstrap::bootstrap_indices;
///
/// let mut a = Pcg64::seed_from_u64(42);
/// let mut b = Pcg64::seed_from_u64(42);
/// assert_eq!(bootstrap_indices(&mut a, 10, 5), bootstrap_indices(&mut b, 10, 5));
/// assert_eq!(bootstrap_indices(&mut a, 0, 5), None);
/// ```
pub fn bootstrap_indices<R>(
    rng: &mut R,
    num_samples: usize,
    sample_size: usize,
) -> Option<Vec<usize>>
where
    R: Rng + ?Sized,
{
    if num_samples == 0 {
        return None;
    }
    Some(
        (0..sample_size)
            .map(|_| rng.random_range(0..num_samples))
            .collect(),
    )
}
