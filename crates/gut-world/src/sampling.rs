//! Random draws shared by the transition rules.

use rand::Rng;

/// Index of the first cumulative threshold strictly greater than `r`.
///
/// The thresholds are not normalized. If `r` reaches past every threshold
/// the leftover mass maps to `None`, and callers leave the cell unchanged.
pub fn sample_cumulative(thresholds: impl IntoIterator<Item = f64>, r: f64) -> Option<usize> {
    thresholds.into_iter().position(|threshold| r < threshold)
}

/// One Bernoulli trial: a uniform draw in `[0, 1)` below `p`.
///
/// Always consumes exactly one draw, even for `p == 0` or `p == 1`.
pub fn trial<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.gen::<f64>() < p
}

/// Occupancy trial followed, on success, by a categorical draw.
///
/// Returns the chosen type index, or `None` when either the cell stays
/// unseeded or the draw falls into leftover mass.
pub fn seed_draw<R: Rng + ?Sized>(
    rng: &mut R,
    occupancy: f64,
    thresholds: impl IntoIterator<Item = f64>,
) -> Option<usize> {
    if trial(rng, occupancy) {
        let r = rng.gen::<f64>();
        sample_cumulative(thresholds, r)
    } else {
        None
    }
}
