/// divide `accum` by `count` in place.
///
/// When `count` is zero, `accum` keeps its pre-division value (we never
/// want to produce a non-finite average from an empty group).
#[inline]
pub fn divide_if_nonzero(accum: &mut f64, count: i32) {
    if count > 0 {
        *accum /= count as f64;
    }
}

/// ratio of the major to the minor radius of a vortex cross-section.
///
/// Returns `NaN` whenever the ratio isn't finite (e.g. a degenerate minor
/// radius).
#[inline]
pub fn aspect_ratio(max_radius: f64, min_radius: f64) -> f64 {
    let ratio = max_radius / min_radius;
    if ratio.is_finite() { ratio } else { f64::NAN }
}

/// calculate the squared norm of the difference between two 2D points
///
/// # Note
/// We return the squared value since `sqrt` can't be used in no_std crates
pub fn squared_distance_2d(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}
