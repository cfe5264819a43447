//! Percentage helpers shared by the progress rollups and the statistics reductions.

/// Display-level percentage: `part / whole * 100`, rounded to the nearest integer and
/// clamped to `0..=100`. An empty `whole` yields 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn percent(part: f64, whole: f64) -> u8 {
    let raw = ratio_percent(part, whole);
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    raw.round().min(100.0) as u8
}

/// Raw percentage with fractional precision and no upper cap. An empty `whole` yields 0.
#[must_use]
pub fn ratio_percent(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 || !whole.is_finite() {
        return 0.0;
    }
    part / whole * 100.0
}

/// Arithmetic mean of the present values only; 0 when none are present.
#[must_use]
pub fn mean_of_present(values: impl IntoIterator<Item = Option<f64>>) -> (u32, f64) {
    let mut count = 0_u32;
    let mut sum = 0.0_f64;
    for value in values.into_iter().flatten() {
        count = count.saturating_add(1);
        sum += value;
    }
    if count == 0 {
        (0, 0.0)
    } else {
        (count, sum / f64::from(count))
    }
}
