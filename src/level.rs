//! Normalised water level for gauges and animations.

/// Position of `current` between `min` and `max`, clamped to `[0, 1]`.
///
/// Flat data (`max == min`) has no meaningful position and yields the
/// midpoint `0.5`.
///
/// # Example
/// ```
/// use tide_coef_lib::level::normalize_level;
///
/// assert_eq!(normalize_level(2.5, 1.0, 4.0), 0.5);
/// assert_eq!(normalize_level(9.0, 1.0, 4.0), 1.0);
/// assert_eq!(normalize_level(3.0, 3.0, 3.0), 0.5);
/// ```
pub fn normalize_level(current: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range == 0.0 {
        return 0.5;
    }
    let level = (current - min) / range;
    if level.is_nan() {
        return 0.5;
    }
    level.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_map_to_zero_and_one() {
        assert_eq!(normalize_level(1.2, 1.2, 5.8), 0.0);
        assert_eq!(normalize_level(5.8, 1.2, 5.8), 1.0);
    }

    #[test]
    fn test_clamps_outside_range() {
        assert_eq!(normalize_level(-3.0, 1.2, 5.8), 0.0);
        assert_eq!(normalize_level(12.0, 1.2, 5.8), 1.0);
    }

    #[test]
    fn test_flat_range_is_midpoint() {
        assert_eq!(normalize_level(0.0, 2.0, 2.0), 0.5);
        assert_eq!(normalize_level(7.0, 2.0, 2.0), 0.5);
    }

    #[test]
    fn test_inverted_bounds_stay_in_unit_interval() {
        let level = normalize_level(2.0, 4.0, 1.0);
        assert!((0.0..=1.0).contains(&level));
    }
}
