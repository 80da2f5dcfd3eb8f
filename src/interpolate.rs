//! # Height Interpolation Between Tide Extremes
//!
//! Tide predictions only give the instants of high and low water. Between two
//! of them the water follows roughly half a cosine: it turns slowly around the
//! extremes and moves fastest at mid-tide (the "rule of twelfths" shape).
//!
//! ```text
//! s(p) = (1 - cos(p·π)) / 2        p = (now - t1) / (t2 - t1)
//! h    = h1 + (h2 - h1) · s(p)
//! ```
//!
//! Outside `[t1, t2]` the height of the nearer extreme is returned; nothing
//! is ever extrapolated.

use crate::{TideError, TideExtreme};
use chrono::{DateTime, Utc};
use std::f64::consts::PI;

/// Estimate the water height at `now` from two adjacent extremes.
///
/// The extremes may be passed in either order. Identical timestamps are
/// recovered from by returning the first height, so the result is always
/// finite for finite inputs.
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use tide_coef_lib::{interpolate::estimate_height, TideExtreme, TideKind};
///
/// let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
/// let high = TideExtreme { time: t0, height: 4.0, kind: TideKind::High };
/// let low = TideExtreme { time: t0 + Duration::hours(6), height: 1.0, kind: TideKind::Low };
///
/// let mid = estimate_height(&high, &low, t0 + Duration::hours(3));
/// assert!((mid - 2.5).abs() < 1e-9);
/// ```
pub fn estimate_height(a: &TideExtreme, b: &TideExtreme, now: DateTime<Utc>) -> f64 {
    let (first, second) = chronological(a, b);
    if first.time == second.time {
        return first.height;
    }
    eased_height(first, second, now)
}

/// Strict variant of [`estimate_height`].
///
/// Reports [`TideError::DegenerateInput`] for identical timestamps and
/// [`TideError::MalformedExtremeSequence`] when both extremes are of the
/// same kind, instead of recovering.
pub fn try_estimate_height(
    a: &TideExtreme,
    b: &TideExtreme,
    now: DateTime<Utc>,
) -> Result<f64, TideError> {
    if a.kind == b.kind {
        return Err(TideError::MalformedExtremeSequence(format!(
            "consecutive {:?} extremes at {} and {}",
            a.kind, a.time, b.time
        )));
    }
    if a.time == b.time {
        return Err(TideError::DegenerateInput);
    }
    let (first, second) = chronological(a, b);
    Ok(eased_height(first, second, now))
}

/// Find the consecutive pair of extremes surrounding `now`.
///
/// `extremes` must be sorted by time. The first pair with
/// `t[i] <= now <= t[i + 1]` wins.
pub fn bracketing_pair(
    extremes: &[TideExtreme],
    now: DateTime<Utc>,
) -> Result<(&TideExtreme, &TideExtreme), TideError> {
    let pair = extremes
        .windows(2)
        .find(|w| w[0].time <= now && now <= w[1].time)
        .ok_or(TideError::NoBracketingExtremes)?;

    if pair[0].kind == pair[1].kind {
        return Err(TideError::MalformedExtremeSequence(format!(
            "extremes at {} and {} are both {:?}",
            pair[0].time, pair[1].time, pair[0].kind
        )));
    }
    Ok((&pair[0], &pair[1]))
}

fn chronological<'a>(
    a: &'a TideExtreme,
    b: &'a TideExtreme,
) -> (&'a TideExtreme, &'a TideExtreme) {
    if a.time <= b.time {
        (a, b)
    } else {
        (b, a)
    }
}

// Caller guarantees first.time < second.time.
fn eased_height(first: &TideExtreme, second: &TideExtreme, now: DateTime<Utc>) -> f64 {
    // Boundaries return the stored heights exactly.
    if now <= first.time {
        return first.height;
    }
    if now >= second.time {
        return second.height;
    }

    let elapsed = (now - first.time).num_milliseconds() as f64;
    let span = (second.time - first.time).num_milliseconds() as f64;
    let progress = elapsed / span;
    let eased = (1.0 - (progress * PI).cos()) / 2.0;

    first.height + (second.height - first.height) * eased
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TideKind;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 24, 0, 0, 0).unwrap()
    }

    fn extreme(hours: i64, height: f64, kind: TideKind) -> TideExtreme {
        TideExtreme {
            time: t0() + Duration::hours(hours),
            height,
            kind,
        }
    }

    #[test]
    fn test_midpoint_is_half_way() {
        let high = extreme(0, 4.0, TideKind::High);
        let low = extreme(6, 1.0, TideKind::Low);
        let h = estimate_height(&high, &low, t0() + Duration::hours(3));
        assert!((h - 2.5).abs() < 1e-9, "got {h}");
    }

    #[test]
    fn test_argument_order_does_not_matter() {
        let high = extreme(0, 4.0, TideKind::High);
        let low = extreme(6, 1.0, TideKind::Low);
        let now = t0() + Duration::minutes(100);
        assert_eq!(
            estimate_height(&high, &low, now),
            estimate_height(&low, &high, now)
        );
    }

    #[test]
    fn test_outside_range_returns_nearer_extreme() {
        let low = extreme(0, 0.8, TideKind::Low);
        let high = extreme(6, 5.2, TideKind::High);
        assert_eq!(estimate_height(&low, &high, t0() - Duration::hours(2)), 0.8);
        assert_eq!(estimate_height(&low, &high, t0() + Duration::hours(9)), 5.2);
    }

    #[test]
    fn test_ease_is_slow_near_extremes() {
        let low = extreme(0, 0.0, TideKind::Low);
        let high = extreme(6, 6.0, TideKind::High);
        let first_hour = estimate_height(&low, &high, t0() + Duration::hours(1));
        let third_hour = estimate_height(&low, &high, t0() + Duration::hours(3))
            - estimate_height(&low, &high, t0() + Duration::hours(2));
        assert!(first_hour < third_hour);
    }

    #[test]
    fn test_identical_timestamps_fall_back_to_first_height() {
        let a = extreme(2, 3.1, TideKind::High);
        let b = extreme(2, 1.2, TideKind::Low);
        let h = estimate_height(&a, &b, t0() + Duration::hours(2));
        assert_eq!(h, 3.1);
        assert!(h.is_finite());
        assert_eq!(
            try_estimate_height(&a, &b, t0()),
            Err(TideError::DegenerateInput)
        );
    }

    #[test]
    fn test_strict_rejects_same_kind() {
        let a = extreme(0, 3.1, TideKind::High);
        let b = extreme(6, 3.4, TideKind::High);
        assert!(matches!(
            try_estimate_height(&a, &b, t0() + Duration::hours(1)),
            Err(TideError::MalformedExtremeSequence(_))
        ));
    }

    #[test]
    fn test_bracketing_pair() {
        let extremes = vec![
            extreme(0, 1.0, TideKind::Low),
            extreme(6, 5.0, TideKind::High),
            extreme(12, 1.2, TideKind::Low),
        ];
        let (a, b) = bracketing_pair(&extremes, t0() + Duration::hours(8)).unwrap();
        assert_eq!(a.kind, TideKind::High);
        assert_eq!(b.kind, TideKind::Low);

        assert_eq!(
            bracketing_pair(&extremes, t0() + Duration::hours(13)),
            Err(TideError::NoBracketingExtremes)
        );
        assert_eq!(
            bracketing_pair(&extremes[..1], t0()),
            Err(TideError::NoBracketingExtremes)
        );
    }

    #[test]
    fn test_bracketing_pair_rejects_same_kind() {
        let extremes = vec![
            extreme(0, 5.0, TideKind::High),
            extreme(6, 4.6, TideKind::High),
        ];
        assert!(matches!(
            bracketing_pair(&extremes, t0() + Duration::hours(1)),
            Err(TideError::MalformedExtremeSequence(_))
        ));
    }
}
