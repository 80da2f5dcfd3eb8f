//! # Real-Time Tide View
//!
//! Builds the "what is the tide doing right now" view of a single location
//! from its extremes window:
//!
//! 1. Find the two extremes surrounding `now` and interpolate the height
//! 2. Pick the next high and next low water among the four upcoming extremes
//! 3. Estimate the coefficient from that pair and place the current height
//!    between them
//!
//! Heights and levels are rounded to two decimals, which is what displays
//! consume.

use crate::coefficient::{estimate_coefficient, Calibration};
use crate::fallback::synthesize_prior;
use crate::interpolate::{bracketing_pair, estimate_height};
use crate::level::normalize_level;
use crate::{TideError, TideExtreme, TideKind, TideView};
use chrono::{DateTime, Utc};

/// How many upcoming extremes are searched for the next high and low.
const UPCOMING_WINDOW: usize = 4;

/// Compute the real-time view of one location.
///
/// # Errors
/// - [`TideError::NoBracketingExtremes`] when no consecutive pair surrounds `now`
/// - [`TideError::MalformedExtremeSequence`] when the surrounding pair shares a kind
pub fn current_view(
    extremes: &[TideExtreme],
    now: DateTime<Utc>,
    calibration: &Calibration,
) -> Result<TideView, TideError> {
    let mut sorted = extremes.to_vec();
    sorted.sort_by_key(|e| e.time);
    view_of_sorted(&sorted, now, calibration)
}

/// Like [`current_view`], but when the window starts after `now` a prior
/// extreme is synthesised and the view is computed again.
pub fn current_view_with_fallback(
    extremes: &[TideExtreme],
    now: DateTime<Utc>,
    calibration: &Calibration,
) -> Result<TideView, TideError> {
    let mut sorted = extremes.to_vec();
    sorted.sort_by_key(|e| e.time);

    match view_of_sorted(&sorted, now, calibration) {
        Err(TideError::NoBracketingExtremes) if sorted.first().is_some_and(|e| e.time > now) => {
            let prior = synthesize_prior(&sorted).ok_or(TideError::NoBracketingExtremes)?;
            sorted.insert(0, prior);
            view_of_sorted(&sorted, now, calibration)
        }
        other => other,
    }
}

fn view_of_sorted(
    sorted: &[TideExtreme],
    now: DateTime<Utc>,
    calibration: &Calibration,
) -> Result<TideView, TideError> {
    let (previous, next) = bracketing_pair(sorted, now)?;
    let current_height = estimate_height(previous, next, now);

    let upcoming: Vec<&TideExtreme> = sorted
        .iter()
        .filter(|e| e.time > now)
        .take(UPCOMING_WINDOW)
        .collect();
    let pick = |kind: TideKind| -> TideExtreme {
        upcoming
            .iter()
            .copied()
            .find(|e| e.kind == kind)
            .or_else(|| [previous, next].into_iter().find(|e| e.kind == kind))
            .copied()
            .unwrap_or(*next)
    };
    let max_tide = pick(TideKind::High);
    let min_tide = pick(TideKind::Low);

    let coefficient = estimate_coefficient(max_tide.height, min_tide.height, calibration);
    let water_level = normalize_level(current_height, min_tide.height, max_tide.height);
    let minutes_until_next =
        ((next.time - now).num_milliseconds() as f64 / 60_000.0).round() as i64;

    Ok(TideView {
        current_height: round_centi(current_height),
        water_level: round_centi(water_level),
        coefficient,
        max_tide,
        min_tide,
        is_rising: next.kind == TideKind::High,
        next_extreme: *next,
        minutes_until_next,
    })
}

fn round_centi(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 24, 0, 0, 0).unwrap()
    }

    fn window() -> Vec<TideExtreme> {
        vec![
            TideExtreme {
                time: t0(),
                height: 4.0,
                kind: TideKind::High,
            },
            TideExtreme {
                time: t0() + Duration::hours(6),
                height: 1.0,
                kind: TideKind::Low,
            },
            TideExtreme {
                time: t0() + Duration::hours(12),
                height: 4.2,
                kind: TideKind::High,
            },
            TideExtreme {
                time: t0() + Duration::hours(18),
                height: 0.8,
                kind: TideKind::Low,
            },
        ]
    }

    #[test]
    fn test_view_on_falling_tide() {
        let now = t0() + Duration::hours(3);
        let view = current_view(&window(), now, &Calibration::default()).unwrap();
        assert_eq!(view.current_height, 2.5);
        assert!(!view.is_rising);
        assert_eq!(view.next_extreme.kind, TideKind::Low);
        assert_eq!(view.minutes_until_next, 180);
        // next low 1.0 at +6h, next high 4.2 at +12h
        assert_eq!(view.min_tide.height, 1.0);
        assert_eq!(view.max_tide.height, 4.2);
        // 3.2 m / 1.78 m * 70 = 125.8 -> clamped
        assert_eq!(view.coefficient, 120);
        assert_eq!(view.water_level, 0.47);
    }

    #[test]
    fn test_view_on_rising_tide() {
        let now = t0() + Duration::hours(9);
        let view = current_view(&window(), now, &Calibration::default()).unwrap();
        assert!(view.is_rising);
        assert_eq!(view.next_extreme.height, 4.2);
        assert_eq!(view.max_tide.height, 4.2);
        assert_eq!(view.min_tide.height, 0.8);
    }

    #[test]
    fn test_unsorted_input_is_accepted() {
        let mut extremes = window();
        extremes.reverse();
        let now = t0() + Duration::hours(3);
        let view = current_view(&extremes, now, &Calibration::default()).unwrap();
        assert_eq!(view.current_height, 2.5);
    }

    #[test]
    fn test_last_pair_uses_bracket_for_missing_kinds() {
        let now = t0() + Duration::hours(17);
        let view = current_view(&window(), now, &Calibration::default()).unwrap();
        assert_eq!(view.min_tide.height, 0.8);
        assert_eq!(view.max_tide.height, 4.2);
    }

    #[test]
    fn test_no_bracketing_pair() {
        let now = t0() + Duration::hours(30);
        assert_eq!(
            current_view(&window(), now, &Calibration::default()),
            Err(TideError::NoBracketingExtremes)
        );
    }

    #[test]
    fn test_fallback_synthesises_prior_extreme() {
        let now = t0() - Duration::hours(1);
        assert_eq!(
            current_view(&window(), now, &Calibration::default()),
            Err(TideError::NoBracketingExtremes)
        );
        let view = current_view_with_fallback(&window(), now, &Calibration::default()).unwrap();
        assert!(view.is_rising);
        assert_eq!(view.next_extreme.time, t0());
        assert!(view.current_height > 1.0 && view.current_height < 4.0);
    }

    #[test]
    fn test_fallback_does_not_hide_stale_data() {
        let now = t0() + Duration::hours(30);
        assert_eq!(
            current_view_with_fallback(&window(), now, &Calibration::default()),
            Err(TideError::NoBracketingExtremes)
        );
    }
}
