//! # Synthetic Prior Extreme
//!
//! Providers usually return extremes from "now" onwards, so just after a
//! refresh the window can start with an extreme that lies slightly in the
//! future and nothing brackets the current instant. This module rebuilds the
//! missing previous extreme from the semidiurnal rhythm of the tide:
//!
//! - **Kind**: opposite of the first known extreme (highs and lows alternate)
//! - **Time**: half an M2 period (6 h 12.6 min) before the first extreme
//! - **Height**: the next known extreme of the same kind in the window
//!
//! The result is an estimate; callers that need exact data should report
//! the bracketing failure instead.

use crate::TideExtreme;
use chrono::Duration;

/// Principal lunar semidiurnal (M2) period in hours.
pub const M2_PERIOD_HOURS: f64 = 12.42;

/// Estimate the extreme preceding the first one of a time-sorted window.
///
/// Returns `None` when the window is empty or contains no extreme of the
/// opposite kind to borrow a height from.
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use tide_coef_lib::{fallback::synthesize_prior, TideExtreme, TideKind};
///
/// let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap();
/// let window = vec![
///     TideExtreme { time: t0, height: 6.1, kind: TideKind::High },
///     TideExtreme { time: t0 + Duration::minutes(372), height: 1.4, kind: TideKind::Low },
/// ];
///
/// let prior = synthesize_prior(&window).unwrap();
/// assert_eq!(prior.kind, TideKind::Low);
/// assert_eq!(prior.height, 1.4);
/// assert!(prior.time < t0);
/// ```
pub fn synthesize_prior(extremes: &[TideExtreme]) -> Option<TideExtreme> {
    let first = extremes.first()?;
    let kind = first.kind.opposite();
    let model = extremes.iter().skip(1).find(|e| e.kind == kind)?;

    Some(TideExtreme {
        time: first.time - half_m2_period(),
        height: model.height,
        kind,
    })
}

fn half_m2_period() -> Duration {
    Duration::seconds((M2_PERIOD_HOURS * 3600.0 / 2.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TideKind;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_prior_is_half_period_earlier() {
        let t0 = Utc.with_ymd_and_hms(2025, 7, 24, 3, 0, 0).unwrap();
        let window = vec![
            TideExtreme {
                time: t0,
                height: 0.9,
                kind: TideKind::Low,
            },
            TideExtreme {
                time: t0 + Duration::hours(6),
                height: 5.3,
                kind: TideKind::High,
            },
        ];
        let prior = synthesize_prior(&window).unwrap();
        assert_eq!(prior.kind, TideKind::High);
        assert_eq!(prior.height, 5.3);
        // 6.21 h = 22 356 s
        assert_eq!((t0 - prior.time).num_seconds(), 22_356);
    }

    #[test]
    fn test_nothing_to_borrow_from() {
        let t0 = Utc.with_ymd_and_hms(2025, 7, 24, 3, 0, 0).unwrap();
        let single = vec![TideExtreme {
            time: t0,
            height: 0.9,
            kind: TideKind::Low,
        }];
        assert!(synthesize_prior(&single).is_none());
        assert!(synthesize_prior(&[]).is_none());
    }
}
