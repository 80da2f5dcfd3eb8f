//! # National Coefficient Aggregation
//!
//! A single port's amplitude is a noisy proxy for the national tide strength:
//! local geography amplifies or damps the tide. Averaging the coefficients of
//! many oceanic ports gives a far steadier estimate, provided micro-tidal
//! regions (enclosed seas such as the Mediterranean) are kept out of the mean.
//!
//! ## Algorithm
//! 1. Per location, take the two earliest extremes; skip the location when
//!    fewer than two exist or both share the same kind
//! 2. Convert the amplitude of that pair into a coefficient with one global
//!    [`Calibration`]
//! 3. Reject locations whose amplitude is below the minimum threshold
//! 4. Round the mean of the remaining coefficients
//! 5. Compare the first two tidal ranges of a reference location to decide
//!    whether coefficients are rising or falling
//!
//! Skipped locations are neither counted in `total_count` nor listed as
//! outliers; only amplitude rejections are.

use crate::coefficient::{
    coefficient_from_amplitude, detect_phase, Calibration, DEFAULT_MIN_AMPLITUDE_M,
};
use crate::{
    CoefficientDetail, LocationCoefficient, LocationExtremes, NationalCoefficient, Phase,
    TideError, TideExtreme,
};
use serde::{Deserialize, Serialize};

/// Parameters shared by every location of one aggregation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregationSettings {
    pub calibration: Calibration,
    /// Locations with a smaller amplitude are outliers, meters
    pub min_amplitude_m: f64,
    /// Location whose extremes decide the phase; the first row when `None`
    pub reference_location: Option<String>,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        AggregationSettings {
            calibration: Calibration::default(),
            min_amplitude_m: DEFAULT_MIN_AMPLITUDE_M,
            reference_location: None,
        }
    }
}

/// Coefficient of a single location from its two earliest extremes.
pub fn location_coefficient(
    row: &LocationExtremes,
    calibration: &Calibration,
) -> Result<LocationCoefficient, TideError> {
    if row.extremes.len() < 2 {
        return Err(TideError::MalformedExtremeSequence(format!(
            "{} has {} extreme(s), need at least 2",
            row.location_id,
            row.extremes.len()
        )));
    }

    let sorted = chronological(&row.extremes);
    let (first, second) = (&sorted[0], &sorted[1]);
    if first.kind == second.kind {
        return Err(TideError::MalformedExtremeSequence(format!(
            "{} starts with two {:?} extremes",
            row.location_id, first.kind
        )));
    }

    let amplitude = (first.height - second.height).abs();
    Ok(LocationCoefficient {
        location_id: row.location_id.clone(),
        amplitude,
        coefficient: coefficient_from_amplitude(amplitude, calibration),
    })
}

/// Phase from the first four extremes of one location.
///
/// Returns `None` when fewer than four extremes are available.
pub fn phase_from_reference(extremes: &[TideExtreme]) -> Option<Phase> {
    if extremes.len() < 4 {
        return None;
    }
    let sorted = chronological(extremes);
    let amp1 = (sorted[0].height - sorted[1].height).abs();
    let amp2 = (sorted[2].height - sorted[3].height).abs();
    Some(detect_phase(amp1, amp2))
}

/// Combine per-location coefficients into one national coefficient.
///
/// # Errors
/// [`TideError::InsufficientData`] when `rows` is empty or no location
/// survives outlier rejection. Malformed locations are skipped, not fatal.
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use tide_coef_lib::aggregate::{aggregate, AggregationSettings};
/// use tide_coef_lib::{LocationExtremes, TideExtreme, TideKind};
///
/// let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
/// let pair = |high: f64, low: f64| vec![
///     TideExtreme { time: t0, height: high, kind: TideKind::High },
///     TideExtreme { time: t0 + Duration::hours(6), height: low, kind: TideKind::Low },
/// ];
/// let rows = vec![
///     LocationExtremes::new("brest", pair(5.9, 1.6)),
///     LocationExtremes::new("marseille", pair(0.5, 0.3)),
/// ];
///
/// let national = aggregate(&rows, &AggregationSettings::default()).unwrap();
/// assert_eq!(national.detail.used_count, 1);
/// assert_eq!(national.detail.excluded_location_ids, vec!["marseille".to_string()]);
/// ```
pub fn aggregate(
    rows: &[LocationExtremes],
    settings: &AggregationSettings,
) -> Result<NationalCoefficient, TideError> {
    if rows.is_empty() {
        return Err(TideError::InsufficientData("no locations supplied".into()));
    }

    let computed: Vec<LocationCoefficient> = rows
        .iter()
        .filter_map(|row| location_coefficient(row, &settings.calibration).ok())
        .collect();
    let total_count = computed.len();

    let (valid, outliers): (Vec<_>, Vec<_>) = computed
        .into_iter()
        .partition(|lc| lc.amplitude >= settings.min_amplitude_m);

    if valid.is_empty() {
        return Err(TideError::InsufficientData(format!(
            "no location out of {} has an amplitude of at least {} m",
            rows.len(),
            settings.min_amplitude_m
        )));
    }

    let sum: u32 = valid.iter().map(|lc| lc.coefficient as u32).sum();
    let mean = (sum as f64 / valid.len() as f64).round() as u8;

    // A named reference missing from the input falls back to the first row.
    let reference = settings
        .reference_location
        .as_ref()
        .and_then(|id| rows.iter().find(|row| &row.location_id == id))
        .or_else(|| rows.first());
    let phase = reference.and_then(|row| phase_from_reference(&row.extremes));

    Ok(NationalCoefficient {
        value: mean,
        phase: phase.unwrap_or(Phase::Rising),
        detail: CoefficientDetail {
            used_count: valid.len(),
            total_count,
            excluded_location_ids: outliers.into_iter().map(|lc| lc.location_id).collect(),
            phase_from_data: phase.is_some(),
        },
    })
}

fn chronological(extremes: &[TideExtreme]) -> Vec<TideExtreme> {
    let mut sorted = extremes.to_vec();
    sorted.sort_by_key(|e| e.time);
    sorted
}
