//! # Tide Coefficient Estimation
//!
//! A tide coefficient is a dimensionless index of tidal strength on a fixed
//! `[20, 120]` scale, conventionally referenced to the amplitude of one port.
//! Official values come from harmonic analysis of the astronomical
//! constituents; here it is approximated linearly from the amplitude of a
//! single high/low pair:
//!
//! ```text
//! coefficient = round(|h_high - h_low| / reference_amplitude · reference_coefficient)
//! ```
//!
//! ## Calibration
//! The default calibration is the mean amplitude of fourteen oceanic French
//! ports, 1.78 m, which corresponds to the long-run mean coefficient of 70.
//! Other calibrations can be configured through [`Calibration`].

use crate::Phase;
use serde::{Deserialize, Serialize};

/// Lowest coefficient on the official scale.
pub const COEFFICIENT_MIN: u8 = 20;

/// Highest coefficient on the official scale.
pub const COEFFICIENT_MAX: u8 = 120;

/// Mean amplitude of the calibration ports, meters.
pub const DEFAULT_REFERENCE_AMPLITUDE_M: f64 = 1.78;

/// Coefficient matching [`DEFAULT_REFERENCE_AMPLITUDE_M`].
pub const DEFAULT_REFERENCE_COEFFICIENT: f64 = 70.0;

/// Amplitudes below this are treated as micro-tidal outliers, meters.
pub const DEFAULT_MIN_AMPLITUDE_M: f64 = 0.5;

/// Linear calibration of amplitude against a reference coefficient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Amplitude (meters) that maps onto `reference_coefficient`
    pub reference_amplitude_m: f64,
    /// Coefficient observed at the reference amplitude
    pub reference_coefficient: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Calibration {
            reference_amplitude_m: DEFAULT_REFERENCE_AMPLITUDE_M,
            reference_coefficient: DEFAULT_REFERENCE_COEFFICIENT,
        }
    }
}

/// Estimate the coefficient of one location from its high and low water heights.
///
/// # Example
/// ```
/// use tide_coef_lib::coefficient::{estimate_coefficient, Calibration};
///
/// let coef = estimate_coefficient(4.0, 1.686, &Calibration::default());
/// assert_eq!(coef, 91);
/// ```
pub fn estimate_coefficient(max_height: f64, min_height: f64, calibration: &Calibration) -> u8 {
    coefficient_from_amplitude((max_height - min_height).abs(), calibration)
}

/// Map an amplitude in meters onto the `[20, 120]` coefficient scale.
pub fn coefficient_from_amplitude(amplitude: f64, calibration: &Calibration) -> u8 {
    let ratio = amplitude / calibration.reference_amplitude_m;
    let raw = (ratio * calibration.reference_coefficient).round();

    if raw.is_nan() {
        return COEFFICIENT_MIN;
    }
    raw.clamp(COEFFICIENT_MIN as f64, COEFFICIENT_MAX as f64) as u8
}

/// Compare the amplitude of the current tide with the next one.
pub fn detect_phase(current_amplitude: f64, next_amplitude: f64) -> Phase {
    if next_amplitude > current_amplitude {
        Phase::Rising
    } else {
        Phase::Falling
    }
}
