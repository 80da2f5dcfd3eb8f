//! # Tide Coefficient Core Library
//!
//! This library estimates the real-time state of the tide at a coastal location
//! and a national tide coefficient from sparse high/low tide extremes, as
//! published by tide-prediction services.
//!
//! ## Design Philosophy
//!
//! ### Pure Core
//! The numerical engine ([`interpolate`], [`level`], [`coefficient`],
//! [`aggregate`], [`realtime`]) is a set of synchronous, side-effect-free
//! functions. They never log, never touch the network or the filesystem and
//! keep no state between calls, so they can be called from any number of
//! threads without coordination.
//!
//! ### Collaborators
//! Everything with I/O lives around the core and is injected into it:
//! - [`provider`]: fetches tide extremes from a remote prediction service
//! - [`cache`]: key-value store with per-entry time-to-live
//! - [`refresh`]: batch job fetching every reference port and caching the
//!   national coefficient
//! - [`config`]: TOML configuration resolved once at startup
//!
//! ### Data Flow
//! 1. **Per port**: extremes → bracketing pair → interpolated height → level
//! 2. **National**: extremes of N ports → per-port coefficient → outlier
//!    rejection → mean coefficient + phase
//!
//! ## Core Types
//! - [`TideExtreme`]: a single high or low water event
//! - [`NationalCoefficient`]: the aggregated national tide strength
//! - [`TideView`]: the real-time state of one location

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod aggregate;
pub mod cache;
pub mod coefficient;
pub mod config;
pub mod error;
pub mod fallback;
pub mod interpolate;
pub mod level;
pub mod provider;
pub mod realtime;
pub mod refresh;
pub mod report;


pub use error::TideError;

/// Whether an extreme is a high water or a low water.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TideKind {
    High,
    Low,
}

impl TideKind {
    /// The other kind; highs and lows alternate in well-formed data.
    pub fn opposite(self) -> Self {
        match self {
            TideKind::High => TideKind::Low,
            TideKind::Low => TideKind::High,
        }
    }
}

/// A recorded instant of locally maximal or minimal water height.
///
/// Extremes are produced by the tide-data provider and are never mutated
/// by this crate. Heights are in meters above the provider's chart datum.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use tide_coef_lib::{TideExtreme, TideKind};
///
/// let high = TideExtreme {
///     time: Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap(),
///     height: 6.9,
///     kind: TideKind::High,
/// };
/// assert_eq!(high.kind.opposite(), TideKind::Low);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideExtreme {
    /// Instant of the extreme (ISO-8601 on the wire)
    pub time: DateTime<Utc>,
    /// Water height in meters
    pub height: f64,
    /// High or low water; providers spell the field `type`
    #[serde(alias = "type")]
    pub kind: TideKind,
}

/// Trend of tidal strength over successive cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Rising,
    Falling,
}

/// Extremes of one location, as handed to the aggregator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationExtremes {
    pub location_id: String,
    pub extremes: Vec<TideExtreme>,
}

impl LocationExtremes {
    pub fn new(location_id: impl Into<String>, extremes: Vec<TideExtreme>) -> Self {
        Self {
            location_id: location_id.into(),
            extremes,
        }
    }
}

/// Coefficient derived from one location's amplitude.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCoefficient {
    pub location_id: String,
    /// Absolute height difference of the first high/low pair, meters
    pub amplitude: f64,
    /// Calibrated coefficient in `[20, 120]`
    pub coefficient: u8,
}

/// Bookkeeping attached to a [`NationalCoefficient`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoefficientDetail {
    /// Locations that contributed to the mean
    #[serde(rename = "portsUsed")]
    pub used_count: usize,
    /// Locations with a usable high/low pair, before outlier rejection
    #[serde(rename = "portsTotal")]
    pub total_count: usize,
    /// Locations rejected for an amplitude below the threshold
    #[serde(rename = "outliers")]
    pub excluded_location_ids: Vec<String>,
    /// False when the phase is the `Rising` default because the reference
    /// location had fewer than four extremes
    #[serde(rename = "phaseFromData", default = "default_true")]
    pub phase_from_data: bool,
}

fn default_true() -> bool {
    true
}

/// Nationwide representative tide coefficient.
///
/// Serialises to the record written into the cache under the national key:
/// ```json
/// { "coefficient": 87, "phase": "rising",
///   "detail": { "portsUsed": 14, "portsTotal": 15,
///               "outliers": ["marseille"], "phaseFromData": true } }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NationalCoefficient {
    #[serde(rename = "coefficient")]
    pub value: u8,
    pub phase: Phase,
    pub detail: CoefficientDetail,
}

/// Real-time tide state of a single location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TideView {
    /// Interpolated water height now, meters (centimetre precision)
    pub current_height: f64,
    /// Position of the current height between `min_tide` and `max_tide`, 0..=1
    pub water_level: f64,
    /// Coefficient estimated from the upcoming high/low pair
    pub coefficient: u8,
    pub max_tide: TideExtreme,
    pub min_tide: TideExtreme,
    /// True when the next extreme is a high water
    pub is_rising: bool,
    pub next_extreme: TideExtreme,
    pub minutes_until_next: i64,
}
