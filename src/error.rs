//! Errors raised by the tide computations.
//!
//! Only [`TideError::InsufficientData`] and [`TideError::NoBracketingExtremes`]
//! are expected to reach a caller in normal operation: the aggregator absorbs
//! malformed locations and the lenient interpolator recovers from degenerate
//! pairs on its own.

use thiserror::Error;

/// Failure modes of the core tide engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TideError {
    /// Two extremes share the same timestamp, so progress between them is undefined
    #[error("degenerate input: extremes share an identical timestamp")]
    DegenerateInput,

    /// Extremes expected to alternate high/low do not, or too few are available
    #[error("malformed extreme sequence: {0}")]
    MalformedExtremeSequence(String),

    /// No coefficient can be produced from the supplied locations
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// No consecutive pair of extremes surrounds the query instant
    #[error("no pair of extremes brackets the requested time")]
    NoBracketingExtremes,
}
