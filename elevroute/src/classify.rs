//! Classification of raw samples into usable elevations.

use crate::error::{ElevationError, Result};
use crate::tile::VOID_VALUE;

/// Why a sample could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InvalidReason {
    /// No tile file exists for the cell.
    TileNotFound,
    /// The coordinate maps outside the tile raster or the globe.
    OutOfBounds,
    /// The sample is the void sentinel.
    Void,
    /// The sample is negative and the policy treats negatives as voids.
    Negative,
    /// The tile exists but could not be read or decoded.
    Unreadable,
}

/// Outcome of classifying one route point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classified {
    /// A usable, non-negative elevation in meters.
    Valid(f64),
    /// No usable elevation; left for gap-filling.
    Invalid(InvalidReason),
}

impl Classified {
    /// The elevation, if valid.
    pub fn value(&self) -> Option<f64> {
        match *self {
            Classified::Valid(v) => Some(v),
            Classified::Invalid(_) => None,
        }
    }

    /// Returns `true` for a usable elevation.
    pub fn is_valid(&self) -> bool {
        matches!(self, Classified::Valid(_))
    }
}

/// How to read raw samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyPolicy {
    /// Treat negative readings as corrupted data (`true`) or clamp them to
    /// sea level (`false`).
    ///
    /// Negative SRTM values are mostly radar shadow and water artifacts near
    /// coastlines, but a few regions genuinely lie below sea level.
    pub treat_negative_as_invalid: bool,
}

impl Default for ClassifyPolicy {
    fn default() -> Self {
        Self {
            treat_negative_as_invalid: true,
        }
    }
}

impl ClassifyPolicy {
    /// Classify a raw sample.
    pub fn classify_raw(&self, raw: i16) -> Classified {
        if raw == VOID_VALUE {
            Classified::Invalid(InvalidReason::Void)
        } else if raw < 0 {
            if self.treat_negative_as_invalid {
                Classified::Invalid(InvalidReason::Negative)
            } else {
                Classified::Valid(0.0)
            }
        } else {
            Classified::Valid(f64::from(raw))
        }
    }

    /// Classify the outcome of a sampler read.
    ///
    /// `Ok(None)` means no tile exists for the cell.
    pub fn classify(&self, sample: &Result<Option<i16>>) -> Classified {
        match sample {
            Ok(Some(raw)) => self.classify_raw(*raw),
            Ok(None) => Classified::Invalid(InvalidReason::TileNotFound),
            Err(e) => Classified::Invalid(reason_for(e)),
        }
    }
}

/// Map a sampler failure to the reason it invalidates the point.
pub fn reason_for(err: &ElevationError) -> InvalidReason {
    match err {
        ElevationError::FileNotFound { .. } => InvalidReason::TileNotFound,
        ElevationError::OutOfBounds { .. } | ElevationError::InvalidCoordinate { .. } => {
            InvalidReason::OutOfBounds
        }
        _ => InvalidReason::Unreadable,
    }
}
