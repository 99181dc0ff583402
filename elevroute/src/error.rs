//! Error types for the elevroute library.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::filename::TileId;

/// Errors that can occur when working with elevation tiles.
///
/// Only [`ElevationError::DataUnavailable`] is fatal for a service. Every
/// other variant is a per-point or per-tile condition that the profile
/// pipeline absorbs by classifying the affected samples as invalid.
#[derive(Error, Debug)]
pub enum ElevationError {
    /// IO error when reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File size doesn't match SRTM1 or SRTM3 format.
    #[error("Invalid file size: {size} bytes (expected 25934402 for SRTM1 or 2884802 for SRTM3)")]
    InvalidFileSize { size: usize },

    /// The filename does not encode a tile (expected e.g. `N35E138.hgt`).
    #[error("Invalid tile name: {path}")]
    InvalidTileName { path: PathBuf },

    /// A `.hgt.zip` archive could not be read or holds no `.hgt` entry.
    #[error("Invalid tile archive {path}: {reason}")]
    InvalidArchive { path: PathBuf, reason: String },

    /// Coordinates fall outside the raster of the tile, or outside the globe.
    #[error("Coordinates out of bounds: lat={lat}, lon={lon}")]
    OutOfBounds { lat: f64, lon: f64 },

    /// The required .hgt file was not found.
    #[error("SRTM file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// A tile file exists but could not be loaded.
    #[error("Malformed tile {id}: {source}")]
    MalformedTile {
        id: TileId,
        #[source]
        source: Arc<ElevationError>,
    },

    /// The configured data directory is missing or unreadable.
    #[error("Elevation data unavailable at {path}: {reason}")]
    DataUnavailable { path: PathBuf, reason: String },

    /// A GeoJSON position with fewer than two elements.
    #[error("Invalid coordinate: expected [lon, lat], got {len} element(s)")]
    InvalidCoordinate { len: usize },
}

impl ElevationError {
    /// Returns `true` if the error means "no tile for this cell" rather than
    /// a broken tile or environment.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ElevationError::FileNotFound { .. })
    }
}

/// Result type alias using [`ElevationError`].
pub type Result<T> = std::result::Result<T, ElevationError>;
