//! # elevroute - Route Elevation Profiles
//!
//! Ground elevation along a route, read from SRTM (Shuttle Radar Topography
//! Mission) `.hgt` tiles, with void and missing samples reconstructed.
//!
//! ## Pipeline
//!
//! 1. **Locate**: each point maps to the 1° × 1° tile containing it ([`filename::locate`])
//! 2. **Cache**: tiles are loaded on first use and kept in a bounded LRU cache ([`TileCache`])
//! 3. **Sample**: one nearest pixel is read through the tile's affine transform
//!    ([`SrtmTile::sample`])
//! 4. **Classify**: voids, missing tiles and (by default) negative values become
//!    invalid ([`ClassifyPolicy`])
//! 5. **Gap-fill**: invalid points are interpolated from their neighbors ([`GapFill`])
//!
//! ## Quick Start
//!
//! ```ignore
//! use elevroute::ElevationService;
//!
//! let service = ElevationService::new("/data/srtm", 100)?;
//!
//! let route = [(35.3606, 138.7274), (35.3650, 138.7300), (35.3700, 138.7350)];
//! let profile = service.get_elevation_profile(&route)?;
//! // One non-negative elevation per point, in route order
//! ```
//!
//! ## SRTM Data Format
//!
//! - **SRTM1**: 3601×3601 samples, 1 arc-second (~30m) resolution
//! - **SRTM3**: 1201×1201 samples, 3 arc-second (~90m) resolution
//!
//! Each sample is a 16-bit big-endian signed integer representing elevation in meters.
//! The special value -32768 indicates void (no data). Tiles may also be stored
//! as `.hgt.zip` archives.

pub mod cache;
pub mod classify;
pub mod error;
pub mod filename;
pub mod gapfill;
pub mod service;
pub mod tile;

#[cfg(feature = "geojson")]
pub mod geojson;

// Re-export main types at crate root for convenience
pub use cache::{BoundingBox, CacheBudget, CacheStats, PreloadStats, TileCache};
pub use classify::{Classified, ClassifyPolicy, InvalidReason};
pub use error::{ElevationError, Result};
pub use filename::{locate, TileId};
pub use gapfill::GapFill;
pub use service::{ElevationService, ElevationServiceBuilder};
pub use tile::{GeoTransform, SrtmResolution, SrtmTile, TileStats, VOID_VALUE};
