//! Route elevation service.
//!
//! [`ElevationService`] ties the pipeline together: each route point is
//! located to a tile, the tile is fetched from the [`TileCache`], one pixel is
//! sampled and classified, and the classified route is gap-filled into a
//! complete profile.
//!
//! ```ignore
//! use elevroute::ElevationService;
//!
//! let service = ElevationService::builder("/data/srtm")
//!     .cache_size(100)
//!     .build()?;
//!
//! let route = [(35.3606, 138.7274), (35.3610, 138.7300)];
//! let profile = service.get_elevation_profile(&route)?;
//! assert_eq!(profile.len(), route.len());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{BoundingBox, CacheBudget, CacheStats, PreloadStats, TileCache};
use crate::classify::{Classified, ClassifyPolicy, InvalidReason};
use crate::error::{ElevationError, Result};
use crate::filename::{is_valid_coord, locate, TileId};
use crate::gapfill::{GapFill, DEFAULT_SEA_LEVEL_THRESHOLD};
use crate::tile::{SrtmTile, VOID_VALUE};

/// Elevation service with a bounded tile cache.
///
/// One instance is meant to be built at startup and shared (by reference or
/// `Arc`) between all request handlers; it is `Send + Sync`.
///
/// # Example
///
/// ```ignore
/// use elevroute::ElevationService;
///
/// let service = ElevationService::new("/path/to/hgt/files", 100)?;
///
/// // Query elevation - tile is loaded automatically
/// let elevation = service.get_elevation(35.6762, 139.6503)?; // Tokyo
///
/// // Check cache statistics
/// let stats = service.cache_stats();
/// println!("Cache hit rate: {:.1}%", stats.hit_rate() * 100.0);
/// ```
pub struct ElevationService {
    cache: TileCache,
    policy: ClassifyPolicy,
    gap_fill: GapFill,
}

impl ElevationService {
    /// Create a service caching up to `cache_size` tiles with default policies.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::DataUnavailable`] if `data_dir` is missing or unreadable.
    pub fn new<P: AsRef<Path>>(data_dir: P, cache_size: u64) -> Result<Self> {
        ElevationServiceBuilder::new(data_dir)
            .cache_size(cache_size)
            .build()
    }

    /// Create a builder for more configuration options.
    pub fn builder<P: AsRef<Path>>(data_dir: P) -> ElevationServiceBuilder {
        ElevationServiceBuilder::new(data_dir)
    }

    /// Compute the elevation profile of a route.
    ///
    /// Returns one non-negative elevation per route point, in route order.
    /// Missing tiles, voids, out-of-range coordinates and unreadable tiles
    /// never fail the call; those points are gap-filled.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::DataUnavailable`] if the data directory has
    /// become unreadable since the service was built.
    pub fn get_elevation_profile(&self, route: &[(f64, f64)]) -> Result<Vec<f64>> {
        check_data_dir(self.cache.data_dir())?;

        let classified = self.classify_route(route);
        let profile = self.gap_fill.fill(&classified);

        tracing::debug!(
            points = route.len(),
            filled = classified.iter().filter(|c| !c.is_valid()).count(),
            "Computed elevation profile"
        );

        Ok(profile)
    }

    /// Classify every point of a route.
    ///
    /// Points are grouped by tile so that each tile is looked up once per
    /// route, and results are reassembled in input order.
    pub fn classify_route(&self, route: &[(f64, f64)]) -> Vec<Classified> {
        let mut results = vec![Classified::Invalid(InvalidReason::OutOfBounds); route.len()];

        let mut groups: HashMap<TileId, Vec<usize>> = HashMap::new();
        let mut off_globe = 0usize;
        for (i, &(lat, lon)) in route.iter().enumerate() {
            if is_valid_coord(lat, lon) {
                groups.entry(locate(lat, lon)).or_default().push(i);
            } else {
                tracing::debug!(lat, lon, "Coordinates outside the globe");
                off_globe += 1;
            }
        }
        if off_globe > 0 {
            tracing::warn!(points = off_globe, "Coordinates outside the globe");
        }

        for (id, indices) in groups {
            match self.cache.get(id) {
                Ok(tile) => {
                    for &i in &indices {
                        let (lat, lon) = route[i];
                        let sample = sample_tile(tile.as_deref(), lat, lon);
                        results[i] = self.classify_sample(lat, lon, sample);
                    }

                    // One event per tile and reason, not per point
                    let group = indices.iter().map(|&i| &results[i]);
                    for (reason, points) in invalid_counts(group) {
                        tracing::warn!(tile = %id, ?reason, points, "Invalid elevation samples");
                    }
                }
                // Already logged by the cache
                Err(_) => {
                    for i in indices {
                        results[i] = Classified::Invalid(InvalidReason::Unreadable);
                    }
                }
            }
        }

        results
    }

    /// Classify a single point.
    pub fn classify_point(&self, lat: f64, lon: f64) -> Classified {
        self.classify_sample(lat, lon, self.sample(lat, lon))
    }

    fn classify_sample(&self, lat: f64, lon: f64, sample: Result<Option<i16>>) -> Classified {
        let classified = self.policy.classify(&sample);

        if let Classified::Invalid(reason) = classified {
            tracing::debug!(lat, lon, ?reason, "Invalid elevation sample");
        }

        classified
    }

    /// Read the raw sample for a coordinate.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(raw))` - the raw sample, possibly [`VOID_VALUE`] or negative
    /// - `Ok(None)` - no tile for this cell
    /// - `Err(...)` - coordinates out of range or the tile is malformed
    pub fn sample(&self, lat: f64, lon: f64) -> Result<Option<i16>> {
        if !is_valid_coord(lat, lon) {
            return Err(ElevationError::OutOfBounds { lat, lon });
        }

        let tile = self.cache.get(locate(lat, lon))?;
        sample_tile(tile.as_deref(), lat, lon)
    }

    /// Get the elevation for a single coordinate, without gap-filling.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(elevation))` - elevation in meters
    /// - `Ok(None)` - void data or missing tile
    /// - `Err(...)` - coordinates out of range, or a malformed tile
    pub fn get_elevation(&self, lat: f64, lon: f64) -> Result<Option<i16>> {
        Ok(self.sample(lat, lon)?.filter(|&v| v != VOID_VALUE))
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        self.cache.data_dir()
    }

    /// Get the cache budget.
    pub fn cache_budget(&self) -> CacheBudget {
        self.cache.budget()
    }

    /// The classification policy in use.
    pub fn policy(&self) -> ClassifyPolicy {
        self.policy
    }

    /// The gap-filling settings in use.
    pub fn gap_fill(&self) -> GapFill {
        self.gap_fill
    }

    /// Get a tile directly, loading it through the cache.
    pub fn tile(&self, id: TileId) -> Result<Option<Arc<SrtmTile>>> {
        self.cache.get(id)
    }

    /// Invalidate (remove) a specific tile from the cache.
    ///
    /// Accepts a filename (e.g., "N35E138.hgt"). Unparseable names are ignored.
    pub fn invalidate_tile(&self, filename: &str) {
        if let Some(id) = TileId::from_filename(filename) {
            self.cache.invalidate(id);
        }
    }

    /// Clear all tiles from the cache.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Tiles available in the data directory.
    pub fn scan_tile_files(&self) -> Vec<TileId> {
        self.cache.scan_tile_files()
    }

    /// Preload tiles into the cache, optionally restricted to bounding boxes.
    pub fn preload(&self, bounds: Option<&[BoundingBox]>) -> PreloadStats {
        self.cache.preload(bounds)
    }
}

/// Number of invalid samples per reason, in a stable order.
fn invalid_counts<'a>(
    classified: impl Iterator<Item = &'a Classified>,
) -> BTreeMap<InvalidReason, usize> {
    let mut counts = BTreeMap::new();
    for c in classified {
        if let Classified::Invalid(reason) = c {
            *counts.entry(*reason).or_insert(0) += 1;
        }
    }
    counts
}

fn sample_tile(tile: Option<&SrtmTile>, lat: f64, lon: f64) -> Result<Option<i16>> {
    tile.map(|tile| tile.sample(lat, lon)).transpose()
}

fn check_data_dir(path: &Path) -> Result<()> {
    let unavailable = |reason: String| ElevationError::DataUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(unavailable("not a directory".to_string())),
        Err(e) => Err(unavailable(e.to_string())),
    }
}

/// Builder for creating [`ElevationService`] with custom configuration.
///
/// # Example
///
/// ```ignore
/// use elevroute::ElevationServiceBuilder;
///
/// let service = ElevationServiceBuilder::new("/data/srtm")
///     .cache_bytes(512 * 1024 * 1024)
///     .treat_negative_as_invalid(false)
///     .build()?;
/// ```
pub struct ElevationServiceBuilder {
    data_dir: PathBuf,
    budget: CacheBudget,
    policy: ClassifyPolicy,
    sea_level_threshold: f64,
}

impl ElevationServiceBuilder {
    /// Create a new builder with the specified data directory.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            budget: CacheBudget::default(),
            policy: ClassifyPolicy::default(),
            sea_level_threshold: DEFAULT_SEA_LEVEL_THRESHOLD,
        }
    }

    /// Set the data directory.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = path.as_ref().to_path_buf();
        self
    }

    /// Set the maximum number of tiles to keep in cache.
    ///
    /// Default is 100 tiles.
    pub fn cache_size(mut self, size: u64) -> Self {
        self.budget = CacheBudget::Tiles(size);
        self
    }

    /// Bound the cache by total tile size in bytes instead of tile count.
    pub fn cache_bytes(mut self, bytes: u64) -> Self {
        self.budget = CacheBudget::Bytes(bytes);
        self
    }

    /// Treat negative samples as voids (default) or clamp them to sea level.
    pub fn treat_negative_as_invalid(mut self, yes: bool) -> Self {
        self.policy.treat_negative_as_invalid = yes;
        self
    }

    /// Elevation below which both gap neighbors count as water (default 5 m).
    pub fn sea_level_threshold(mut self, meters: f64) -> Self {
        self.sea_level_threshold = meters;
        self
    }

    /// Build the [`ElevationService`].
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::DataUnavailable`] if the data directory does
    /// not exist, is not a directory, or cannot be listed.
    pub fn build(self) -> Result<ElevationService> {
        check_data_dir(&self.data_dir)?;
        std::fs::read_dir(&self.data_dir).map_err(|e| ElevationError::DataUnavailable {
            path: self.data_dir.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(
            data_dir = %self.data_dir.display(),
            budget = ?self.budget,
            treat_negative_as_invalid = self.policy.treat_negative_as_invalid,
            sea_level_threshold = self.sea_level_threshold,
            "Building elevation service"
        );

        Ok(ElevationService {
            cache: TileCache::new(&self.data_dir, self.budget),
            policy: self.policy,
            gap_fill: GapFill {
                sea_level_threshold: self.sea_level_threshold,
            },
        })
    }
}
