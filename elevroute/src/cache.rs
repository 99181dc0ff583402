//! Bounded, thread-safe cache of loaded tiles.
//!
//! [`TileCache`] opens tiles from a data directory on first use and keeps
//! them in a moka cache, evicting least-recently-used tiles once the
//! configured [`CacheBudget`] is exceeded. Concurrent first lookups of the
//! same tile share a single load; lookups of different tiles never wait on
//! each other.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use moka::sync::Cache;

use crate::error::{ElevationError, Result};
use crate::filename::TileId;
use crate::tile::SrtmTile;

/// Default number of tiles kept in memory.
pub const DEFAULT_CACHE_TILES: u64 = 100;

/// Upper bound on cache contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBudget {
    /// Maximum number of tiles.
    Tiles(u64),
    /// Maximum total size of tile grids in bytes.
    Bytes(u64),
}

impl Default for CacheBudget {
    fn default() -> Self {
        CacheBudget::Tiles(DEFAULT_CACHE_TILES)
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of tiles currently in the cache.
    pub entry_count: u64,
    /// Number of cache hits (requests served from cache).
    pub hit_count: u64,
    /// Number of cache misses.
    pub miss_count: u64,
    /// Number of tile files actually opened.
    pub load_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// A geographic bounding box for filtering tiles during preload.
///
/// Coordinates are in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    /// Minimum latitude (southern boundary).
    pub min_lat: f64,
    /// Minimum longitude (western boundary).
    pub min_lon: f64,
    /// Maximum latitude (northern boundary).
    pub max_lat: f64,
    /// Maximum longitude (eastern boundary).
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a bounding box from its edges.
    ///
    /// # Arguments
    ///
    /// * `min_lat` - Southern edge
    /// * `min_lon` - Western edge
    /// * `max_lat` - Northern edge
    /// * `max_lon` - Eastern edge
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Smallest box containing every point of a route, or `None` for an empty route.
    pub fn around(route: &[(f64, f64)]) -> Option<Self> {
        let (&(lat, lon), rest) = route.split_first()?;
        let init = Self::new(lat, lon, lat, lon);

        Some(rest.iter().fold(init, |b, &(lat, lon)| Self {
            min_lat: b.min_lat.min(lat),
            min_lon: b.min_lon.min(lon),
            max_lat: b.max_lat.max(lat),
            max_lon: b.max_lon.max(lon),
        }))
    }

    /// Check if this bounding box overlaps with a 1°×1° tile.
    ///
    /// A tile covers `[lat, lat+1) × [lon, lon+1)`.
    pub fn overlaps_tile(&self, id: TileId) -> bool {
        let tile_max_lat = (id.lat + 1) as f64;
        let tile_max_lon = (id.lon + 1) as f64;

        self.min_lat < tile_max_lat
            && self.max_lat >= id.lat as f64
            && self.min_lon < tile_max_lon
            && self.max_lon >= id.lon as f64
    }
}

/// Statistics from a preload operation.
#[derive(Debug, Clone, Default)]
pub struct PreloadStats {
    /// Number of tiles successfully loaded into cache.
    pub tiles_loaded: u64,
    /// Number of tiles that were already in cache.
    pub tiles_already_cached: u64,
    /// Number of tiles that failed to load.
    pub tiles_failed: u64,
    /// Number of tiles that matched the bounding box filter.
    pub tiles_matched: u64,
    /// Total elapsed time in milliseconds.
    pub elapsed_ms: u64,
}

/// Thread-safe store of loaded tiles, keyed by [`TileId`].
pub struct TileCache {
    /// Directory containing .hgt / .hgt.zip files.
    data_dir: PathBuf,
    budget: CacheBudget,
    tiles: Cache<TileId, Arc<SrtmTile>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    load_count: AtomicU64,
}

impl TileCache {
    /// Create a cache reading tiles from `data_dir`.
    ///
    /// The directory is not checked here; see
    /// [`ElevationServiceBuilder::build`](crate::ElevationServiceBuilder::build).
    pub fn new<P: AsRef<Path>>(data_dir: P, budget: CacheBudget) -> Self {
        let tiles = match budget {
            CacheBudget::Tiles(n) => Cache::builder().max_capacity(n).build(),
            CacheBudget::Bytes(bytes) => Cache::builder()
                .max_capacity(bytes)
                .weigher(|_id: &TileId, tile: &Arc<SrtmTile>| {
                    u32::try_from(tile.byte_len()).unwrap_or(u32::MAX)
                })
                .build(),
        };

        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            budget,
            tiles,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            load_count: AtomicU64::new(0),
        }
    }

    /// Get a tile, loading it on first access.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(tile))` - the tile, shared with every other caller
    /// - `Ok(None)` - no file exists for this tile
    /// - `Err(MalformedTile)` - the file exists but could not be loaded
    pub fn get(&self, id: TileId) -> Result<Option<Arc<SrtmTile>>> {
        if let Some(tile) = self.tiles.get(&id) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(tile));
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);

        // Concurrent misses on the same key wait for one load
        match self.tiles.try_get_with(id, || self.load(id).map(Arc::new)) {
            Ok(tile) => Ok(Some(tile)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(source) => {
                tracing::warn!(tile = %id, error = %source, "Failed to load tile");
                Err(ElevationError::MalformedTile { id, source })
            }
        }
    }

    /// Open the backing file for a tile: `.hgt` first, then `.hgt.zip`.
    fn load(&self, id: TileId) -> Result<SrtmTile> {
        let path = self.data_dir.join(id.filename());
        let zip_path = self.data_dir.join(id.zip_filename());

        let tile = if path.is_file() {
            self.load_count.fetch_add(1, Ordering::Relaxed);
            SrtmTile::from_file_with_id(&path, id)?
        } else if zip_path.is_file() {
            self.load_count.fetch_add(1, Ordering::Relaxed);
            SrtmTile::from_zip(&zip_path, id)?
        } else {
            return Err(ElevationError::FileNotFound { path });
        };

        tracing::debug!(
            tile = %id,
            resolution = ?tile.resolution(),
            mapped = tile.is_mapped(),
            "Loaded tile"
        );

        Ok(tile)
    }

    /// Returns `true` if the tile is currently cached.
    pub fn contains(&self, id: TileId) -> bool {
        self.tiles.contains_key(&id)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.tiles.run_pending_tasks();

        CacheStats {
            entry_count: self.tiles.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            load_count: self.load_count.load(Ordering::Relaxed),
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the configured budget.
    pub fn budget(&self) -> CacheBudget {
        self.budget
    }

    /// Remove a specific tile from the cache.
    pub fn invalidate(&self, id: TileId) {
        self.tiles.invalidate(&id);
    }

    /// Clear all tiles from the cache.
    pub fn clear(&self) {
        self.tiles.invalidate_all();
    }

    /// Scan the data directory for `.hgt` and `.hgt.zip` tiles.
    ///
    /// Returns a sorted, deduplicated list of tile identifiers. Only the exact
    /// names [`get`](Self::get) opens are reported (`N35E138.hgt`,
    /// `N35E138.hgt.zip`); anything else, including lowercase names, is ignored.
    pub fn scan_tile_files(&self) -> Vec<TileId> {
        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let ids: BTreeSet<TileId> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                let id = TileId::from_filename(name)?;
                (name == id.filename() || name == id.zip_filename()).then_some(id)
            })
            .collect();

        ids.into_iter().collect()
    }

    /// Preload tiles into the cache.
    ///
    /// Loads every tile found in the data directory, or only those that
    /// overlap at least one of `bounds`.
    pub fn preload(&self, bounds: Option<&[BoundingBox]>) -> PreloadStats {
        let start = Instant::now();
        let mut stats = PreloadStats::default();

        for id in self.scan_tile_files() {
            if let Some(boxes) = bounds {
                if !boxes.iter().any(|b| b.overlaps_tile(id)) {
                    continue;
                }
            }
            stats.tiles_matched += 1;

            if self.contains(id) {
                stats.tiles_already_cached += 1;
                continue;
            }

            match self.get(id) {
                Ok(Some(_)) => stats.tiles_loaded += 1,
                Ok(None) | Err(_) => stats.tiles_failed += 1,
            }
        }

        stats.elapsed_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            tiles_loaded = stats.tiles_loaded,
            tiles_already_cached = stats.tiles_already_cached,
            tiles_failed = stats.tiles_failed,
            elapsed_ms = stats.elapsed_ms,
            "Preload complete"
        );

        stats
    }
}
