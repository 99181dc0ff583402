//! SRTM tile parsing and pixel sampling.
//!
//! This module provides the [`SrtmTile`] struct for reading SRTM `.hgt` files
//! (raw or zipped) and sampling single elevation values at coordinates
//! through the tile's [`GeoTransform`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{ElevationError, Result};
use crate::filename::TileId;

/// File size for SRTM1 (1 arc-second, ~30m resolution): 3601 × 3601 × 2 bytes
const SRTM1_SIZE: usize = 3601 * 3601 * 2; // 25,934,402 bytes

/// File size for SRTM3 (3 arc-second, ~90m resolution): 1201 × 1201 × 2 bytes
const SRTM3_SIZE: usize = 1201 * 1201 * 2; // 2,884,802 bytes

/// Number of samples per row/column for SRTM1
const SRTM1_SAMPLES: usize = 3601;

/// Number of samples per row/column for SRTM3
const SRTM3_SAMPLES: usize = 1201;

/// Value indicating no data (void) in SRTM files
pub const VOID_VALUE: i16 = -32768;

/// Resolution type of an SRTM tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrtmResolution {
    /// SRTM1: 1 arc-second (~30m) resolution
    Srtm1,
    /// SRTM3: 3 arc-second (~90m) resolution
    Srtm3,
}

impl SrtmResolution {
    /// Detect the resolution from the byte length of a raw `.hgt` grid.
    pub fn from_len(len: usize) -> Result<Self> {
        match len {
            SRTM1_SIZE => Ok(SrtmResolution::Srtm1),
            SRTM3_SIZE => Ok(SrtmResolution::Srtm3),
            size => Err(ElevationError::InvalidFileSize { size }),
        }
    }

    /// Returns the number of samples per row/column for this resolution.
    pub fn samples(&self) -> usize {
        match self {
            SrtmResolution::Srtm1 => SRTM1_SAMPLES,
            SrtmResolution::Srtm3 => SRTM3_SAMPLES,
        }
    }

    /// Returns the approximate resolution in meters.
    pub fn meters(&self) -> f64 {
        match self {
            SrtmResolution::Srtm1 => 30.0,
            SrtmResolution::Srtm3 => 90.0,
        }
    }
}

/// North-up affine transform from geographic coordinates to raster pixels.
///
/// `origin_x`/`origin_y` is the outer corner of the top-left pixel. Rows grow
/// southward, so `pixel_size_y` is negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_size_x: f64,
    pub pixel_size_y: f64,
}

impl GeoTransform {
    /// Transform of an `.hgt` grid with `samples` rows and columns.
    ///
    /// HGT sample centers sit on whole arc-second multiples and the outer
    /// rows/columns overlap the neighboring tiles, so each pixel extends half
    /// a sample beyond the 1° cell on every side.
    pub fn for_hgt(id: TileId, samples: usize) -> Self {
        let pixel = 1.0 / (samples - 1) as f64;

        Self {
            origin_x: id.lon as f64 - pixel / 2.0,
            origin_y: (id.lat + 1) as f64 + pixel / 2.0,
            pixel_size_x: pixel,
            pixel_size_y: -pixel,
        }
    }

    /// Integer (row, col) of the pixel containing the coordinate.
    ///
    /// Not bounds-checked; may be negative. `None` for non-finite input.
    pub fn pixel_offset(&self, lat: f64, lon: f64) -> Option<(i64, i64)> {
        let col = ((lon - self.origin_x) / self.pixel_size_x).floor();
        let row = ((lat - self.origin_y) / self.pixel_size_y).floor();

        if col.is_finite() && row.is_finite() {
            Some((row as i64, col as i64))
        } else {
            None
        }
    }
}

/// Backing bytes of a tile.
#[derive(Debug)]
enum SampleStore {
    /// Memory-mapped `.hgt` file.
    Mapped(Mmap),
    /// Grid decompressed from a `.hgt.zip` archive.
    Owned(Box<[u8]>),
}

impl AsRef<[u8]> for SampleStore {
    fn as_ref(&self) -> &[u8] {
        match self {
            SampleStore::Mapped(mmap) => &mmap[..],
            SampleStore::Owned(bytes) => &bytes[..],
        }
    }
}

/// Summary of the samples in a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileStats {
    /// Lowest non-void sample, `None` if the tile is entirely void.
    pub min: Option<i16>,
    /// Highest non-void sample, `None` if the tile is entirely void.
    pub max: Option<i16>,
    /// Number of void samples.
    pub void_count: u64,
}

/// A loaded, immutable SRTM tile.
///
/// # Example
///
/// ```ignore
/// use elevroute::SrtmTile;
///
/// let tile = SrtmTile::from_file("N35E138.hgt")?;
/// let raw = tile.sample(35.5, 138.5)?;
/// println!("Raw sample: {}", raw);
/// ```
#[derive(Debug)]
pub struct SrtmTile {
    id: TileId,
    data: SampleStore,
    samples: usize,
    resolution: SrtmResolution,
    transform: GeoTransform,
}

impl SrtmTile {
    /// Load a tile from a `.hgt` file named after its southwest corner.
    ///
    /// The resolution (SRTM1 vs SRTM3) is automatically detected from the file size.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The filename does not encode a tile
    /// - The file cannot be opened or memory-mapped
    /// - The file size doesn't match SRTM1 or SRTM3 format
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let id = tile_id_from_path(path)?;
        Self::from_file_with_id(path, id)
    }

    /// Load a `.hgt` file with an explicit tile identifier.
    ///
    /// This is useful when the filename doesn't follow the standard naming convention.
    pub fn from_file_with_id<P: AsRef<Path>>(path: P, id: TileId) -> Result<Self> {
        let file = File::open(&path)?;

        // SAFETY: Memory mapping is safe as long as the file is not modified
        // while mapped. We open the file read-only and never write tiles.
        let mmap = unsafe { Mmap::map(&file)? };

        Self::from_store(SampleStore::Mapped(mmap), id)
    }

    /// Load a tile from a `.hgt.zip` archive.
    ///
    /// The first `.hgt` entry is decompressed into memory; nothing is written
    /// to disk.
    pub fn from_zip<P: AsRef<Path>>(path: P, id: TileId) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |reason: String| ElevationError::InvalidArchive {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path)?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| invalid(e.to_string()))?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| invalid(e.to_string()))?;
            if !entry.name().to_ascii_lowercase().ends_with(".hgt") {
                continue;
            }

            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes)?;
            return Self::from_bytes(bytes, id);
        }

        Err(invalid("no .hgt entry".to_string()))
    }

    /// Build a tile from a raw big-endian grid held in memory.
    pub fn from_bytes(bytes: Vec<u8>, id: TileId) -> Result<Self> {
        Self::from_store(SampleStore::Owned(bytes.into_boxed_slice()), id)
    }

    fn from_store(data: SampleStore, id: TileId) -> Result<Self> {
        let resolution = SrtmResolution::from_len(data.as_ref().len())?;
        let samples = resolution.samples();

        Ok(Self {
            id,
            data,
            samples,
            resolution,
            transform: GeoTransform::for_hgt(id, samples),
        })
    }

    /// Bounds-checked pixel (row, col) for the coordinate.
    ///
    /// Returns `None` when the coordinate maps outside the raster.
    pub fn pixel_offset(&self, lat: f64, lon: f64) -> Option<(usize, usize)> {
        let (row, col) = self.transform.pixel_offset(lat, lon)?;
        let size = self.samples as i64;

        if (0..size).contains(&row) && (0..size).contains(&col) {
            Some((row as usize, col as usize))
        } else {
            None
        }
    }

    /// Read the raw sample of the pixel containing the coordinate.
    ///
    /// This is a nearest-pixel read. The result may be [`VOID_VALUE`].
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::OutOfBounds`] if the coordinate lies outside
    /// this tile's raster.
    pub fn sample(&self, lat: f64, lon: f64) -> Result<i16> {
        let (row, col) = self
            .pixel_offset(lat, lon)
            .ok_or(ElevationError::OutOfBounds { lat, lon })?;

        Ok(self.sample_at(row, col))
    }

    /// Raw sample at a row/column inside the raster (row 0 = north edge).
    fn sample_at(&self, row: usize, col: usize) -> i16 {
        // 2 bytes per sample, row-major order
        let offset = (row * self.samples + col) * 2;
        let data = self.data.as_ref();

        i16::from_be_bytes([data[offset], data[offset + 1]])
    }

    /// Scan every sample and summarize the tile.
    pub fn stats(&self) -> TileStats {
        let mut min: Option<i16> = None;
        let mut max: Option<i16> = None;
        let mut void_count = 0;

        for pair in self.data.as_ref().chunks_exact(2) {
            let v = i16::from_be_bytes([pair[0], pair[1]]);
            if v == VOID_VALUE {
                void_count += 1;
                continue;
            }
            min = Some(min.map_or(v, |m| m.min(v)));
            max = Some(max.map_or(v, |m| m.max(v)));
        }

        TileStats {
            min,
            max,
            void_count,
        }
    }

    /// Returns the identifier of this tile.
    pub fn id(&self) -> TileId {
        self.id
    }

    /// Returns the resolution of this tile.
    pub fn resolution(&self) -> SrtmResolution {
        self.resolution
    }

    /// Returns the number of samples per row/column.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Returns the affine transform of this tile.
    pub fn transform(&self) -> GeoTransform {
        self.transform
    }

    /// Size of the sample grid in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.as_ref().len()
    }

    /// Returns `true` if the grid is memory-mapped rather than held in memory.
    pub fn is_mapped(&self) -> bool {
        matches!(self.data, SampleStore::Mapped(_))
    }
}

fn tile_id_from_path(path: &Path) -> Result<TileId> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(TileId::from_filename)
        .ok_or_else(|| ElevationError::InvalidTileName {
            path: path.to_path_buf(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    /// SRTM3 grid with known elevation values
    fn srtm3_grid() -> Vec<u8> {
        let mut data = vec![0u8; SRTM3_SIZE];

        let mut set = |row: usize, col: usize, v: i16| {
            let offset = (row * SRTM3_SAMPLES + col) * 2;
            data[offset..offset + 2].copy_from_slice(&v.to_be_bytes());
        };

        set(0, 0, 1000); // northwest corner
        set(600, 600, 500); // center
        set(1200, 1200, 100); // southeast corner
        set(1200, 0, 250); // southwest corner
        set(10, 10, VOID_VALUE);

        data
    }

    fn write_tile(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(&srtm3_grid()).unwrap();
        path
    }

    #[test]
    fn test_load_srtm3_file() {
        let dir = TempDir::new().unwrap();
        let path = write_tile(dir.path(), "N35E138.hgt");
        let tile = SrtmTile::from_file(path).unwrap();

        assert_eq!(tile.id(), TileId::new(35, 138));
        assert_eq!(tile.resolution(), SrtmResolution::Srtm3);
        assert_eq!(tile.samples(), SRTM3_SAMPLES);
        assert_eq!(tile.byte_len(), SRTM3_SIZE);
        assert!(tile.is_mapped());
    }

    #[test]
    fn test_invalid_file_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("N35E138.hgt");
        File::create(&path).unwrap().write_all(&[0u8; 1000]).unwrap();

        match SrtmTile::from_file(&path) {
            Err(ElevationError::InvalidFileSize { size }) => assert_eq!(size, 1000),
            _ => panic!("Expected InvalidFileSize error"),
        }
    }

    #[test]
    fn test_invalid_tile_name() {
        let dir = TempDir::new().unwrap();
        let path = write_tile(dir.path(), "tile.hgt");

        assert!(matches!(
            SrtmTile::from_file(&path),
            Err(ElevationError::InvalidTileName { .. })
        ));
    }

    #[test]
    fn test_hgt_transform() {
        let t = GeoTransform::for_hgt(TileId::new(35, -118), SRTM3_SAMPLES);
        let half = 0.5 / 1200.0;

        assert!((t.origin_x - (-118.0 - half)).abs() < 1e-12);
        assert!((t.origin_y - (36.0 + half)).abs() < 1e-12);
        assert!(t.pixel_size_y < 0.0);
        assert_eq!(t.pixel_size_x, -t.pixel_size_y);
    }

    #[test]
    fn test_sample_corners() {
        let tile = SrtmTile::from_bytes(srtm3_grid(), TileId::new(35, 138)).unwrap();

        assert_eq!(tile.sample(36.0, 138.0).unwrap(), 1000);
        assert_eq!(tile.sample(35.5, 138.5).unwrap(), 500);
        assert_eq!(tile.sample(35.0, 138.0).unwrap(), 250);
        assert_eq!(tile.sample(35.0, 139.0).unwrap(), 100);
    }

    #[test]
    fn test_sample_edges_stay_in_bounds() {
        let tile = SrtmTile::from_bytes(srtm3_grid(), TileId::new(35, 138)).unwrap();

        // The Locator sends exact lower edges here; they hit the last row / first column
        assert_eq!(tile.pixel_offset(35.0, 138.0), Some((1200, 0)));
        assert_eq!(tile.pixel_offset(35.999_999_9, 138.999_999_9), Some((0, 1200)));
    }

    #[test]
    fn test_sample_out_of_bounds() {
        let tile = SrtmTile::from_bytes(srtm3_grid(), TileId::new(35, 138)).unwrap();

        assert!(matches!(
            tile.sample(37.0, 138.5),
            Err(ElevationError::OutOfBounds { .. })
        ));
        assert!(tile.sample(35.5, 137.5).is_err());
        assert!(tile.sample(f64::NAN, 138.5).is_err());
    }

    #[test]
    fn test_sample_void() {
        let tile = SrtmTile::from_bytes(srtm3_grid(), TileId::new(35, 138)).unwrap();
        let step = 1.0 / 1200.0;

        let raw = tile.sample(36.0 - 10.0 * step, 138.0 + 10.0 * step).unwrap();
        assert_eq!(raw, VOID_VALUE);
    }

    #[test]
    fn test_from_zip() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("N35E138.hgt.zip");
        let mut writer = zip::ZipWriter::new(File::create(&zip_path).unwrap());
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        writer.start_file("N35E138.hgt", options).unwrap();
        writer.write_all(&srtm3_grid()).unwrap();
        writer.finish().unwrap();

        let tile = SrtmTile::from_zip(&zip_path, TileId::new(35, 138)).unwrap();
        assert!(!tile.is_mapped());
        assert_eq!(tile.sample(35.5, 138.5).unwrap(), 500);
        assert!(!dir.path().join("N35E138.hgt").exists());
    }

    #[test]
    fn test_from_zip_without_hgt_entry() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("N35E138.hgt.zip");
        let mut writer = zip::ZipWriter::new(File::create(&zip_path).unwrap());
        writer
            .start_file("readme.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"nothing here").unwrap();
        writer.finish().unwrap();

        assert!(matches!(
            SrtmTile::from_zip(&zip_path, TileId::new(35, 138)),
            Err(ElevationError::InvalidArchive { .. })
        ));
    }

    #[test]
    fn test_stats() {
        let tile = SrtmTile::from_bytes(srtm3_grid(), TileId::new(35, 138)).unwrap();
        let stats = tile.stats();

        assert_eq!(stats.min, Some(0));
        assert_eq!(stats.max, Some(1000));
        assert_eq!(stats.void_count, 1);
    }

    #[test]
    fn test_resolution_info() {
        assert_eq!(SrtmResolution::Srtm1.samples(), 3601);
        assert_eq!(SrtmResolution::Srtm3.samples(), 1201);
        assert_eq!(SrtmResolution::Srtm1.meters(), 30.0);
        assert_eq!(SrtmResolution::from_len(SRTM3_SIZE).unwrap(), SrtmResolution::Srtm3);
        assert!(SrtmResolution::from_len(12).is_err());
    }
}
