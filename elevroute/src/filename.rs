//! Tile location and SRTM filename utilities.
//!
//! This module maps coordinates to the 1° × 1° tile that contains them and
//! converts between tile identifiers and `.hgt` filenames.
//!
//! # Filename Format
//!
//! SRTM files follow the naming convention: `{N|S}{lat}{E|W}{lon}.hgt`
//!
//! - Latitude: 2 digits with N/S prefix (e.g., N35, S12)
//! - Longitude: 3 digits with E/W prefix (e.g., E138, W077)
//!
//! The filename represents the **southwest corner** of the 1° × 1° tile, so
//! the digits are the whole-degree floor of the coordinate, not a truncation:
//! `-12.3` lives in the tile whose southern edge is `-13`, named `S13`.

use std::fmt;

/// Extension of raw SRTM tiles.
pub const HGT_EXTENSION: &str = "hgt";

/// Identifier of a 1° × 1° tile, keyed by its southwest corner in whole degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    /// Latitude of the southern edge.
    pub lat: i32,
    /// Longitude of the western edge.
    pub lon: i32,
}

impl TileId {
    /// Create a tile identifier from its southwest corner.
    pub fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    /// The `.hgt` filename for this tile (e.g., "N35E138.hgt").
    pub fn filename(&self) -> String {
        format!("{}.{}", self, HGT_EXTENSION)
    }

    /// The `.hgt.zip` filename for this tile (e.g., "N35E138.hgt.zip").
    pub fn zip_filename(&self) -> String {
        format!("{}.{}.zip", self, HGT_EXTENSION)
    }

    /// Parse a tile identifier from a filename.
    ///
    /// Accepts a bare name, a `.hgt` or `.hgt.zip` filename, with or without
    /// a leading path.
    pub fn from_filename(filename: &str) -> Option<Self> {
        filename_to_lat_lon(filename).map(|(lat, lon)| Self::new(lat, lon))
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat_prefix = if self.lat >= 0 { 'N' } else { 'S' };
        let lon_prefix = if self.lon >= 0 { 'E' } else { 'W' };

        write!(
            f,
            "{}{:02}{}{:03}",
            lat_prefix,
            self.lat.unsigned_abs(),
            lon_prefix,
            self.lon.unsigned_abs()
        )
    }
}

/// Locate the tile containing the given coordinates.
///
/// This is a total function: any pair of numbers maps to some identifier.
/// Whether a file exists for it is the cache's concern.
///
/// # Examples
///
/// ```
/// use elevroute::filename::{locate, TileId};
///
/// assert_eq!(locate(35.5, 138.7), TileId::new(35, 138));
/// assert_eq!(locate(-12.3, -77.1), TileId::new(-13, -78));
/// assert_eq!(locate(35.0, -118.0).to_string(), "N35W118");
/// ```
pub fn locate(lat: f64, lon: f64) -> TileId {
    TileId::new(lat.floor() as i32, lon.floor() as i32)
}

/// Convert latitude and longitude to an SRTM `.hgt` filename.
///
/// # Examples
///
/// ```
/// use elevroute::filename::lat_lon_to_filename;
///
/// assert_eq!(lat_lon_to_filename(35.5, 138.7), "N35E138.hgt");
/// assert_eq!(lat_lon_to_filename(-12.3, -77.1), "S13W078.hgt");
/// assert_eq!(lat_lon_to_filename(0.5, -0.5), "N00W001.hgt");
/// ```
pub fn lat_lon_to_filename(lat: f64, lon: f64) -> String {
    locate(lat, lon).filename()
}

/// Parse an SRTM filename to extract the base coordinates.
///
/// # Returns
///
/// The (latitude, longitude) of the southwest corner, or `None` if parsing fails.
///
/// # Examples
///
/// ```
/// use elevroute::filename::filename_to_lat_lon;
///
/// assert_eq!(filename_to_lat_lon("N35E138.hgt"), Some((35, 138)));
/// assert_eq!(filename_to_lat_lon("S12W077.hgt.zip"), Some((-12, -77)));
/// assert_eq!(filename_to_lat_lon("/path/to/N00E000.hgt"), Some((0, 0)));
/// assert_eq!(filename_to_lat_lon("invalid"), None);
/// ```
pub fn filename_to_lat_lon(filename: &str) -> Option<(i32, i32)> {
    // Extract just the filename if a path is given
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let name = name.strip_suffix(".zip").unwrap_or(name);
    let name = name
        .strip_suffix(".hgt")
        .or_else(|| name.strip_suffix(".HGT"))
        .unwrap_or(name);

    // Must be exactly 7 ASCII characters: N00E000
    if name.len() != 7 || !name.is_ascii() {
        return None;
    }

    let bytes = name.as_bytes();

    let lat_sign = match bytes[0] {
        b'N' | b'n' => 1,
        b'S' | b's' => -1,
        _ => return None,
    };
    let lat: i32 = parse_digits(&name[1..3])?;

    let lon_sign = match bytes[3] {
        b'E' | b'e' => 1,
        b'W' | b'w' => -1,
        _ => return None,
    };
    let lon: i32 = parse_digits(&name[4..7])?;

    Some((lat * lat_sign, lon * lon_sign))
}

fn parse_digits(s: &str) -> Option<i32> {
    if s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// Validate that coordinates are on the globe.
///
/// Rejects NaN and infinities along with out-of-range values.
pub fn is_valid_coord(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}
