//! GeoJSON elevation enrichment.
//!
//! Adds gap-filled elevation profiles to GeoJSON geometries. Enable the
//! `geojson` feature to use this module.
//!
//! Every coordinate sequence (a LineString, a polygon ring, the points of a
//! MultiPoint) is treated as one route, so voids inside a line are filled
//! from the neighbors on that same line. A lone Point is a route of one.
//!
//! ```ignore
//! use elevroute::ElevationService;
//! use elevroute::geojson::add_profile_to_geometry;
//! use geojson::Geometry;
//!
//! let service = ElevationService::new("/path/to/hgt/files", 100)?;
//!
//! let line: Geometry = r#"{
//!     "type": "LineString",
//!     "coordinates": [[138.5, 35.5], [138.6, 35.6]]
//! }"#.parse().unwrap();
//!
//! let enriched = add_profile_to_geometry(&service, line)?;
//! // [[138.5, 35.5, 500.0], [138.6, 35.6, 750.0]]
//! ```

use geojson::{Geometry, Value as GeoJsonValue};

use crate::error::{ElevationError, Result};
use crate::ElevationService;

/// Add elevations to all coordinates in a GeoJSON geometry.
///
/// Input coordinates are in GeoJSON order, `[longitude, latitude]` or
/// `[longitude, latitude, altitude]`. Output coordinates are
/// `[longitude, latitude, elevation]`; any existing altitude is replaced.
///
/// # Errors
///
/// Returns an error if a coordinate has fewer than 2 elements, or if the
/// service's data directory has become unavailable. Missing data never fails.
pub fn add_profile_to_geometry(service: &ElevationService, geometry: Geometry) -> Result<Geometry> {
    let new_value = match geometry.value {
        GeoJsonValue::Point(coord) => {
            let mut elevated = add_profile_to_positions(service, std::slice::from_ref(&coord))?;
            GeoJsonValue::Point(elevated.remove(0))
        }
        GeoJsonValue::MultiPoint(coords) => {
            GeoJsonValue::MultiPoint(add_profile_to_positions(service, &coords)?)
        }
        GeoJsonValue::LineString(coords) => {
            GeoJsonValue::LineString(add_profile_to_positions(service, &coords)?)
        }
        GeoJsonValue::MultiLineString(lines) => {
            let elevated: Result<Vec<_>> = lines
                .iter()
                .map(|line| add_profile_to_positions(service, line))
                .collect();
            GeoJsonValue::MultiLineString(elevated?)
        }
        GeoJsonValue::Polygon(rings) => {
            let elevated: Result<Vec<_>> = rings
                .iter()
                .map(|ring| add_profile_to_positions(service, ring))
                .collect();
            GeoJsonValue::Polygon(elevated?)
        }
        GeoJsonValue::MultiPolygon(polygons) => {
            let elevated: Result<Vec<_>> = polygons
                .iter()
                .map(|polygon| {
                    polygon
                        .iter()
                        .map(|ring| add_profile_to_positions(service, ring))
                        .collect::<Result<Vec<_>>>()
                })
                .collect();
            GeoJsonValue::MultiPolygon(elevated?)
        }
        GeoJsonValue::GeometryCollection(geometries) => {
            let elevated: Result<Vec<_>> = geometries
                .into_iter()
                .map(|g| add_profile_to_geometry(service, g))
                .collect();
            GeoJsonValue::GeometryCollection(elevated?)
        }
    };

    Ok(Geometry::new(new_value))
}

/// Convert GeoJSON positions (`[lon, lat, ...]`) into a `(lat, lon)` route.
pub fn positions_to_route(coords: &[Vec<f64>]) -> Result<Vec<(f64, f64)>> {
    coords
        .iter()
        .map(|coord| match coord.as_slice() {
            [lon, lat, ..] => Ok((*lat, *lon)),
            _ => Err(ElevationError::InvalidCoordinate { len: coord.len() }),
        })
        .collect()
}

/// Treat a sequence of positions as one route and append its profile.
pub fn add_profile_to_positions(
    service: &ElevationService,
    coords: &[Vec<f64>],
) -> Result<Vec<Vec<f64>>> {
    let route = positions_to_route(coords)?;
    let profile = service.get_elevation_profile(&route)?;

    Ok(route
        .iter()
        .zip(profile)
        .map(|(&(lat, lon), elevation)| vec![lon, lat, elevation])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::VOID_VALUE;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    const SRTM3_SIZE: usize = 1201 * 1201 * 2;
    const SRTM3_SAMPLES: usize = 1201;

    /// Tile filled with `base`, with `center` at row 600, col 600
    fn create_test_tile(dir: &Path, filename: &str, base: i16, center: i16) {
        let mut data = base.to_be_bytes().repeat(SRTM3_SAMPLES * SRTM3_SAMPLES);

        let center_offset = (600 * SRTM3_SAMPLES + 600) * 2;
        data[center_offset..center_offset + 2].copy_from_slice(&center.to_be_bytes());

        let mut file = fs::File::create(dir.join(filename)).unwrap();
        file.write_all(&data).unwrap();
        assert_eq!(data.len(), SRTM3_SIZE);
    }

    #[test]
    fn test_positions_to_route() {
        let route = positions_to_route(&[vec![138.5, 35.5], vec![-77.1, -12.3, 80.0]]).unwrap();
        assert_eq!(route, vec![(35.5, 138.5), (-12.3, -77.1)]);

        assert!(matches!(
            positions_to_route(&[vec![138.5]]),
            Err(ElevationError::InvalidCoordinate { len: 1 })
        ));
    }

    #[test]
    fn test_point() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "N35E138.hgt", 0, 500);
        let service = ElevationService::new(temp_dir.path(), 10).unwrap();

        let geometry = Geometry::new(GeoJsonValue::Point(vec![138.5, 35.5, 12.0]));
        let result = add_profile_to_geometry(&service, geometry).unwrap();

        match result.value {
            GeoJsonValue::Point(coord) => assert_eq!(coord, vec![138.5, 35.5, 500.0]),
            _ => panic!("Expected Point geometry"),
        }
    }

    #[test]
    fn test_linestring_fills_void() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "N35E138.hgt", 100, VOID_VALUE);
        let service = ElevationService::new(temp_dir.path(), 10).unwrap();

        let geometry = Geometry::new(GeoJsonValue::LineString(vec![
            vec![138.4, 35.4],
            vec![138.5, 35.5],
            vec![138.6, 35.6],
        ]));
        let result = add_profile_to_geometry(&service, geometry).unwrap();

        match result.value {
            GeoJsonValue::LineString(coords) => {
                let elevations: Vec<f64> = coords.iter().map(|c| c[2]).collect();
                assert_eq!(elevations, vec![100.0, 100.0, 100.0]);
            }
            _ => panic!("Expected LineString geometry"),
        }
    }

    #[test]
    fn test_rings_are_separate_routes() {
        let temp_dir = TempDir::new().unwrap();
        let service = ElevationService::new(temp_dir.path(), 10).unwrap();

        let ring = vec![
            vec![138.5, 35.5],
            vec![138.6, 35.5],
            vec![138.55, 35.6],
            vec![138.5, 35.5],
        ];
        let geometry =
            Geometry::new(GeoJsonValue::MultiPolygon(vec![vec![ring.clone()], vec![ring]]));
        let result = add_profile_to_geometry(&service, geometry).unwrap();

        match result.value {
            GeoJsonValue::MultiPolygon(polygons) => {
                assert_eq!(polygons.len(), 2);
                for coord in polygons.iter().flatten().flatten() {
                    assert_eq!(coord.len(), 3);
                    assert_eq!(coord[2], 0.0);
                }
            }
            _ => panic!("Expected MultiPolygon geometry"),
        }
    }

    #[test]
    fn test_geometry_collection() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "N35E138.hgt", 0, 500);
        let service = ElevationService::new(temp_dir.path(), 10).unwrap();

        let geometry = Geometry::new(GeoJsonValue::GeometryCollection(vec![
            Geometry::new(GeoJsonValue::Point(vec![138.5, 35.5])),
            Geometry::new(GeoJsonValue::MultiLineString(vec![vec![
                vec![138.5, 35.5],
                vec![138.6, 35.6],
            ]])),
        ]));
        let result = add_profile_to_geometry(&service, geometry).unwrap();

        match result.value {
            GeoJsonValue::GeometryCollection(geometries) => assert_eq!(geometries.len(), 2),
            _ => panic!("Expected GeometryCollection"),
        }
    }

    #[test]
    fn test_invalid_coordinate() {
        let temp_dir = TempDir::new().unwrap();
        let service = ElevationService::new(temp_dir.path(), 10).unwrap();

        let geometry = Geometry::new(GeoJsonValue::LineString(vec![vec![138.5]]));
        assert!(add_profile_to_geometry(&service, geometry).is_err());
    }
}
