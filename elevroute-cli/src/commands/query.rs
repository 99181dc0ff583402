use anyhow::Result;
use elevroute::{Classified, ElevationService, InvalidReason};
use serde::Serialize;

use crate::ServiceArgs;

#[derive(Debug, Serialize, PartialEq)]
struct QueryResponse {
    lat: f64,
    lon: f64,
    tile: String,
    /// Raw sample, including void and negative values.
    raw: Option<i16>,
    /// Usable elevation, absent when the point would be gap-filled.
    elevation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    invalid: Option<&'static str>,
}

pub fn run(args: &ServiceArgs, lat: f64, lon: f64, json: bool) -> Result<()> {
    let service = super::build_service(args)?;
    let response = query(&service, lat, lon);

    if json {
        println!("{}", serde_json::to_string(&response)?);
    } else {
        match (response.elevation, response.invalid) {
            (Some(elevation), _) => println!("{}", elevation),
            (None, Some(reason)) => println!("invalid ({})", reason),
            (None, None) => println!("invalid"),
        }
    }

    Ok(())
}

fn query(service: &ElevationService, lat: f64, lon: f64) -> QueryResponse {
    // One lookup; the cache already logs unreadable tiles
    let sample = service.sample(lat, lon);
    let classified = service.policy().classify(&sample);

    let tile = if elevroute::filename::is_valid_coord(lat, lon) {
        elevroute::locate(lat, lon).to_string()
    } else {
        "-".to_string()
    };

    QueryResponse {
        lat,
        lon,
        tile,
        raw: sample.ok().flatten(),
        elevation: classified.value(),
        invalid: match classified {
            Classified::Valid(_) => None,
            Classified::Invalid(reason) => Some(reason_name(reason)),
        },
    }
}

fn reason_name(reason: InvalidReason) -> &'static str {
    match reason {
        InvalidReason::TileNotFound => "tile not found",
        InvalidReason::OutOfBounds => "out of bounds",
        InvalidReason::Void => "void",
        InvalidReason::Negative => "negative",
        InvalidReason::Unreadable => "unreadable",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{args, write_tile};
    use elevroute::VOID_VALUE;
    use tempfile::TempDir;

    #[test]
    fn test_query_valid() {
        let temp_dir = TempDir::new().unwrap();
        write_tile(temp_dir.path(), "N35E138.hgt", 0, 3776);
        let service = super::super::build_service(&args(temp_dir.path())).unwrap();

        let response = query(&service, 35.5, 138.5);
        assert_eq!(
            response,
            QueryResponse {
                lat: 35.5,
                lon: 138.5,
                tile: "N35E138".to_string(),
                raw: Some(3776),
                elevation: Some(3776.0),
                invalid: None,
            }
        );
    }

    #[test]
    fn test_query_void_and_missing() {
        let temp_dir = TempDir::new().unwrap();
        write_tile(temp_dir.path(), "N35E138.hgt", 0, VOID_VALUE);
        let service = super::super::build_service(&args(temp_dir.path())).unwrap();

        let void = query(&service, 35.5, 138.5);
        assert_eq!(void.raw, Some(VOID_VALUE));
        assert_eq!(void.elevation, None);
        assert_eq!(void.invalid, Some("void"));

        let missing = query(&service, -12.5, -77.5);
        assert_eq!(missing.tile, "S13W078");
        assert_eq!(missing.raw, None);
        assert_eq!(missing.invalid, Some("tile not found"));
    }

    #[test]
    fn test_query_reads_tile_once() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("N35E138.hgt"), [0u8; 64]).unwrap();
        let service = super::super::build_service(&args(temp_dir.path())).unwrap();

        let response = query(&service, 35.5, 138.5);
        assert_eq!(response.raw, None);
        assert_eq!(response.invalid, Some("unreadable"));

        let stats = service.cache_stats();
        assert_eq!(stats.hit_count + stats.miss_count, 1);
    }

    #[test]
    fn test_query_out_of_range() {
        let temp_dir = TempDir::new().unwrap();
        let service = super::super::build_service(&args(temp_dir.path())).unwrap();

        let response = query(&service, 95.0, 0.0);
        assert_eq!(response.tile, "-");
        assert_eq!(response.invalid, Some("out of bounds"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["elevation"], serde_json::Value::Null);
    }
}
