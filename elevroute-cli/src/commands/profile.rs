use anyhow::{bail, Context, Result};
use elevroute::geojson::add_profile_to_geometry;
use elevroute::ElevationService;
use geojson::GeoJson;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::ServiceArgs;

/// Route body: points in `[lat, lng]` order.
#[derive(Debug, Deserialize)]
struct RouteRequest {
    points: Vec<[f64; 2]>,
}

#[derive(Debug, Serialize)]
struct RouteResponse {
    elevations: Vec<f64>,
}

pub fn run(
    args: &ServiceArgs,
    input: PathBuf,
    output: Option<PathBuf>,
    lat_col: &str,
    lon_col: &str,
) -> Result<()> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if !matches!(extension.as_str(), "csv" | "json" | "geojson") {
        bail!(
            "Unsupported file format: {}. Use .csv, .json or .geojson",
            extension
        );
    }

    let service = super::build_service(args)?;

    let reader = BufReader::new(File::open(&input).context("Failed to open input file")?);
    let output_path = output.unwrap_or_else(|| derived_output(&input, &extension));
    let mut writer =
        BufWriter::new(File::create(&output_path).context("Failed to create output file")?);

    let points = match extension.as_str() {
        "csv" => profile_csv(&service, reader, &mut writer, lat_col, lon_col)?,
        "json" => profile_route_json(&service, reader, &mut writer)?,
        _ => {
            let geojson: GeoJson =
                serde_json::from_reader(reader).context("Failed to parse GeoJSON")?;
            let enriched = profile_geojson(&service, geojson)?;
            serde_json::to_writer_pretty(&mut writer, &enriched)?;
            0
        }
    };
    writer.flush()?;

    let stats = service.cache_stats();
    tracing::info!(
        points,
        tiles_loaded = stats.load_count,
        hit_rate = stats.hit_rate(),
        "Profile complete"
    );

    println!("Output written to: {}", output_path.display());
    Ok(())
}

fn derived_output(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "route".to_string());
    input.with_file_name(format!("{}_elevation.{}", stem, extension))
}

fn progress_bar(len: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Treat the CSV rows as one route and append an `elevation` column.
///
/// Returns the number of rows written.
fn profile_csv<R: Read, W: Write>(
    service: &ElevationService,
    input: R,
    output: W,
    lat_col: &str,
    lon_col: &str,
) -> Result<usize> {
    let mut reader = csv::Reader::from_reader(input);

    let headers = reader.headers()?.clone();
    let lat_idx = headers
        .iter()
        .position(|h| h == lat_col)
        .with_context(|| format!("Column '{}' not found in CSV", lat_col))?;
    let lon_idx = headers
        .iter()
        .position(|h| h == lon_col)
        .with_context(|| format!("Column '{}' not found in CSV", lon_col))?;

    let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;

    let route = records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let field = |idx: usize, name: &str| -> Result<f64> {
                record
                    .get(idx)
                    .with_context(|| format!("Missing {} on row {}", name, row + 1))?
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid {} on row {}", name, row + 1))
            };
            Ok((field(lat_idx, "latitude")?, field(lon_idx, "longitude")?))
        })
        .collect::<Result<Vec<_>>>()?;

    let profile = service
        .get_elevation_profile(&route)
        .context("Failed to compute elevation profile")?;

    let mut writer = csv::Writer::from_writer(output);
    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.push("elevation");
    writer.write_record(&new_headers)?;

    let pb = progress_bar(records.len() as u64)?;
    for (record, elevation) in records.iter().zip(&profile) {
        let elevation = elevation.to_string();
        let mut new_record: Vec<&str> = record.iter().collect();
        new_record.push(&elevation);
        writer.write_record(&new_record)?;
        pb.inc(1);
    }
    pb.finish_and_clear();
    writer.flush()?;

    Ok(records.len())
}

/// Answer a `{"points": [[lat, lng], ...]}` body with `{"elevations": [...]}`.
///
/// Returns the number of points.
fn profile_route_json<R: Read, W: Write>(
    service: &ElevationService,
    input: R,
    output: W,
) -> Result<usize> {
    let request: RouteRequest =
        serde_json::from_reader(input).context("Failed to parse route body")?;
    let route: Vec<(f64, f64)> = request
        .points
        .iter()
        .map(|&[lat, lng]| (lat, lng))
        .collect();

    let elevations = service
        .get_elevation_profile(&route)
        .context("Failed to compute elevation profile")?;

    serde_json::to_writer(output, &RouteResponse { elevations })?;
    Ok(route.len())
}

fn profile_geojson(service: &ElevationService, geojson: GeoJson) -> Result<GeoJson> {
    let enriched = match geojson {
        GeoJson::Geometry(geometry) => {
            GeoJson::Geometry(add_profile_to_geometry(service, geometry)?)
        }
        GeoJson::Feature(mut feature) => {
            if let Some(geometry) = feature.geometry.take() {
                feature.geometry = Some(add_profile_to_geometry(service, geometry)?);
            }
            GeoJson::Feature(feature)
        }
        GeoJson::FeatureCollection(mut fc) => {
            let pb = progress_bar(fc.features.len() as u64)?;
            for feature in &mut fc.features {
                if let Some(geometry) = feature.geometry.take() {
                    feature.geometry = Some(add_profile_to_geometry(service, geometry)?);
                }
                pb.inc(1);
            }
            pb.finish_and_clear();
            GeoJson::FeatureCollection(fc)
        }
    };
    Ok(enriched)
}
