use anyhow::Result;
use elevroute::{SrtmResolution, TileId};
use std::fs;
use std::path::Path;

use crate::ServiceArgs;

/// One tile found in the data directory.
#[derive(Debug, PartialEq)]
struct TileEntry {
    id: TileId,
    filename: String,
    size: u64,
    kind: &'static str,
}

pub fn run(args: &ServiceArgs) -> Result<()> {
    let service = super::build_service(args)?;
    let dir = service.data_dir();
    let entries = list_tiles(dir, &service.scan_tile_files());

    if entries.is_empty() {
        println!("No tiles found in: {}", dir.display());
        return Ok(());
    }

    println!("{:<16} {:>8} {:>22}", "TILE", "TYPE", "COVERAGE");
    println!("{}", "-".repeat(48));
    for entry in &entries {
        println!(
            "{:<16} {:>8} {:>22}",
            entry.filename,
            entry.kind,
            coverage(entry.id)
        );
    }

    let count = |kind: &str| entries.iter().filter(|e| e.kind == kind).count();
    let total_size: u64 = entries.iter().map(|e| e.size).sum();

    println!();
    println!("Summary:");
    println!("  Total tiles: {}", entries.len());
    for kind in ["SRTM1", "SRTM3", "zip", "???"] {
        let n = count(kind);
        if n > 0 {
            println!("  {}: {}", kind, n);
        }
    }
    println!("  Total size: {}", super::format_size(total_size));
    println!("  Data directory: {}", dir.display());

    Ok(())
}

/// Describe each tile, preferring the raw `.hgt` file over the archive.
fn list_tiles(dir: &Path, ids: &[TileId]) -> Vec<TileEntry> {
    ids.iter()
        .filter_map(|&id| {
            [id.filename(), id.zip_filename()]
                .into_iter()
                .find_map(|filename| {
                    let size = fs::metadata(dir.join(&filename)).ok()?.len();
                    Some(TileEntry {
                        id,
                        kind: kind(&filename, size),
                        filename,
                        size,
                    })
                })
        })
        .collect()
}

fn kind(filename: &str, size: u64) -> &'static str {
    if filename.ends_with(".zip") {
        return "zip";
    }
    match usize::try_from(size).map(SrtmResolution::from_len) {
        Ok(Ok(SrtmResolution::Srtm1)) => "SRTM1",
        Ok(Ok(SrtmResolution::Srtm3)) => "SRTM3",
        _ => "???",
    }
}

fn coverage(id: TileId) -> String {
    let lat_prefix = if id.lat >= 0 { "N" } else { "S" };
    let lon_prefix = if id.lon >= 0 { "E" } else { "W" };
    format!(
        "{}{:02} to {}{:02}, {}{:03} to {}{:03}",
        lat_prefix,
        id.lat.abs(),
        lat_prefix,
        (id.lat + 1).abs(),
        lon_prefix,
        id.lon.abs(),
        lon_prefix,
        (id.lon + 1).abs()
    )
}
