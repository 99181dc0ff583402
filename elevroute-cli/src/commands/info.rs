use anyhow::{bail, Context, Result};
use elevroute::{locate, SrtmResolution, SrtmTile, TileId};
use std::path::{Path, PathBuf};

use crate::ServiceArgs;

pub fn run(
    args: &ServiceArgs,
    tile: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<()> {
    let (id, path) = resolve_tile(args, tile.as_deref(), lat.zip(lon))?;
    let tile = load_tile(&path, id)?;
    let file_size = std::fs::metadata(&path)?.len();

    print!("{}", describe(&tile, &path, file_size));
    Ok(())
}

/// Work out which tile is meant and where its file lives.
fn resolve_tile(
    args: &ServiceArgs,
    tile: Option<&str>,
    coords: Option<(f64, f64)>,
) -> Result<(TileId, PathBuf)> {
    let id = match (tile, coords) {
        (_, Some((lat, lon))) => {
            if !elevroute::filename::is_valid_coord(lat, lon) {
                bail!("Coordinates out of range: {}, {}", lat, lon);
            }
            locate(lat, lon)
        }
        (Some(name), None) => {
            let path = Path::new(name);
            let id = TileId::from_filename(name)
                .with_context(|| format!("Not a tile name: {}", name))?;
            // An explicit file path is used as is
            if path.is_file() {
                return Ok((id, path.to_path_buf()));
            }
            id
        }
        (None, None) => bail!("Give a tile name or --lat and --lon"),
    };

    let dir = super::data_dir(args)?;
    [id.filename(), id.zip_filename()]
        .into_iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
        .map(|p| (id, p))
        .with_context(|| format!("Tile {} not found in {}", id, dir.display()))
}

fn load_tile(path: &Path, id: TileId) -> Result<SrtmTile> {
    let is_zip = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"));

    let tile = if is_zip {
        SrtmTile::from_zip(path, id)
    } else {
        SrtmTile::from_file_with_id(path, id)
    };
    tile.with_context(|| format!("Failed to load tile {}", path.display()))
}

fn describe(tile: &SrtmTile, path: &Path, file_size: u64) -> String {
    let id = tile.id();
    let samples = tile.samples();
    let transform = tile.transform();
    let stats = tile.stats();

    let resolution = match tile.resolution() {
        SrtmResolution::Srtm1 => "SRTM1 (~30m)",
        SrtmResolution::Srtm3 => "SRTM3 (~90m)",
    };

    let mut out = String::new();
    out.push_str(&format!("Tile: {}\n", id));
    out.push_str(&format!("Path: {}\n\n", path.display()));
    out.push_str(&format!(
        "Resolution: {} ({}x{} samples)\n",
        resolution, samples, samples
    ));
    out.push_str(&format!(
        "Coverage: {} to {}\n",
        corner(id.lat, id.lon),
        corner(id.lat + 1, id.lon + 1)
    ));
    out.push_str(&format!(
        "Origin: ({:.6}, {:.6}), pixel {:.8} x {:.8}\n",
        transform.origin_x, transform.origin_y, transform.pixel_size_x, transform.pixel_size_y
    ));
    out.push_str(&format!("File size: {}\n\n", super::format_size(file_size)));

    if let (Some(min), Some(max)) = (stats.min, stats.max) {
        out.push_str(&format!("Min elevation: {}m\n", min));
        out.push_str(&format!("Max elevation: {}m\n", max));
    }

    if stats.void_count > 0 {
        let total = (samples * samples) as f64;
        out.push_str(&format!(
            "Void samples: {} ({:.1}%)\n",
            stats.void_count,
            stats.void_count as f64 / total * 100.0
        ));
    }

    out
}

fn corner(lat: i32, lon: i32) -> String {
    format!(
        "{}{}{}{}",
        if lat >= 0 { 'N' } else { 'S' },
        lat.unsigned_abs(),
        if lon >= 0 { 'E' } else { 'W' },
        lon.unsigned_abs()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{args, write_tile};
    use elevroute::VOID_VALUE;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_by_name_and_coords() {
        let temp_dir = TempDir::new().unwrap();
        write_tile(temp_dir.path(), "N35E138.hgt", 0, 500);
        let args = args(temp_dir.path());

        let (id, path) = resolve_tile(&args, Some("N35E138"), None).unwrap();
        assert_eq!(id, TileId::new(35, 138));
        assert_eq!(path, temp_dir.path().join("N35E138.hgt"));

        let (id, _) = resolve_tile(&args, None, Some((35.3, 138.7))).unwrap();
        assert_eq!(id, TileId::new(35, 138));
    }

    #[test]
    fn test_resolve_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        write_tile(temp_dir.path(), "S13W078.hgt", 0, 500);
        let file = temp_dir.path().join("S13W078.hgt");

        let mut args = args(temp_dir.path());
        args.data_dir = None;

        let (id, path) = resolve_tile(&args, file.to_str(), None).unwrap();
        assert_eq!(id, TileId::new(-13, -78));
        assert_eq!(path, file);
    }

    #[test]
    fn test_resolve_missing() {
        let temp_dir = TempDir::new().unwrap();
        let args = args(temp_dir.path());

        assert!(resolve_tile(&args, Some("N00E000"), None).is_err());
        assert!(resolve_tile(&args, Some("garbage"), None).is_err());
        assert!(resolve_tile(&args, None, Some((91.0, 0.0))).is_err());
    }

    #[test]
    fn test_describe() {
        let temp_dir = TempDir::new().unwrap();
        write_tile(temp_dir.path(), "N35E138.hgt", 10, VOID_VALUE);
        let path = temp_dir.path().join("N35E138.hgt");

        let tile = load_tile(&path, TileId::new(35, 138)).unwrap();
        let text = describe(&tile, &path, 2_884_802);

        assert!(text.contains("Tile: N35E138"));
        assert!(text.contains("SRTM3 (~90m) (1201x1201 samples)"));
        assert!(text.contains("Coverage: N35E138 to N36E139"));
        assert!(text.contains("Min elevation: 10m"));
        assert!(text.contains("Max elevation: 10m"));
        assert!(text.contains("Void samples: 1 (0.0%)"));
    }
}
