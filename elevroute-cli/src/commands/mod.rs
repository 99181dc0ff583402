pub mod info;
pub mod list;
pub mod profile;
pub mod query;

use anyhow::{Context, Result};
use elevroute::ElevationService;
use std::path::PathBuf;

use crate::ServiceArgs;

const DATA_DIR_HINT: &str = "No data directory given. Use --data-dir or set ELEVROUTE_DATA_DIR";

/// Resolve the data directory from the command line or environment.
pub fn data_dir(args: &ServiceArgs) -> Result<PathBuf> {
    args.data_dir.clone().context(DATA_DIR_HINT)
}

/// Build the elevation service from the shared options.
pub fn build_service(args: &ServiceArgs) -> Result<ElevationService> {
    let dir = data_dir(args)?;

    ElevationService::builder(&dir)
        .cache_size(args.cache_size)
        .treat_negative_as_invalid(!args.keep_negative)
        .sea_level_threshold(args.sea_level_threshold)
        .build()
        .with_context(|| format!("Failed to open elevation data in {}", dir.display()))
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.2} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.2} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.2} KB", b as f64 / KB as f64),
        b => format!("{} bytes", b),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(2_884_802), "2.75 MB");
    }

    #[test]
    fn test_build_service_applies_options() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = test_support::args(temp_dir.path());
        args.keep_negative = true;
        args.sea_level_threshold = 2.0;

        let service = build_service(&args).unwrap();
        assert!(!service.policy().treat_negative_as_invalid);
        assert_eq!(service.gap_fill().sea_level_threshold, 2.0);
    }

    #[test]
    fn test_missing_data_dir_option() {
        let args = ServiceArgs {
            data_dir: None,
            cache_size: 10,
            keep_negative: false,
            sea_level_threshold: 5.0,
        };
        assert!(build_service(&args).is_err());
    }
}
