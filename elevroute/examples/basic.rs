//! Elevation profile of a short route.
//!
//! Run with: cargo run --example basic -- /path/to/hgt/files

use elevroute::{Classified, ElevationError, ElevationService};
use std::env;

fn main() -> Result<(), ElevationError> {
    let data_dir = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example basic -- /path/to/hgt/files");
        std::process::exit(1);
    });

    let service = ElevationService::new(&data_dir, 10)?;

    // Fujinomiya trail up Mount Fuji
    let route = [
        (35.3350, 138.7280),
        (35.3450, 138.7300),
        (35.3550, 138.7290),
        (35.3606, 138.7274),
    ];

    let classified = service.classify_route(&route);
    let profile = service.get_elevation_profile(&route)?;

    println!("{:>10} {:>10} {:>10}  source", "lat", "lon", "elev (m)");
    println!("{:-<46}", "");
    for ((&(lat, lon), elevation), class) in route.iter().zip(&profile).zip(&classified) {
        let source = match class {
            Classified::Valid(_) => "sampled".to_string(),
            Classified::Invalid(reason) => format!("filled ({:?})", reason),
        };
        println!("{:>10.4} {:>10.4} {:>10.1}  {}", lat, lon, elevation, source);
    }

    let stats = service.cache_stats();
    println!("\nCache statistics:");
    println!("  Cached tiles: {}", stats.entry_count);
    println!("  Tiles loaded: {}", stats.load_count);
    println!("  Hit rate: {:.1}%", stats.hit_rate() * 100.0);

    Ok(())
}
