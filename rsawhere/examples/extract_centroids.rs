use anyhow::Result;
use rsawhere::geometric::centroid::extract_centroids;
use rsawhere::geometric::grid::{create_grid, GridOptions};

/// Example: tile centroids to use as API request locations
fn main() -> Result<()> {
    pretty_env_logger::init();
    println!("=== Example: Extracting grid centroids ===\n");

    let boundary = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./data/vermont_state_boundary.shp".to_string());
    let options = GridOptions::default().with_buffer_distance(0.12);
    let (grid, _) = create_grid(&boundary, &options)?;

    let centroids = extract_centroids(&grid);
    println!("{} centroids (longitude, latitude):", centroids.len());
    for (lon, lat) in centroids.iter().take(5) {
        println!("  - ({:.4}, {:.4})", lon, lat);
    }
    if let Some((lon, lat)) = centroids.last() {
        println!("  ...\n  - ({:.4}, {:.4})", lon, lat);
    }

    Ok(())
}
