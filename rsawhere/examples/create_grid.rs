use anyhow::Result;
use rsawhere::geometric::grid::{create_grid, GridOptions, TileFilter};

/// Example: aWhere grid over a state boundary
///
/// Usage: cargo run --example create_grid -- [boundary.shp] [buffer_distance]
fn main() -> Result<()> {
    pretty_env_logger::init();
    println!("=== Example: Creating an aWhere grid ===\n");

    let mut args = std::env::args().skip(1);
    let boundary = args
        .next()
        .unwrap_or_else(|| "./data/vermont_state_boundary.shp".to_string());
    let buffer_distance: f64 = args.next().map(|d| d.parse()).transpose()?.unwrap_or(0.12);

    let options = GridOptions::default()
        .with_buffer_distance(buffer_distance)
        .with_tile_filter(TileFilter::Within);

    println!("Boundary: {}", boundary);
    println!("  - Buffer: {} degrees", options.buffer_distance);
    println!("  - Cell size: {} degrees", options.cell_size);
    println!("  - Tile filter: {:?}\n", options.tile_filter);

    let (grid, boundary) = create_grid(&boundary, &options)?;

    println!("Grid created successfully!");
    println!("  - Boundary features: {}", boundary.features().len());
    println!("  - Tiles: {}", grid.len());
    if let Some(bbox) = grid.geo_core.get_bbox() {
        println!(
            "  - Extent: [{:.4}, {:.4}, {:.4}, {:.4}]",
            bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
        );
    }

    Ok(())
}
