use anyhow::Result;
use rsawhere::geometric::grid::{create_grid, GridOptions};
use rsawhere::geometric::zonal::{rasterize, Statistic};

/// Example: population per grid tile
///
/// Usage: cargo run --example rasterize_data -- [boundary.shp] [raster.tif] ["count sum"]
fn main() -> Result<()> {
    pretty_env_logger::init();
    println!("=== Example: Zonal statistics on an aWhere grid ===\n");

    let mut args = std::env::args().skip(1);
    let boundary = args
        .next()
        .unwrap_or_else(|| "./data/vermont_state_boundary.shp".to_string());
    let raster = args
        .next()
        .unwrap_or_else(|| "./data/vt_ppp_2020.tif".to_string());
    let statistics = match args.next() {
        Some(stats) => Statistic::parse_list(&stats)?,
        None => Statistic::DEFAULTS.to_vec(),
    };

    let (grid, _) = create_grid(&boundary, &GridOptions::default().with_buffer_distance(0.12))?;
    let enriched = rasterize(&grid, &raster, &statistics)?;

    println!("Rasterized {} onto {} tiles", raster, enriched.len());
    for tile in enriched.iter().take(5) {
        let values: Vec<String> = tile
            .attributes()
            .iter()
            .map(|(name, value)| match value {
                Some(value) => format!("{}={:.2}", name, value),
                None => format!("{}=null", name),
            })
            .collect();
        println!("  - tile {}: {}", tile.id, values.join(", "));
    }

    Ok(())
}
