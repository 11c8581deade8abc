use anyhow::Result;
use rsawhere::geometric::export::export_grid;
use rsawhere::geometric::grid::{create_grid, GridOptions};
use rsawhere::geometric::zonal::{rasterize, Statistic};
use std::fs::create_dir_all;

/// Example: writing an enriched grid to every supported format
fn main() -> Result<()> {
    pretty_env_logger::init();
    println!("=== Example: Exporting an aWhere grid ===\n");

    let (grid, _) = create_grid(
        "./data/vermont_state_boundary.shp",
        &GridOptions::default().with_buffer_distance(0.12),
    )?;
    let enriched = rasterize(&grid, "./data/vt_ppp_2020.tif", &Statistic::DEFAULTS)?;

    create_dir_all("./output")?;
    for name in ["vermont_grid.csv", "vermont_grid.geojson", "vermont_grid.shp", "vermont_grid.gpkg"] {
        let path = export_grid(&enriched, format!("./output/{}", name))?;
        println!("  - {}", path.display());
    }

    Ok(())
}
