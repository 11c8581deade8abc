//! Build aWhere grids over an area of interest, aggregate raster data per
//! grid tile and request weather and agronomic data for tile centroids.

pub mod collect;
pub mod commons;
pub mod error;
pub mod geo_core;
pub mod geometric;

pub use error::{AwhereError, Result};
pub use geometric::boundary::Boundary;
pub use geometric::centroid::extract_centroids;
pub use geometric::export::export_grid;
pub use geometric::grid::{create_grid, create_grid_from_boundary, Grid, GridOptions, Tile, TileFilter};
pub use geometric::zonal::{rasterize, rasterize_source, Statistic};
