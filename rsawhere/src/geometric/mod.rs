pub mod boundary;
pub mod centroid;
pub mod export;
pub mod grid;
pub mod raster;
pub mod zonal;
