use geo::{coord, Coord, Geometry as GeoGeometry, Point, Polygon, Rect};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use geos::{Geom, Geometry as GeosGeometry, PreparedGeometry};
#[cfg(feature = "polars")]
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::collect::global_variables::{AWHERE_CELL_SIZE, MAX_LATTICE_CELLS};
use crate::commons::basic_functions::{arange, arange_len};
use crate::error::{AwhereError, Result};
use crate::geo_core::{BoundingBox, GeoCore};
use crate::geometric::boundary::Boundary;

/// Spatial predicate deciding which lattice tiles are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileFilter {
    /// Keep tiles lying entirely inside the buffered boundary. Tiles that
    /// straddle its edge are dropped, so full coverage of the unbuffered
    /// boundary needs a buffer of at least one cell diagonal.
    #[default]
    Within,
    /// Keep every tile that touches the buffered boundary.
    Intersects,
}

/// Options for [`create_grid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// Outward buffer applied to the boundary, in degrees.
    pub buffer_distance: f64,
    /// Tile side, in degrees. Defaults to the aWhere 5 arc-minute grid.
    pub cell_size: f64,
    pub tile_filter: TileFilter,
    /// Segments per quarter circle used when buffering.
    pub buffer_quadrant_segments: u32,
}

impl Default for GridOptions {
    fn default() -> Self {
        GridOptions {
            buffer_distance: 0.0,
            cell_size: AWHERE_CELL_SIZE,
            tile_filter: TileFilter::Within,
            buffer_quadrant_segments: 16,
        }
    }
}

impl GridOptions {
    /// Buffer the boundary by `buffer_distance` degrees before tiling.
    pub fn with_buffer_distance(mut self, buffer_distance: f64) -> Self {
        self.buffer_distance = buffer_distance;
        self
    }

    /// Tile side in degrees.
    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Predicate deciding which lattice tiles are kept.
    pub fn with_tile_filter(mut self, tile_filter: TileFilter) -> Self {
        self.tile_filter = tile_filter;
        self
    }

    /// Buffer smoothness: segments used per quarter circle.
    pub fn with_buffer_quadrant_segments(mut self, segments: u32) -> Self {
        self.buffer_quadrant_segments = segments;
        self
    }

    /// Reject a non-positive cell size, a negative buffer or zero buffer
    /// segments with `InvalidParameter`.
    pub fn validate(&self) -> Result<()> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(AwhereError::invalid(
                "cell_size",
                format!("must be a positive number, got {}", self.cell_size),
            ));
        }
        if !self.buffer_distance.is_finite() || self.buffer_distance < 0.0 {
            return Err(AwhereError::invalid(
                "buffer_distance",
                format!("must be a non-negative number, got {}", self.buffer_distance),
            ));
        }
        if self.buffer_quadrant_segments == 0 {
            return Err(AwhereError::invalid(
                "buffer_quadrant_segments",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// One square cell of a [`Grid`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Position in the full lattice: `lon_index * n_lat + lat_index`.
    pub id: usize,
    /// Lower-left corner.
    pub origin: Coord<f64>,
    pub size: f64,
    attributes: Vec<(String, Option<f64>)>,
}

impl Tile {
    /// Square tile of side `size` with its lower-left corner at `origin`.
    pub fn new(id: usize, origin: Coord<f64>, size: f64) -> Self {
        Tile {
            id,
            origin,
            size,
            attributes: Vec::new(),
        }
    }

    pub fn rect(&self) -> Rect<f64> {
        Rect::new(
            self.origin,
            coord! { x: self.origin.x + self.size, y: self.origin.y + self.size },
        )
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_rect(self.rect())
    }

    /// Counter-clockwise square.
    pub fn polygon(&self) -> Polygon<f64> {
        self.rect().to_polygon()
    }

    /// Exact centre, `origin + size / 2` on both axes.
    pub fn centroid(&self) -> Point<f64> {
        let half = self.size / 2.0;
        Point::new(self.origin.x + half, self.origin.y + half)
    }

    /// Value of an attribute; `None` when absent or null.
    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| *value)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|(key, _)| key == name)
    }

    pub fn attributes(&self) -> &[(String, Option<f64>)] {
        &self.attributes
    }

    /// Set an attribute, replacing any previous value under the same name.
    pub fn set_attribute(&mut self, name: &str, value: Option<f64>) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }
}

/// Ordered tiling fitted to a boundary.
///
/// Tiles are kept in lattice order: longitude major, latitude minor.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    tiles: Vec<Tile>,
    cell_size: f64,
    pub geo_core: GeoCore,
}

impl Grid {
    /// Grid of `tiles` in EPSG:4326; the extent is the union of the tile
    /// bounds, or `None` for an empty grid.
    pub fn new(tiles: Vec<Tile>, cell_size: f64) -> Self {
        let mut geo_core = GeoCore::default();
        let extent = tiles.iter().map(Tile::bounds).reduce(|a, b| {
            BoundingBox::new(
                a.min_x.min(b.min_x),
                a.min_y.min(b.min_y),
                a.max_x.max(b.max_x),
                a.max_y.max(b.max_y),
            )
        });
        geo_core.set_bbox(extent);

        Grid {
            tiles,
            cell_size,
            geo_core,
        }
    }

    /// Tiles in lattice order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tile> {
        self.tiles.iter()
    }

    /// Number of kept tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tile side in degrees.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Tile with the given lattice id.
    pub fn tile(&self, id: usize) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.id == id)
    }

    /// Attribute names in first-seen order across all tiles.
    pub fn attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for tile in &self.tiles {
            for (name, _) in tile.attributes() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Tile polygons with `tile_id`, centroid and attribute properties.
    pub fn to_geojson(&self) -> GeoJson {
        let names = self.attribute_names();
        let features = self
            .tiles
            .iter()
            .map(|tile| {
                let centroid = tile.centroid();
                let mut properties = JsonObject::new();
                properties.insert("tile_id".to_string(), JsonValue::from(tile.id));
                properties.insert("centroid_lon".to_string(), JsonValue::from(centroid.x()));
                properties.insert("centroid_lat".to_string(), JsonValue::from(centroid.y()));
                for name in &names {
                    let value = tile
                        .attribute(name)
                        .and_then(serde_json::Number::from_f64)
                        .map_or(JsonValue::Null, JsonValue::Number);
                    properties.insert(name.clone(), value);
                }

                Feature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::from(
                        &tile.polygon(),
                    ))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        GeoJson::from(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    /// Attribute table of the grid, one row per tile.
    #[cfg(feature = "polars")]
    pub fn to_polars_df(&self) -> Result<DataFrame> {
        let mut tile_id_vec: Vec<u64> = Vec::with_capacity(self.len());
        let mut min_lon_vec: Vec<f64> = Vec::with_capacity(self.len());
        let mut min_lat_vec: Vec<f64> = Vec::with_capacity(self.len());
        let mut centroid_lon_vec: Vec<f64> = Vec::with_capacity(self.len());
        let mut centroid_lat_vec: Vec<f64> = Vec::with_capacity(self.len());

        for tile in &self.tiles {
            let centroid = tile.centroid();
            tile_id_vec.push(tile.id as u64);
            min_lon_vec.push(tile.origin.x);
            min_lat_vec.push(tile.origin.y);
            centroid_lon_vec.push(centroid.x());
            centroid_lat_vec.push(centroid.y());
        }

        let mut df = df! [
            "tile_id" => tile_id_vec,
            "min_lon" => min_lon_vec,
            "min_lat" => min_lat_vec,
            "centroid_lon" => centroid_lon_vec,
            "centroid_lat" => centroid_lat_vec,
        ]?;

        for name in self.attribute_names() {
            let values: Vec<Option<f64>> =
                self.tiles.iter().map(|tile| tile.attribute(&name)).collect();
            df.with_column(Series::new(name.as_str().into(), values))?;
        }

        Ok(df)
    }
}

impl<'a> IntoIterator for &'a Grid {
    type Item = &'a Tile;
    type IntoIter = std::slice::Iter<'a, Tile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.iter()
    }
}

/// Build a grid over the boundary read from a vector file.
///
/// Returns the grid together with the boundary, reprojected to EPSG:4326 but
/// not buffered.
pub fn create_grid<P: AsRef<Path>>(path: P, options: &GridOptions) -> Result<(Grid, Boundary)> {
    options.validate()?;
    let boundary = Boundary::from_path(path)?;
    create_grid_from_boundary(&boundary, options)
}

/// Build a grid over an already loaded boundary.
pub fn create_grid_from_boundary(
    boundary: &Boundary,
    options: &GridOptions,
) -> Result<(Grid, Boundary)> {
    options.validate()?;

    let buffered = boundary.buffer(options.buffer_distance, options.buffer_quadrant_segments)?;
    let extent = buffered.bounds();
    let n_lon = arange_len(extent.min_x, extent.max_x, options.cell_size)?;
    let n_lat = arange_len(extent.min_y, extent.max_y, options.cell_size)?;
    if n_lon.saturating_mul(n_lat) > MAX_LATTICE_CELLS {
        return Err(AwhereError::invalid(
            "cell_size",
            format!(
                "{} x {} cells of {} degrees exceed {} cells",
                n_lon, n_lat, options.cell_size, MAX_LATTICE_CELLS
            ),
        ));
    }
    let lons = arange(extent.min_x, extent.max_x, options.cell_size)?;
    let lats = arange(extent.min_y, extent.max_y, options.cell_size)?;
    log::info!(
        "Grid lattice: {} x {} cells of {} degrees",
        lons.len(),
        lats.len(),
        options.cell_size
    );

    let region = buffered.to_geos()?;
    let prepared = region.to_prepared_geom()?;

    let mut tiles = Vec::new();
    for (i, lon) in lons.iter().enumerate() {
        for (j, lat) in lats.iter().enumerate() {
            let tile = Tile::new(
                i * lats.len() + j,
                coord! { x: *lon, y: *lat },
                options.cell_size,
            );
            if keep_tile(&prepared, &tile, options.tile_filter)? {
                tiles.push(tile);
            }
        }
    }

    if tiles.is_empty() {
        log::warn!("No tile passed the {:?} filter", options.tile_filter);
    }
    log::info!("Grid keeps {} tiles", tiles.len());

    Ok((Grid::new(tiles, options.cell_size), boundary.clone()))
}

fn keep_tile(region: &PreparedGeometry, tile: &Tile, filter: TileFilter) -> Result<bool> {
    let geom: GeosGeometry = (&GeoGeometry::Polygon(tile.polygon())).try_into()?;
    let keep = match filter {
        TileFilter::Within => region.contains(&geom)?,
        TileFilter::Intersects => region.intersects(&geom)?,
    };
    Ok(keep)
}
