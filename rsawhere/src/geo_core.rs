use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::vector::Geometry as GdalGeometry;
use geo::{coord, Geometry as GeoGeometry, Polygon, Rect};
use geos::{Geom, Geometry as GeosGeometry};

use crate::collect::global_variables::WGS84_EPSG;
use crate::error::Result;

/// CRS and extent shared by boundaries and grids.
///
/// Every product of this crate lives in EPSG:4326 with longitude on the x
/// axis; `GeoCore` owns the GDAL plumbing needed to get there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCore {
    pub epsg: i32,
    pub bbox: Option<BoundingBox>,
}

impl Default for GeoCore {
    fn default() -> Self {
        GeoCore::new(WGS84_EPSG)
    }
}

impl GeoCore {
    pub fn new(epsg: i32) -> Self {
        GeoCore { epsg, bbox: None }
    }

    pub fn get_epsg(&self) -> i32 {
        self.epsg
    }

    pub fn get_bbox(&self) -> Option<BoundingBox> {
        self.bbox
    }

    pub fn set_bbox(&mut self, bbox: Option<BoundingBox>) {
        self.bbox = bbox;
    }

    /// Spatial reference for this CRS, with x = longitude / easting.
    pub fn spatial_ref(&self) -> Result<SpatialRef> {
        spatial_ref_from_epsg(self.epsg)
    }

    /// Coordinate transform from `source` into this CRS, or `None` when
    /// `source` already is this CRS.
    pub fn transform_from(&self, source: &SpatialRef) -> Result<Option<CoordTransform>> {
        if epsg_of(source) == Some(self.epsg) {
            return Ok(None);
        }

        let mut source = source.clone();
        source.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        let target = self.spatial_ref()?;

        Ok(Some(CoordTransform::new(&source, &target)?))
    }
}

/// EPSG spatial reference in traditional GIS axis order (lon/lat).
///
/// GDAL 3 otherwise swaps axes for geographic EPSG codes.
pub fn spatial_ref_from_epsg(epsg: i32) -> Result<SpatialRef> {
    let mut srs = SpatialRef::from_epsg(epsg as u32)?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

/// EPSG code of a spatial reference, if it carries one.
pub fn epsg_of(srs: &SpatialRef) -> Option<i32> {
    match srs.auth_name() {
        Ok(name) if name.eq_ignore_ascii_case("EPSG") => srs.auth_code().ok(),
        _ => None,
    }
}

/// Convert a GDAL geometry to `geo` by way of WKT and GEOS.
pub fn gdal_to_geo(geom: &GdalGeometry) -> Result<GeoGeometry<f64>> {
    let wkt = geom.wkt()?;
    let geos_geom = GeosGeometry::new_from_wkt(&wkt)?;
    let geo_geom: GeoGeometry<f64> = geos_geom.try_into()?;
    Ok(geo_geom)
}

/// Convert a `geo` geometry to GDAL by way of GEOS and WKT.
pub fn geo_to_gdal(geom: &GeoGeometry<f64>) -> Result<GdalGeometry> {
    let geos_geom: GeosGeometry = geom.try_into()?;
    let wkt = geos_geom.to_wkt()?;
    Ok(GdalGeometry::from_wkt(&wkt)?)
}

/// Axis-aligned extent in the units of its CRS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64, // min longitude
    pub min_y: f64, // min latitude
    pub max_x: f64, // max longitude
    pub max_y: f64, // max latitude
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_rect(rect: Rect<f64>) -> Self {
        BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.min_x, y: self.min_y },
            coord! { x: self.max_x, y: self.max_y },
        )
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        self.to_rect().to_polygon()
    }

    /// Half-open containment: the min edges belong to the box, the max edges
    /// do not, so boxes that share an edge never both claim a point.
    pub fn contains_half_open(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }
}
