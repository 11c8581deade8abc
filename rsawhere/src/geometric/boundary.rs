use gdal::vector::{FieldValue, LayerAccess};
use gdal::Dataset;
use geo::{BoundingRect, Geometry as GeoGeometry, MultiPolygon, Polygon};
use geos::{Geom, Geometry as GeosGeometry};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{AwhereError, Result};
use crate::geo_core::{epsg_of, gdal_to_geo, geo_to_gdal, spatial_ref_from_epsg, BoundingBox, GeoCore};

/// One polygonal feature of a boundary, with the attributes it was read with.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub geometry: MultiPolygon<f64>,
    pub properties: Map<String, Value>,
}

/// Area of interest a grid is fitted to.
///
/// Always held in EPSG:4326 (longitude, latitude); sources in another CRS are
/// reprojected once when the boundary is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    features: Vec<BoundaryFeature>,
    pub geo_core: GeoCore,
}

impl Boundary {
    /// Read every polygonal feature of the first layer of a vector file
    /// (Shapefile, GeoJSON, GeoPackage...).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AwhereError::InputNotFound(path.to_path_buf()));
        }

        let dataset = Dataset::open(path)?;
        let mut layer = dataset.layer(0)?;
        let geo_core = GeoCore::default();

        let transform = match layer.spatial_ref() {
            Some(srs) => {
                let transform = geo_core.transform_from(&srs)?;
                if transform.is_some() {
                    log::info!(
                        "Reprojecting boundary from EPSG:{} to EPSG:{}",
                        epsg_of(&srs).map_or_else(|| "?".to_string(), |c| c.to_string()),
                        geo_core.epsg
                    );
                }
                transform
            }
            None => {
                log::warn!(
                    "{} has no CRS, assuming EPSG:{}",
                    path.display(),
                    geo_core.epsg
                );
                None
            }
        };

        let mut features = Vec::new();
        for feature in layer.features() {
            let Some(geom) = feature.geometry() else {
                continue;
            };
            let geom = match &transform {
                Some(transform) => geom.transform(transform)?,
                None => geom.clone(),
            };

            let polygons = polygons_of(gdal_to_geo(&geom)?);
            if polygons.is_empty() {
                log::debug!("Skipping non-polygonal feature {:?}", feature.fid());
                continue;
            }

            let mut properties = Map::new();
            for (name, value) in feature.fields() {
                properties.insert(name, value.map_or(Value::Null, field_to_json));
            }

            features.push(BoundaryFeature {
                geometry: MultiPolygon::new(polygons),
                properties,
            });
        }

        log::info!(
            "Loaded {} boundary feature(s) from {}",
            features.len(),
            path.display()
        );
        Boundary::from_features(features, geo_core)
    }

    /// Build a boundary from in-memory polygons expressed in `epsg`.
    pub fn new(polygons: Vec<MultiPolygon<f64>>, epsg: i32) -> Result<Self> {
        let geo_core = GeoCore::default();
        let source = spatial_ref_from_epsg(epsg)?;
        let transform = geo_core.transform_from(&source)?;

        let mut features = Vec::with_capacity(polygons.len());
        for multi_polygon in polygons {
            let geometry = match &transform {
                Some(transform) => {
                    let gdal_geom = geo_to_gdal(&GeoGeometry::MultiPolygon(multi_polygon))?;
                    MultiPolygon::new(polygons_of(gdal_to_geo(&gdal_geom.transform(transform)?)?))
                }
                None => multi_polygon,
            };
            if geometry.0.is_empty() {
                continue;
            }
            features.push(BoundaryFeature {
                geometry,
                properties: Map::new(),
            });
        }

        Boundary::from_features(features, geo_core)
    }

    fn from_features(features: Vec<BoundaryFeature>, geo_core: GeoCore) -> Result<Self> {
        if features.is_empty() {
            return Err(AwhereError::Geometry(
                "boundary contains no polygon features".to_string(),
            ));
        }

        let mut boundary = Boundary { features, geo_core };
        let bbox = boundary.bounds()?;
        boundary.geo_core.set_bbox(Some(bbox));
        Ok(boundary)
    }

    pub fn features(&self) -> &[BoundaryFeature] {
        &self.features
    }

    /// Union of every feature geometry.
    pub fn geometry(&self) -> Result<MultiPolygon<f64>> {
        let all: MultiPolygon<f64> = self
            .features
            .iter()
            .flat_map(|feature| feature.geometry.0.iter().cloned())
            .collect();
        let geos_geom: GeosGeometry = (&GeoGeometry::MultiPolygon(all)).try_into()?;
        let union: GeoGeometry<f64> = geos_geom.unary_union()?.try_into()?;
        Ok(MultiPolygon::new(polygons_of(union)))
    }

    /// Extent of all features.
    pub fn bounds(&self) -> Result<BoundingBox> {
        let all: MultiPolygon<f64> = self
            .features
            .iter()
            .flat_map(|feature| feature.geometry.0.iter().cloned())
            .collect();
        all.bounding_rect()
            .map(BoundingBox::from_rect)
            .ok_or_else(|| AwhereError::Geometry("boundary has an empty extent".to_string()))
    }

    /// Expand the boundary outward by `distance` degrees.
    ///
    /// Buffering in a geographic CRS is approximate; the result only seeds a
    /// coarse degree-sized lattice.
    pub fn buffer(&self, distance: f64, quadrant_segments: u32) -> Result<BufferedBoundary> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(AwhereError::invalid(
                "buffer_distance",
                format!("must be a non-negative number, got {}", distance),
            ));
        }
        if quadrant_segments == 0 {
            return Err(AwhereError::invalid(
                "buffer_quadrant_segments",
                "must be at least 1",
            ));
        }

        let union = self.geometry()?;
        let geos_geom: GeosGeometry = (&GeoGeometry::MultiPolygon(union)).try_into()?;
        let buffered: GeoGeometry<f64> = geos_geom
            .buffer(distance, quadrant_segments as i32)?
            .try_into()?;
        let geometry = MultiPolygon::new(polygons_of(buffered));

        let bounds = geometry
            .bounding_rect()
            .map(BoundingBox::from_rect)
            .ok_or_else(|| AwhereError::Geometry("buffered boundary is empty".to_string()))?;

        Ok(BufferedBoundary {
            geometry,
            distance,
            bounds,
        })
    }
}

/// A boundary grown outward by a fixed distance.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedBoundary {
    geometry: MultiPolygon<f64>,
    distance: f64,
    bounds: BoundingBox,
}

impl BufferedBoundary {
    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub(crate) fn to_geos(&self) -> Result<GeosGeometry> {
        Ok((&GeoGeometry::MultiPolygon(self.geometry.clone())).try_into()?)
    }
}

/// Polygons contained in a geometry; anything without area is dropped.
pub(crate) fn polygons_of(geometry: GeoGeometry<f64>) -> Vec<Polygon<f64>> {
    match geometry {
        GeoGeometry::Polygon(polygon) => vec![polygon],
        GeoGeometry::MultiPolygon(multi) => multi.0,
        GeoGeometry::Rect(rect) => vec![rect.to_polygon()],
        GeoGeometry::Triangle(triangle) => vec![triangle.to_polygon()],
        GeoGeometry::GeometryCollection(collection) => {
            collection.0.into_iter().flat_map(polygons_of).collect()
        }
        _ => Vec::new(),
    }
}

fn field_to_json(value: FieldValue) -> Value {
    match value {
        FieldValue::IntegerValue(v) => Value::from(v),
        FieldValue::Integer64Value(v) => Value::from(v),
        FieldValue::RealValue(v) => serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        FieldValue::StringValue(v) => Value::String(v),
        other => other.into_string().map_or(Value::Null, Value::String),
    }
}
