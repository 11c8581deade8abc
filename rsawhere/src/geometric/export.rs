use gdal::vector::{FieldValue, LayerAccess, LayerOptions, OGRFieldType, OGRwkbGeometryType};
use gdal::DriverManager;
use geo::Geometry as GeoGeometry;
use std::fs;
use std::path::{Path, PathBuf};

use crate::commons::basic_functions::ensure_parent_dir;
use crate::error::{AwhereError, Result};
use crate::geo_core::geo_to_gdal;
use crate::geometric::grid::Grid;

/// Output format of [`export_grid`], chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Attribute table without geometry.
    Csv,
    Shapefile,
    GeoJson,
    GeoPackage,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "shp" => Ok(ExportFormat::Shapefile),
            "geojson" => Ok(ExportFormat::GeoJson),
            "gpkg" => Ok(ExportFormat::GeoPackage),
            _ => Err(AwhereError::UnsupportedFormat(extension)),
        }
    }

    fn gdal_driver(&self) -> Option<&'static str> {
        match self {
            ExportFormat::Shapefile => Some("ESRI Shapefile"),
            ExportFormat::GeoPackage => Some("GPKG"),
            ExportFormat::Csv | ExportFormat::GeoJson => None,
        }
    }
}

/// Write a grid to `path` and return the path written.
///
/// An existing file at `path` is replaced. Shapefile truncates attribute
/// names to 10 characters; values go to the truncated field.
pub fn export_grid<P: AsRef<Path>>(grid: &Grid, path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let format = ExportFormat::from_path(path)?;
    ensure_parent_dir(path)?;

    match format {
        ExportFormat::Csv => write_csv(grid, path)?,
        ExportFormat::GeoJson => fs::write(path, grid.to_geojson().to_string())?,
        ExportFormat::Shapefile | ExportFormat::GeoPackage => write_vector(grid, path, format)?,
    }

    log::info!("Grid exported to {}", path.display());
    Ok(path.to_path_buf())
}

fn write_csv(grid: &Grid, path: &Path) -> Result<()> {
    let names = grid.attribute_names();
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![
        "tile_id".to_string(),
        "min_lon".to_string(),
        "min_lat".to_string(),
        "max_lon".to_string(),
        "max_lat".to_string(),
        "centroid_lon".to_string(),
        "centroid_lat".to_string(),
    ];
    header.extend(names.iter().cloned());
    writer.write_record(&header)?;

    for tile in grid {
        let bounds = tile.bounds();
        let centroid = tile.centroid();
        let mut record = vec![
            tile.id.to_string(),
            bounds.min_x.to_string(),
            bounds.min_y.to_string(),
            bounds.max_x.to_string(),
            bounds.max_y.to_string(),
            centroid.x().to_string(),
            centroid.y().to_string(),
        ];
        record.extend(
            names
                .iter()
                .map(|name| tile.attribute(name).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_vector(grid: &Grid, path: &Path, format: ExportFormat) -> Result<()> {
    let Some(driver_name) = format.gdal_driver() else {
        return Err(AwhereError::UnsupportedFormat(format!("{:?}", format)));
    };
    let driver = DriverManager::get_driver_by_name(driver_name)?;
    if path.exists() {
        driver.delete(path)?;
    }

    let srs = grid.geo_core.spatial_ref()?;
    let mut dataset = driver.create_vector_only(path)?;
    let layer_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "grid".to_string());
    let mut layer = dataset.create_layer(LayerOptions {
        name: &layer_name,
        srs: Some(&srs),
        ty: OGRwkbGeometryType::wkbPolygon,
        ..Default::default()
    })?;

    let names = grid.attribute_names();
    let mut fields: Vec<(&str, OGRFieldType::Type)> = vec![("tile_id", OGRFieldType::OFTInteger64)];
    fields.extend(names.iter().map(|name| (name.as_str(), OGRFieldType::OFTReal)));
    layer.create_defn_fields(&fields)?;

    // Drivers may rename fields (Shapefile keeps 10 characters), in creation order.
    let stored: Vec<String> = layer.defn().fields().map(|field| field.name()).collect();
    if stored.len() != fields.len() {
        return Err(AwhereError::invalid(
            "path",
            format!(
                "{} stored {} of {} fields",
                driver_name,
                stored.len(),
                fields.len()
            ),
        ));
    }

    for tile in grid {
        let geometry = geo_to_gdal(&GeoGeometry::Polygon(tile.polygon()))?;

        // null attributes are left unset
        let mut field_names = vec![stored[0].as_str()];
        let mut values = vec![FieldValue::Integer64Value(tile.id as i64)];
        for (name, stored_name) in names.iter().zip(&stored[1..]) {
            if let Some(value) = tile.attribute(name) {
                field_names.push(stored_name.as_str());
                values.push(FieldValue::RealValue(value));
            }
        }
        layer.create_feature_fields(geometry, &field_names, &values)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometric::grid::Tile;
    use gdal::Dataset;
    use geo::coord;
    use geojson::GeoJson;
    use tempfile::TempDir;

    fn sample_grid() -> Grid {
        let mut first = Tile::new(0, coord! { x: -73.0, y: 43.0 }, 0.5);
        first.set_attribute("count", Some(12.0));
        first.set_attribute("sum", Some(340.5));
        let mut second = Tile::new(1, coord! { x: -73.0, y: 43.5 }, 0.5);
        second.set_attribute("count", Some(0.0));
        second.set_attribute("sum", None);
        Grid::new(vec![first, second], 0.5)
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ExportFormat::from_path(Path::new("grid.GeoJSON")).unwrap(),
            ExportFormat::GeoJson
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("out/grid.shp")).unwrap(),
            ExportFormat::Shapefile
        );
        assert!(ExportFormat::from_path(Path::new("grid")).is_err());
    }

    #[test]
    fn test_unsupported_format() {
        let dir = TempDir::new().unwrap();
        let err = export_grid(&sample_grid(), dir.path().join("vermont_grid.gpx")).unwrap_err();
        assert!(matches!(err, AwhereError::UnsupportedFormat(ref ext) if ext == "gpx"));
        assert!(!dir.path().join("vermont_grid.gpx").exists());
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("missing").join("grid.csv");
        let err = export_grid(&sample_grid(), &target).unwrap_err();
        assert!(matches!(err, AwhereError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_export_csv() {
        let dir = TempDir::new().unwrap();
        let path = export_grid(&sample_grid(), dir.path().join("grid.csv")).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                "tile_id",
                "min_lon",
                "min_lat",
                "max_lon",
                "max_lat",
                "centroid_lon",
                "centroid_lat",
                "count",
                "sum"
            ]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][5], "-72.75");
        assert_eq!(&rows[0][8], "340.5");
        assert_eq!(&rows[1][8], "");
    }

    #[test]
    fn test_export_geojson_overwrites() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("grid.geojson");
        fs::write(&target, "stale").unwrap();

        export_grid(&sample_grid(), &target).unwrap();
        let geojson: GeoJson = fs::read_to_string(&target).unwrap().parse().unwrap();
        let GeoJson::FeatureCollection(fc) = geojson else {
            panic!("expected a FeatureCollection");
        };
        assert_eq!(fc.features.len(), 2);
    }

    #[test]
    fn test_export_shapefile_and_geopackage() {
        let dir = TempDir::new().unwrap();
        for name in ["grid.shp", "grid.gpkg"] {
            let target = dir.path().join(name);
            // second write replaces the first
            export_grid(&sample_grid(), &target).unwrap();
            export_grid(&sample_grid(), &target).unwrap();

            let dataset = Dataset::open(&target).unwrap();
            let mut layer = dataset.layer(0).unwrap();
            assert_eq!(layer.feature_count(), 2);

            let feature = layer.features().next().unwrap();
            let count = feature.field("count").unwrap().and_then(|v| v.into_real());
            assert_eq!(count, Some(12.0));
        }
    }

    #[test]
    fn test_export_long_attribute_names() {
        let mut grid = sample_grid();
        for (tile, value) in grid.tiles_mut().iter_mut().zip([7.5, 2.0]) {
            tile.set_attribute("percentile_90", Some(value));
        }
        let dir = TempDir::new().unwrap();

        let target = export_grid(&grid, dir.path().join("grid.shp")).unwrap();
        let dataset = Dataset::open(&target).unwrap();
        let mut layer = dataset.layer(0).unwrap();
        let stored: Vec<String> = layer.defn().fields().map(|field| field.name()).collect();
        assert_eq!(stored, vec!["tile_id", "count", "sum", "percentile"]);
        let feature = layer.features().next().unwrap();
        let value = feature.field("percentile").unwrap().and_then(|v| v.into_real());
        assert_eq!(value, Some(7.5));

        let target = export_grid(&grid, dir.path().join("grid.gpkg")).unwrap();
        let dataset = Dataset::open(&target).unwrap();
        let mut layer = dataset.layer(0).unwrap();
        let feature = layer.features().next().unwrap();
        let value = feature.field("percentile_90").unwrap().and_then(|v| v.into_real());
        assert_eq!(value, Some(7.5));
    }
}
