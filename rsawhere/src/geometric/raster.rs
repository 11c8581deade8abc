use gdal::Dataset;
use std::path::Path;

use crate::error::{AwhereError, Result};
use crate::geo_core::epsg_of;

/// Affine pixel-to-world transform in GDAL geotransform order:
/// `[x_origin, pixel_width, row_rotation, y_origin, column_rotation, pixel_height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine(pub [f64; 6]);

impl Affine {
    /// North-up transform without rotation.
    pub fn north_up(x_origin: f64, y_origin: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Affine([x_origin, pixel_width, 0.0, y_origin, 0.0, -pixel_height.abs()])
    }

    fn determinant(&self) -> f64 {
        let gt = &self.0;
        gt[1] * gt[5] - gt[2] * gt[4]
    }

    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det != 0.0
    }

    /// World coordinates of the centre of pixel `(col, row)`.
    pub fn pixel_centre(&self, col: usize, row: usize) -> (f64, f64) {
        let gt = &self.0;
        let c = col as f64 + 0.5;
        let r = row as f64 + 0.5;
        (
            gt[0] + c * gt[1] + r * gt[2],
            gt[3] + c * gt[4] + r * gt[5],
        )
    }

    /// Fractional `(col, row)` of a world coordinate.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let gt = &self.0;
        let det = self.determinant();
        let dx = x - gt[0];
        let dy = y - gt[3];
        (
            (gt[5] * dx - gt[2] * dy) / det,
            (-gt[4] * dx + gt[1] * dy) / det,
        )
    }
}

/// Single-band raster held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSource {
    values: Vec<f64>,
    width: usize,
    height: usize,
    transform: Affine,
    nodata: Option<f64>,
    epsg: Option<i32>,
}

impl RasterSource {
    /// Read band 1 of a GDAL raster (GeoTIFF...). The file is closed before
    /// this returns.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AwhereError::InputNotFound(path.to_path_buf()));
        }

        let dataset = Dataset::open(path)?;
        if dataset.raster_count() == 0 {
            return Err(AwhereError::invalid(
                "raster",
                format!("{} has no raster band", path.display()),
            ));
        }

        let band = dataset.rasterband(1)?;
        let (width, height) = dataset.raster_size();
        let buffer = band.read_as::<f64>((0, 0), (width, height), (width, height), None)?;
        let (_, values) = buffer.into_shape_and_vec();
        let nodata = band.no_data_value();
        let transform = Affine(dataset.geo_transform()?);
        let epsg = dataset.spatial_ref().ok().and_then(|srs| epsg_of(&srs));

        log::info!(
            "Read {}x{} raster from {} (nodata: {:?})",
            width,
            height,
            path.display(),
            nodata
        );

        let mut raster = RasterSource::new(values, width, height, transform, nodata)?;
        raster.epsg = epsg;
        Ok(raster)
    }

    /// Wrap row-major `values` of a `width` x `height` raster.
    pub fn new(
        values: Vec<f64>,
        width: usize,
        height: usize,
        transform: Affine,
        nodata: Option<f64>,
    ) -> Result<Self> {
        if values.len() != width * height {
            return Err(AwhereError::invalid(
                "raster",
                format!(
                    "expected {} values for a {}x{} raster, got {}",
                    width * height,
                    width,
                    height,
                    values.len()
                ),
            ));
        }
        if !transform.is_invertible() {
            return Err(AwhereError::invalid(
                "raster",
                format!("geotransform {:?} is not invertible", transform.0),
            ));
        }

        Ok(RasterSource {
            values,
            width,
            height,
            transform,
            nodata,
            epsg: None,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// EPSG code of the raster CRS when the file declares one.
    pub fn epsg(&self) -> Option<i32> {
        self.epsg
    }

    pub fn value(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.width || row >= self.height {
            return None;
        }
        Some(self.values[row * self.width + col])
    }

    pub fn is_nodata(&self, value: f64) -> bool {
        self.nodata.is_some_and(|nodata| value == nodata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_centre_north_up() {
        let transform = Affine::north_up(-73.5, 45.0, 0.25, 0.25);
        assert_eq!(transform.pixel_centre(0, 0), (-73.375, 44.875));
        assert_eq!(transform.pixel_centre(2, 1), (-72.875, 44.625));
    }

    #[test]
    fn test_to_pixel_inverts_pixel_centre_with_rotation() {
        let transform = Affine([100.0, 2.0, 0.5, 50.0, 0.25, -2.0]);
        let (x, y) = transform.pixel_centre(3, 7);
        let (col, row) = transform.to_pixel(x, y);
        assert!((col - 3.5).abs() < 1e-12);
        assert!((row - 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_new_checks_value_count() {
        let err = RasterSource::new(vec![1.0; 5], 2, 2, Affine::north_up(0.0, 2.0, 1.0, 1.0), None)
            .unwrap_err();
        assert!(matches!(err, AwhereError::InvalidParameter { name: "raster", .. }));
    }

    #[test]
    fn test_degenerate_transform_is_rejected() {
        let err = RasterSource::new(vec![1.0], 1, 1, Affine([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]), None)
            .unwrap_err();
        assert!(matches!(err, AwhereError::InvalidParameter { .. }));
    }

    #[test]
    fn test_value_and_nodata() {
        let raster = RasterSource::new(
            vec![1.0, 2.0, 3.0, -9999.0],
            2,
            2,
            Affine::north_up(0.0, 2.0, 1.0, 1.0),
            Some(-9999.0),
        )
        .unwrap();
        assert_eq!(raster.value(1, 0), Some(2.0));
        assert_eq!(raster.value(0, 1), Some(3.0));
        assert_eq!(raster.value(2, 0), None);
        assert!(raster.is_nodata(-9999.0));
        assert!(!raster.is_nodata(3.0));
    }

    #[test]
    fn test_missing_raster() {
        let err = RasterSource::open("/nonexistent/population.tif").unwrap_err();
        assert!(matches!(err, AwhereError::InputNotFound(_)));
    }
}
