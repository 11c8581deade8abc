use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building grids, aggregating rasters, exporting
/// results or talking to the aWhere API.
#[derive(Debug, Error)]
pub enum AwhereError {
    #[error("Input not found: '{0}'")]
    InputNotFound(PathBuf),

    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: &'static str, message: String },

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Unknown zonal statistic '{0}'")]
    UnknownStatistic(String),

    #[error("Unsupported export format '{0}'. Supported: csv, shp, geojson, gpkg")]
    UnsupportedFormat(String),

    #[error("Output directory does not exist: '{0}'")]
    DirectoryNotFound(PathBuf),

    #[error("Invalid aWhere API credentials")]
    InvalidCredentials,

    #[error("aWhere API returned {status} for {url}")]
    Api { status: u16, url: String },

    #[error(transparent)]
    Gdal(#[from] gdal::errors::GdalError),

    #[error(transparent)]
    Geos(#[from] geos::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[cfg(feature = "polars")]
    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}

impl AwhereError {
    pub(crate) fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        AwhereError::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AwhereError>;
