use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{AwhereError, Result};
use crate::geo_core::BoundingBox;
use crate::geometric::grid::Grid;
use crate::geometric::raster::RasterSource;

/// Zonal statistic computed per tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statistic {
    Count,
    Min,
    Max,
    Mean,
    Sum,
    Std,
    Median,
    Majority,
    Minority,
    Unique,
    Range,
    /// Cells equal to the raster nodata value.
    Nodata,
    /// NaN cells.
    Nan,
    /// Percentile in `[0, 100]`, linear interpolation.
    Percentile(f64),
}

impl Statistic {
    pub const DEFAULTS: [Statistic; 2] = [Statistic::Count, Statistic::Sum];

    /// Parse a space-delimited list such as `"count sum"`.
    pub fn parse_list(stats: &str) -> Result<Vec<Statistic>> {
        let parsed = stats
            .split_whitespace()
            .map(str::parse::<Statistic>)
            .collect::<Result<Vec<Statistic>>>()?;
        if parsed.is_empty() {
            return Err(AwhereError::invalid(
                "statistics",
                "at least one statistic is required",
            ));
        }
        Ok(parsed)
    }

    /// Attribute name the statistic is stored under.
    pub fn name(&self) -> String {
        match self {
            Statistic::Count => "count".to_string(),
            Statistic::Min => "min".to_string(),
            Statistic::Max => "max".to_string(),
            Statistic::Mean => "mean".to_string(),
            Statistic::Sum => "sum".to_string(),
            Statistic::Std => "std".to_string(),
            Statistic::Median => "median".to_string(),
            Statistic::Majority => "majority".to_string(),
            Statistic::Minority => "minority".to_string(),
            Statistic::Unique => "unique".to_string(),
            Statistic::Range => "range".to_string(),
            Statistic::Nodata => "nodata".to_string(),
            Statistic::Nan => "nan".to_string(),
            Statistic::Percentile(q) if q.fract() == 0.0 => format!("percentile_{}", *q as i64),
            Statistic::Percentile(q) => format!("percentile_{}", q),
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Statistic {
    type Err = AwhereError;

    fn from_str(s: &str) -> Result<Self> {
        let stat = match s.trim().to_ascii_lowercase().as_str() {
            "count" => Statistic::Count,
            "min" => Statistic::Min,
            "max" => Statistic::Max,
            "mean" => Statistic::Mean,
            "sum" => Statistic::Sum,
            "std" => Statistic::Std,
            "median" => Statistic::Median,
            "majority" => Statistic::Majority,
            "minority" => Statistic::Minority,
            "unique" => Statistic::Unique,
            "range" => Statistic::Range,
            "nodata" => Statistic::Nodata,
            "nan" => Statistic::Nan,
            other => match other.strip_prefix("percentile_") {
                Some(q) => {
                    let q: f64 = q
                        .parse()
                        .map_err(|_| AwhereError::UnknownStatistic(s.to_string()))?;
                    if !(0.0..=100.0).contains(&q) {
                        return Err(AwhereError::invalid(
                            "statistics",
                            format!("percentile must be in [0, 100], got {}", q),
                        ));
                    }
                    Statistic::Percentile(q)
                }
                None => return Err(AwhereError::UnknownStatistic(s.to_string())),
            },
        };
        Ok(stat)
    }
}

/// Raster cells whose centre falls in one zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZonalSample {
    /// Valid values, sorted ascending.
    values: Vec<f64>,
    nodata: usize,
    nan: usize,
}

impl ZonalSample {
    pub fn new(mut values: Vec<f64>, nodata: usize, nan: usize) -> Self {
        values.sort_by(f64::total_cmp);
        ZonalSample {
            values,
            nodata,
            nan,
        }
    }

    /// Gather the cells of `raster` whose centre lies in `zone`.
    ///
    /// Zones are half-open (`min <= x < max`) so abutting tiles never share a
    /// cell.
    pub fn from_raster(raster: &RasterSource, zone: &BoundingBox) -> Self {
        let mut values = Vec::new();
        let mut nodata = 0;
        let mut nan = 0;

        let Some((cols, rows)) = pixel_window(raster, zone) else {
            return ZonalSample::default();
        };

        let transform = raster.transform();
        for row in rows {
            for col in cols.clone() {
                let (x, y) = transform.pixel_centre(col, row);
                if !zone.contains_half_open(x, y) {
                    continue;
                }
                let Some(value) = raster.value(col, row) else {
                    continue;
                };
                if value.is_nan() {
                    nan += 1;
                } else if raster.is_nodata(value) {
                    nodata += 1;
                } else {
                    values.push(value);
                }
            }
        }

        ZonalSample::new(values, nodata, nan)
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Value of one statistic. An empty sample only has `count`, `nodata`
    /// and `nan`.
    pub fn statistic(&self, stat: Statistic) -> Option<f64> {
        match stat {
            Statistic::Count => return Some(self.values.len() as f64),
            Statistic::Nodata => return Some(self.nodata as f64),
            Statistic::Nan => return Some(self.nan as f64),
            _ => {}
        }

        let first = *self.values.first()?;
        let last = *self.values.last()?;
        let n = self.values.len() as f64;

        let value = match stat {
            Statistic::Min => first,
            Statistic::Max => last,
            Statistic::Range => last - first,
            Statistic::Sum => self.values.iter().sum(),
            Statistic::Mean => self.mean(),
            Statistic::Std => {
                let mean = self.mean();
                let variance = self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                variance.sqrt()
            }
            Statistic::Median => self.percentile(50.0),
            Statistic::Percentile(q) => self.percentile(q),
            Statistic::Majority => self.mode(|count, best| count > best),
            Statistic::Minority => self.mode(|count, best| count < best),
            Statistic::Unique => self.runs().len() as f64,
            Statistic::Count | Statistic::Nodata | Statistic::Nan => return None,
        };
        Some(value)
    }

    fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    fn percentile(&self, q: f64) -> f64 {
        let position = q / 100.0 * (self.values.len() - 1) as f64;
        let lower = position.floor() as usize;
        let upper = position.ceil() as usize;
        let low = self.values[lower];
        low + (self.values[upper] - low) * (position - lower as f64)
    }

    /// `(value, occurrences)` in ascending value order.
    fn runs(&self) -> Vec<(f64, usize)> {
        let mut runs: Vec<(f64, usize)> = Vec::new();
        for &value in &self.values {
            match runs.last_mut() {
                Some((last, count)) if *last == value => *count += 1,
                _ => runs.push((value, 1)),
            }
        }
        runs
    }

    /// Value whose count wins under `better`; ties keep the smallest value.
    fn mode(&self, better: impl Fn(usize, usize) -> bool) -> f64 {
        let runs = self.runs();
        let mut best = runs[0];
        for &run in &runs[1..] {
            if better(run.1, best.1) {
                best = run;
            }
        }
        best.0
    }
}

/// Column and row ranges of pixels that may have their centre in `zone`.
fn pixel_window(
    raster: &RasterSource,
    zone: &BoundingBox,
) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
    let transform = raster.transform();
    let corners = [
        transform.to_pixel(zone.min_x, zone.min_y),
        transform.to_pixel(zone.min_x, zone.max_y),
        transform.to_pixel(zone.max_x, zone.min_y),
        transform.to_pixel(zone.max_x, zone.max_y),
    ];

    let (mut min_col, mut max_col) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_row, mut max_row) = (f64::INFINITY, f64::NEG_INFINITY);
    for (col, row) in corners {
        min_col = min_col.min(col);
        max_col = max_col.max(col);
        min_row = min_row.min(row);
        max_row = max_row.max(row);
    }

    let clamp = |low: f64, high: f64, size: usize| {
        let start = (low.floor() - 1.0).max(0.0);
        let end = (high.ceil() + 1.0).min(size as f64);
        (start < end).then(|| start as usize..end as usize)
    };

    Some((
        clamp(min_col, max_col, raster.width())?,
        clamp(min_row, max_row, raster.height())?,
    ))
}

/// Aggregate the raster at `raster_path` onto every tile of the grid.
pub fn rasterize<P: AsRef<Path>>(
    grid: &Grid,
    raster_path: P,
    statistics: &[Statistic],
) -> Result<Grid> {
    if statistics.is_empty() {
        return Err(AwhereError::invalid(
            "statistics",
            "at least one statistic is required",
        ));
    }
    let raster = RasterSource::open(raster_path)?;
    rasterize_source(grid, &raster, statistics)
}

/// Aggregate an in-memory raster onto every tile of the grid.
///
/// Returns a copy of the grid with one attribute per statistic; existing
/// attributes are kept and tile ids and order are unchanged.
pub fn rasterize_source(
    grid: &Grid,
    raster: &RasterSource,
    statistics: &[Statistic],
) -> Result<Grid> {
    if statistics.is_empty() {
        return Err(AwhereError::invalid(
            "statistics",
            "at least one statistic is required",
        ));
    }
    if let Some(epsg) = raster.epsg() {
        if epsg != grid.geo_core.get_epsg() {
            log::warn!(
                "Raster is in EPSG:{} but the grid is in EPSG:{}",
                epsg,
                grid.geo_core.get_epsg()
            );
        }
    }

    let names: Vec<String> = statistics.iter().map(Statistic::name).collect();
    let mut result = grid.clone();
    for tile in result.tiles_mut() {
        let sample = ZonalSample::from_raster(raster, &tile.bounds());
        for (stat, name) in statistics.iter().zip(&names) {
            tile.set_attribute(name, sample.statistic(*stat));
        }
    }

    log::info!(
        "Computed {} on {} tiles",
        names.join(", "),
        result.len()
    );
    Ok(result)
}
