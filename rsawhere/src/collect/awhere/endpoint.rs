use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::collect::global_variables::DEFAULT_LIMIT;
use crate::error::{AwhereError, Result};

/// What a request is about.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A point, addressed as `locations/{latitude},{longitude}`.
    Location { latitude: f64, longitude: f64 },
    /// A registered field, addressed as `fields/{id}`.
    Field(String),
    /// One record of a collection (a crop, a model, a planting...).
    Id(String),
    /// One record of a collection scoped to a field, addressed as
    /// `fields/{field}/{dataset}/{id}`.
    FieldItem { field: String, id: String },
    /// Every record of a collection.
    All,
}

impl Target {
    pub fn kind(&self) -> TargetKind {
        match self {
            Target::Location { .. } => TargetKind::Location,
            Target::Field(_) => TargetKind::Field,
            Target::Id(_) => TargetKind::Id,
            Target::FieldItem { .. } => TargetKind::FieldItem,
            Target::All => TargetKind::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Location,
    Field,
    Id,
    FieldItem,
    All,
}

/// A day as accepted by the API: `MM-DD` for norms, `YYYY-MM-DD` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Day {
    MonthDay { month: u32, day: u32 },
    Date(NaiveDate),
}

impl Day {
    pub fn month_day(month: u32, day: u32) -> Result<Self> {
        // leap year so that 02-29 is accepted
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return Err(AwhereError::invalid(
                "day",
                format!("{:02}-{:02} is not a calendar day", month, day),
            ));
        }
        Ok(Day::MonthDay { month, day })
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Day::MonthDay { month, day } => write!(f, "{:02}-{:02}", month, day),
            Day::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl FromStr for Day {
    type Err = AwhereError;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Day::Date(date));
        }
        let invalid = || AwhereError::invalid("day", format!("expected MM-DD or YYYY-MM-DD, got '{}'", s));
        let (month, day) = s.split_once('-').ok_or_else(invalid)?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let day: u32 = day.parse().map_err(|_| invalid())?;
        Day::month_day(month, day)
    }
}

impl From<NaiveDate> for Day {
    fn from(date: NaiveDate) -> Self {
        Day::Date(date)
    }
}

/// A single day or an inclusive range, rendered `start` or `start,end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub start: Day,
    pub end: Option<Day>,
}

impl DayRange {
    pub fn single(day: Day) -> Self {
        DayRange {
            start: day,
            end: None,
        }
    }

    pub fn between(start: Day, end: Day) -> Result<Self> {
        if let (Day::Date(a), Day::Date(b)) = (start, end) {
            if b < a {
                return Err(AwhereError::invalid(
                    "days",
                    format!("end {} is before start {}", b, a),
                ));
            }
        }
        if matches!(start, Day::MonthDay { .. }) != matches!(end, Day::MonthDay { .. }) {
            return Err(AwhereError::invalid(
                "days",
                "start and end must both be MM-DD or both be YYYY-MM-DD",
            ));
        }
        Ok(DayRange {
            start,
            end: Some(end),
        })
    }

    /// Month-day range of the given dates, as used by norms requests.
    pub fn norms_between(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        DayRange::between(
            Day::month_day(start.month(), start.day())?,
            Day::month_day(end.month(), end.day())?,
        )
    }
}

impl fmt::Display for DayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.end {
            Some(end) => write!(f, "{},{}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

/// Parameters of one API request.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub target: Target,
    pub days: Option<DayRange>,
    pub limit: u32,
    pub offset: u32,
    /// Forecast block size in hours.
    pub block_size: Option<u32>,
}

impl Query {
    pub fn new(target: Target) -> Self {
        Query {
            target,
            days: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
            block_size: None,
        }
    }

    pub fn location(latitude: f64, longitude: f64) -> Self {
        Query::new(Target::Location {
            latitude,
            longitude,
        })
    }

    pub fn field(field_id: &str) -> Self {
        Query::new(Target::Field(field_id.to_string()))
    }

    pub fn id(id: &str) -> Self {
        Query::new(Target::Id(id.to_string()))
    }

    pub fn field_item(field_id: &str, id: &str) -> Self {
        Query::new(Target::FieldItem {
            field: field_id.to_string(),
            id: id.to_string(),
        })
    }

    pub fn all() -> Self {
        Query::new(Target::All)
    }

    pub fn with_days(mut self, days: DayRange) -> Self {
        self.days = Some(days);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = Some(block_size);
        self
    }
}

/// A nested group of records inside a response item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    /// Key holding an array of records or a single record object.
    pub key: &'static str,
    /// `(column, label)` written on every record of the group. A tagged
    /// group missing from the item still yields one record with the label.
    pub tag: Option<(&'static str, &'static str)>,
}

/// Static description of one API resource and of how its JSON becomes a
/// table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint {
    pub name: &'static str,
    /// First path segment(s) under the API root, e.g. `weather`.
    pub service: &'static str,
    /// Resource name following the target, e.g. `norms`.
    pub dataset: Option<&'static str>,
    /// Segment appended after the target, e.g. `details`.
    pub suffix: Option<&'static str>,
    pub targets: &'static [TargetKind],
    /// Key holding the records in multi-record responses.
    pub list_key: Option<&'static str>,
    /// Nested groups whose entries become the records. Empty when each
    /// item is a record.
    pub explode: &'static [Section],
    /// `(source, destination)` columns copied from the enclosing object.
    pub carry: &'static [(&'static str, &'static str)],
    /// `(longitude, latitude)` columns turned into a point geometry.
    pub coordinates: Option<(&'static str, &'static str)>,
    pub drop: &'static [&'static str],
    pub rename: &'static [(&'static str, &'static str)],
    /// Key of a dated array in the response whose first and last `date`
    /// become `start_day`, `end_day` and `date_range`.
    pub span: Option<&'static str>,
    /// Column set to the requested id when the target is [`Target::Id`].
    pub id_column: Option<&'static str>,
}

impl Endpoint {
    pub fn accepts(&self, target: &Target) -> bool {
        self.targets.contains(&target.kind())
    }

    /// Request URL for `query`, relative to `api_url`.
    pub fn url(&self, api_url: &Url, query: &Query) -> Result<Url> {
        if !self.accepts(&query.target) {
            return Err(AwhereError::invalid(
                "target",
                format!("{} does not accept {:?}", self.name, query.target.kind()),
            ));
        }

        let mut segments: Vec<String> = self.service.split('/').map(str::to_string).collect();
        match &query.target {
            Target::Location {
                latitude,
                longitude,
            } => {
                segments.push("locations".to_string());
                segments.push(format!("{},{}", latitude, longitude));
                segments.extend(self.dataset.map(str::to_string));
            }
            Target::Field(id) => {
                segments.push("fields".to_string());
                segments.push(id.clone());
                segments.extend(self.dataset.map(str::to_string));
            }
            Target::Id(id) => {
                segments.extend(self.dataset.map(str::to_string));
                segments.push(id.clone());
            }
            Target::FieldItem { field, id } => {
                segments.push("fields".to_string());
                segments.push(field.clone());
                segments.extend(self.dataset.map(str::to_string));
                segments.push(id.clone());
            }
            Target::All => segments.extend(self.dataset.map(str::to_string)),
        }
        segments.extend(self.suffix.map(str::to_string));
        if let Some(days) = &query.days {
            segments.push(days.to_string());
        }

        let mut url = api_url.clone();
        url.path_segments_mut()
            .map_err(|_| AwhereError::invalid("api_url", format!("{} cannot be a base", api_url)))?
            .pop_if_empty()
            .extend(&segments);
        url.query_pairs_mut()
            .append_pair("limit", &query.limit.to_string())
            .append_pair("offset", &query.offset.to_string());
        if let Some(block_size) = query.block_size {
            url.query_pairs_mut()
                .append_pair("blockSize", &block_size.to_string());
        }

        Ok(url)
    }
}

const LOCATED: &[TargetKind] = &[TargetKind::Location, TargetKind::Field];

const LOCATION_CARRY: &[(&str, &str)] = &[
    ("location.longitude", "longitude"),
    ("location.latitude", "latitude"),
];

const LON_LAT: Option<(&str, &str)> = Some(("longitude", "latitude"));

const FIELD_LINKS: [&str; 6] = [
    "_links.self.href",
    "_links.curies",
    "_links.awhere:field.href",
    "location.fieldId",
    "location.longitude",
    "location.latitude",
];

/// 10-year daily weather norms.
pub const WEATHER_NORMS: Endpoint = Endpoint {
    name: "weather norms",
    service: "weather",
    dataset: Some("norms"),
    suffix: None,
    targets: LOCATED,
    list_key: Some("norms"),
    explode: &[],
    carry: LOCATION_CARRY,
    coordinates: LON_LAT,
    drop: &[
        FIELD_LINKS[0],
        FIELD_LINKS[1],
        FIELD_LINKS[2],
        FIELD_LINKS[3],
        FIELD_LINKS[4],
        FIELD_LINKS[5],
        "meanTemp.units",
        "maxTemp.units",
        "minTemp.units",
        "precipitation.units",
        "solar.units",
        "dailyMaxWind.units",
        "averageWind.units",
    ],
    rename: &[
        ("meanTemp.average", "mean_temp_avg_cels"),
        ("meanTemp.stdDev", "mean_temp_std_dev_cels"),
        ("maxTemp.average", "max_temp_avg_cels"),
        ("maxTemp.stdDev", "max_temp_std_dev_cels"),
        ("minTemp.average", "min_temp_avg_cels"),
        ("minTemp.stdDev", "min_temp_std_dev_cels"),
        ("precipitation.average", "precip_avg_mm"),
        ("precipitation.stdDev", "precip_std_dev_mm"),
        ("solar.average", "solar_avg_w_h_per_m2"),
        ("solar.stdDev", "solar_avg_std_dev_w_h_per_m2"),
        ("minHumidity.average", "min_humidity_avg_%"),
        ("minHumidity.stdDev", "min_humidity_std_dev_%"),
        ("maxHumidity.average", "max_humidity_avg_%"),
        ("maxHumidity.stdDev", "max_humidity_std_dev_%"),
        ("dailyMaxWind.average", "daily_max_wind_avg_m_per_sec"),
        ("dailyMaxWind.stdDev", "daily_max_wind_std_dev_m_per_sec"),
        ("averageWind.average", "average_wind_m_per_sec"),
        ("averageWind.stdDev", "average_wind_std_dev_m_per_sec"),
    ],
    span: None,
    id_column: None,
};

/// Observed daily weather (up to the last 30 months).
pub const WEATHER_OBSERVATIONS: Endpoint = Endpoint {
    name: "weather observations",
    service: "weather",
    dataset: Some("observations"),
    suffix: None,
    targets: LOCATED,
    list_key: Some("observations"),
    explode: &[],
    carry: LOCATION_CARRY,
    coordinates: LON_LAT,
    drop: &[
        FIELD_LINKS[0],
        FIELD_LINKS[1],
        FIELD_LINKS[2],
        FIELD_LINKS[3],
        FIELD_LINKS[4],
        FIELD_LINKS[5],
        "temperatures.units",
        "precipitation.units",
        "solar.units",
        "wind.units",
    ],
    rename: &[
        ("temperatures.max", "temp_max_cels"),
        ("temperatures.min", "temp_min_cels"),
        ("precipitation.amount", "precip_amount_mm"),
        ("solar.amount", "solar_energy_w_h_per_m2"),
        ("relativeHumidity.average", "rel_humidity_avg_%"),
        ("relativeHumidity.max", "rel_humidity_max_%"),
        ("relativeHumidity.min", "rel_humidity_min_%"),
        ("wind.morningMax", "wind_morning_max_m_per_sec"),
        ("wind.dayMax", "wind_day_max_m_per_sec"),
        ("wind.average", "wind_avg_m_per_sec"),
    ],
    span: None,
    id_column: None,
};

/// Forecast blocks; one record per block, each carrying its day and point.
pub const WEATHER_FORECAST: Endpoint = Endpoint {
    name: "weather forecast",
    service: "weather",
    dataset: Some("forecasts"),
    suffix: None,
    targets: LOCATED,
    list_key: Some("forecasts"),
    explode: &[Section {
        key: "forecast",
        tag: None,
    }],
    carry: &[
        ("date", "date"),
        ("location.longitude", "longitude"),
        ("location.latitude", "latitude"),
    ],
    coordinates: LON_LAT,
    drop: &[
        "soilTemperatures",
        "soilMoisture",
        "temperatures.units",
        "precipitation.units",
        "solar.units",
        "wind.units",
        "dewPoint.units",
    ],
    rename: &[
        ("startTime", "start_time"),
        ("endTime", "end_time"),
        ("conditionsCode", "conditions_code"),
        ("conditionsText", "conditions_text"),
        ("temperatures.max", "temp_max_cels"),
        ("temperatures.min", "temp_min_cels"),
        ("precipitation.chance", "precip_chance_%"),
        ("precipitation.amount", "precip_amount_mm"),
        ("sky.cloudCover", "sky_cloud_cover_%"),
        ("sky.sunshine", "sky_sunshine_%"),
        ("solar.amount", "solar_energy_w_h_per_m2"),
        ("relativeHumidity.average", "rel_humidity_avg_%"),
        ("relativeHumidity.max", "rel_humidity_max_%"),
        ("relativeHumidity.min", "rel_humidity_min_%"),
        ("wind.average", "wind_avg_m_per_sec"),
        ("wind.max", "wind_max_m_per_sec"),
        ("wind.min", "wind_min_m_per_sec"),
        ("wind.bearing", "wind_bearing_deg"),
        ("wind.direction", "wind_direction_compass"),
        ("dewPoint.amount", "dew_point_cels"),
    ],
    span: None,
    id_column: None,
};

/// Accumulated agronomic values over the requested range.
pub const AGRONOMIC_VALUES: Endpoint = Endpoint {
    name: "agronomic values",
    service: "agronomics",
    dataset: Some("agronomicvalues"),
    suffix: None,
    targets: LOCATED,
    list_key: Some("accumulations"),
    explode: &[],
    carry: LOCATION_CARRY,
    coordinates: LON_LAT,
    drop: &[
        FIELD_LINKS[0],
        FIELD_LINKS[1],
        FIELD_LINKS[2],
        FIELD_LINKS[3],
        FIELD_LINKS[4],
        FIELD_LINKS[5],
        "precipitation.units",
        "pet.units",
    ],
    rename: &[
        ("gdd", "gdd_range_total_cels"),
        ("ppet", "ppet_range_total"),
        ("precipitation.amount", "precip_range_total_mm"),
        ("pet.amount", "pet_range_total_mm"),
    ],
    span: Some("dailyValues"),
    id_column: None,
};

/// Agronomic values for each day of the requested range.
pub const AGRONOMIC_VALUES_DAILY: Endpoint = Endpoint {
    name: "daily agronomic values",
    service: "agronomics",
    dataset: Some("agronomicvalues"),
    suffix: None,
    targets: LOCATED,
    list_key: Some("dailyValues"),
    explode: &[],
    carry: LOCATION_CARRY,
    coordinates: LON_LAT,
    drop: &[
        FIELD_LINKS[0],
        FIELD_LINKS[1],
        FIELD_LINKS[2],
        FIELD_LINKS[3],
        FIELD_LINKS[4],
        FIELD_LINKS[5],
        "pet.units",
        "accumulatedPrecipitation.units",
        "accumulatedPet.units",
    ],
    rename: &[
        ("gdd", "gdd_daily_total_cels"),
        ("ppet", "ppet_daily_total"),
        ("accumulatedGdd", "gdd_rolling_total_cels"),
        ("accumulatedPpet", "ppet_rolling_total"),
        ("pet.amount", "pet_daily_total_mm"),
        ("accumulatedPrecipitation.amount", "precip_rolling_total_mm"),
        ("accumulatedPet.amount", "pet_rolling_total_mm"),
    ],
    span: None,
    id_column: None,
};

/// Long-term agronomic norms for each day of the requested range.
pub const AGRONOMIC_NORMS: Endpoint = Endpoint {
    name: "agronomic norms",
    service: "agronomics",
    dataset: Some("agronomicnorms"),
    suffix: None,
    targets: LOCATED,
    list_key: Some("dailyNorms"),
    explode: &[],
    carry: LOCATION_CARRY,
    coordinates: LON_LAT,
    drop: &[
        FIELD_LINKS[0],
        FIELD_LINKS[1],
        FIELD_LINKS[2],
        FIELD_LINKS[3],
        FIELD_LINKS[4],
        FIELD_LINKS[5],
        "pet.units",
        "accumulatedPrecipitation.units",
        "accumulatedPet.units",
    ],
    rename: &[
        ("gdd.average", "gdd_daily_average_cels"),
        ("gdd.stdDev", "gdd_daily_average_std_dev_cels"),
        ("pet.average", "pet_daily_average_mm"),
        ("pet.stdDev", "pet_daily_average_std_dev_mm"),
        ("ppet.average", "ppet_daily_average"),
        ("ppet.stdDev", "ppet_daily_average_std_dev"),
        ("accumulatedGdd.average", "gdd_rolling_total_average"),
        ("accumulatedGdd.stdDev", "gdd_rolling_total_average_std_dev"),
        ("accumulatedPrecipitation.average", "precip_rolling_total_average_mm"),
        ("accumulatedPrecipitation.stdDev", "precip_rolling_total_average_std_dev_mm"),
        ("accumulatedPet.average", "pet_rolling_total_average_mm"),
        ("accumulatedPet.stdDev", "pet_rolling_total_average_std_dev_mm"),
        ("accumulatedPpet.average", "ppet_rolling_total_average"),
        ("accumulatedPpet.stdDev", "ppet_rolling_total_average_std_dev"),
    ],
    span: None,
    id_column: None,
};

/// Registered fields, located at their centre point.
pub const FIELDS: Endpoint = Endpoint {
    name: "fields",
    service: "fields",
    dataset: None,
    suffix: None,
    targets: &[TargetKind::Id, TargetKind::All],
    list_key: Some("fields"),
    explode: &[],
    carry: &[],
    coordinates: Some(("centerPoint.longitude", "centerPoint.latitude")),
    drop: &[
        "_links.self.href",
        "_links.curies",
        "_links.awhere:observations.href",
        "_links.awhere:forecasts.href",
        "_links.awhere:plantings.href",
        "_links.awhere:agronomics.href",
    ],
    rename: &[
        ("name", "field_name"),
        ("acres", "area_acres"),
        ("farmId", "farm_id"),
        ("id", "field_id"),
    ],
    span: None,
    id_column: None,
};

pub const CROPS: Endpoint = Endpoint {
    name: "crops",
    service: "agronomics",
    dataset: Some("crops"),
    suffix: None,
    targets: &[TargetKind::Id, TargetKind::All],
    list_key: Some("crops"),
    explode: &[],
    carry: &[],
    coordinates: None,
    drop: &[
        "_links.self.href",
        "_links.curies",
        "_links.awhere:plantings.href",
    ],
    rename: &[
        ("id", "crop_id"),
        ("name", "crop_name"),
        ("type", "crop_type"),
        ("variety", "crop_variety"),
        ("isDefaultForCrop", "default_crop"),
    ],
    span: None,
    id_column: None,
};

/// Crop growth-stage models.
pub const MODELS: Endpoint = Endpoint {
    name: "models",
    service: "agronomics",
    dataset: Some("models"),
    suffix: None,
    targets: &[TargetKind::Id, TargetKind::All],
    list_key: Some("models"),
    explode: &[],
    carry: &[],
    coordinates: None,
    drop: &[
        "_links.self.href",
        "_links.curies",
        "_links.awhere:crop",
        "_links.awhere:modelDetails.href",
    ],
    rename: &[
        ("id", "model_id"),
        ("name", "model_name"),
        ("description", "model_description"),
        ("type", "model_type"),
        ("source.name", "model_source"),
        ("source.link", "model_link"),
    ],
    span: None,
    id_column: None,
};

/// Growth stages of one model, each carrying the model's degree-day setup.
pub const MODEL_DETAILS: Endpoint = Endpoint {
    name: "model details",
    service: "agronomics",
    dataset: Some("models"),
    suffix: Some("details"),
    targets: &[TargetKind::Id],
    list_key: None,
    explode: &[Section {
        key: "stages",
        tag: None,
    }],
    carry: &[
        ("biofix", "biofix_days"),
        ("gddMethod", "gdd_method"),
        ("gddBaseTemp", "gdd_base_temp_cels"),
        ("gddMaxBoundary", "gdd_max_boundary_cels"),
        ("gddMinBoundary", "gdd_min_boundary_cels"),
    ],
    coordinates: None,
    drop: &["gddUnits", "_links.self.href", "_links.curies"],
    rename: &[
        ("id", "stage_id"),
        ("stage", "stage_name"),
        ("description", "stage_description"),
        ("gddThreshold", "gdd_threshold_cels"),
    ],
    span: None,
    id_column: Some("model_id"),
};

/// Previous, current and next growth stages of a model run on a field's
/// planting.
pub const MODEL_RESULTS: Endpoint = Endpoint {
    name: "model results",
    service: "agronomics",
    dataset: Some("models"),
    suffix: Some("results"),
    targets: &[TargetKind::FieldItem],
    list_key: None,
    explode: &[
        Section {
            key: "previousStages",
            tag: Some(("stage_status", "Previous")),
        },
        Section {
            key: "currentStage",
            tag: Some(("stage_status", "Current")),
        },
        Section {
            key: "nextStage",
            tag: Some(("stage_status", "Next")),
        },
    ],
    carry: &[
        ("modelId", "model_id"),
        ("biofixDate", "biofix_date"),
        ("plantingDate", "planting_date"),
        ("location.fieldId", "field_id"),
        ("location.longitude", "longitude"),
        ("location.latitude", "latitude"),
    ],
    coordinates: LON_LAT,
    drop: &["_links.self.href", "_links.curies"],
    rename: &[
        ("date", "stage_start_date"),
        ("id", "stage_id"),
        ("stage", "stage_name"),
        ("description", "stage_description"),
        ("gddThreshold", "gdd_threshold_cels"),
        ("accumulatedGdds", "gdd_accumulation_current_cels"),
        ("gddRemaining", "gdd_remaining_next_cels"),
    ],
    span: None,
    id_column: None,
};

/// Plantings, either all of them, one by id, or those of a field.
pub const PLANTINGS: Endpoint = Endpoint {
    name: "plantings",
    service: "agronomics",
    dataset: Some("plantings"),
    suffix: None,
    targets: &[TargetKind::Field, TargetKind::Id, TargetKind::All],
    list_key: Some("plantings"),
    explode: &[],
    carry: &[],
    coordinates: None,
    drop: &[
        "_links.self.href",
        "_links.curies",
        "_links.awhere:crop.href",
        "_links.awhere:field.href",
    ],
    rename: &[
        ("id", "planting_id"),
        ("crop", "crop_id"),
        ("field", "field_id"),
        ("plantingDate", "planting_date"),
        ("harvestDate", "harvest_date_actual"),
        ("yield.amount", "yield_amount_actual"),
        ("yield.units", "yield_amount_actual_units"),
        ("projections.yield.amount", "yield_amount_projected"),
        ("projections.yield.units", "yield_amount_projected_units"),
        ("projections.harvestDate", "harvest_date_projected"),
    ],
    span: None,
    id_column: None,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn api_url() -> Url {
        Url::parse("https://api.awhere.com/v2/").unwrap()
    }

    #[test]
    fn test_day_rendering() {
        assert_eq!(Day::month_day(3, 4).unwrap().to_string(), "03-04");
        let date = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
        assert_eq!(Day::from(date).to_string(), "2020-05-01");
        assert!(Day::month_day(2, 30).is_err());
        assert!(Day::month_day(2, 29).is_ok());
    }

    #[test]
    fn test_day_parsing() {
        assert_eq!("03-04".parse::<Day>().unwrap(), Day::MonthDay { month: 3, day: 4 });
        assert_eq!(
            "2020-05-01".parse::<Day>().unwrap(),
            Day::Date(NaiveDate::from_ymd_opt(2020, 5, 1).unwrap())
        );
        assert!("tomorrow".parse::<Day>().is_err());
    }

    #[test]
    fn test_day_range() {
        let start = Day::month_day(3, 4).unwrap();
        let end = Day::month_day(3, 7).unwrap();
        assert_eq!(DayRange::between(start, end).unwrap().to_string(), "03-04,03-07");
        assert_eq!(DayRange::single(start).to_string(), "03-04");

        let date = Day::Date(NaiveDate::from_ymd_opt(2020, 5, 1).unwrap());
        assert!(DayRange::between(start, date).is_err());

        let earlier = Day::Date(NaiveDate::from_ymd_opt(2020, 4, 1).unwrap());
        assert!(DayRange::between(date, earlier).is_err());
    }

    #[test]
    fn test_location_url() {
        let days = DayRange::between(
            Day::month_day(1, 1).unwrap(),
            Day::month_day(1, 5).unwrap(),
        )
        .unwrap();
        let query = Query::location(43.527, -73.4378).with_days(days);
        let url = WEATHER_NORMS.url(&api_url(), &query).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.awhere.com/v2/weather/locations/43.527,-73.4378/norms/01-01,01-05?limit=10&offset=0"
        );
    }

    #[test]
    fn test_field_forecast_url() {
        let query = Query::field("field-1").with_block_size(6).with_offset(10);
        let url = WEATHER_FORECAST.url(&api_url(), &query).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.awhere.com/v2/weather/fields/field-1/forecasts?limit=10&offset=10&blockSize=6"
        );
    }

    #[test]
    fn test_collection_urls() {
        let url = CROPS.url(&api_url(), &Query::all().with_limit(5)).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.awhere.com/v2/agronomics/crops?limit=5&offset=0"
        );

        let url = FIELDS.url(&api_url(), &Query::id("vt field")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.awhere.com/v2/fields/vt%20field?limit=10&offset=0"
        );

        let url = PLANTINGS.url(&api_url(), &Query::field("field-1")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.awhere.com/v2/agronomics/fields/field-1/plantings?limit=10&offset=0"
        );
    }

    #[test]
    fn test_model_urls() {
        let url = MODEL_DETAILS
            .url(&api_url(), &Query::id("BarleyGenericMSU"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.awhere.com/v2/agronomics/models/BarleyGenericMSU/details?limit=10&offset=0"
        );

        let query = Query::field_item("field-1", "WheatHardRedMSU");
        let url = MODEL_RESULTS.url(&api_url(), &query).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.awhere.com/v2/agronomics/fields/field-1/models/WheatHardRedMSU/results?limit=10&offset=0"
        );
        assert!(MODEL_RESULTS.url(&api_url(), &Query::id("WheatHardRedMSU")).is_err());
        assert!(MODEL_DETAILS.url(&api_url(), &query).is_err());
    }

    #[test]
    fn test_unsupported_target() {
        let err = WEATHER_NORMS.url(&api_url(), &Query::all()).unwrap_err();
        assert!(matches!(err, AwhereError::InvalidParameter { name: "target", .. }));
        assert!(!MODELS.accepts(&Target::Location {
            latitude: 0.0,
            longitude: 0.0
        }));
    }
}
