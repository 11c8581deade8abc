use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::{Map, Value};

use crate::collect::awhere::endpoint::{Endpoint, Section, Target};

/// Flatten nested objects into dot-joined keys.
///
/// `{"temperatures": {"max": 20.1}}` becomes `{"temperatures.max": 20.1}`.
/// Arrays and scalars are kept as they are. Empty objects leave no column,
/// and a non-object input flattens to an empty map.
pub fn flatten(value: &Value) -> Map<String, Value> {
    let mut flat = Map::new();
    if let Value::Object(object) = value {
        flatten_into(&mut flat, None, object);
    }
    flat
}

fn flatten_into(flat: &mut Map<String, Value>, prefix: Option<&str>, object: &Map<String, Value>) {
    for (key, value) in object {
        let name = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) => flatten_into(flat, Some(&name), inner),
            _ => {
                flat.insert(name, value.clone());
            }
        }
    }
}

/// Split an API response into flat records.
///
/// Records are read from `endpoint.list_key` when the response has it (an
/// array, or a single object), otherwise the whole response is one record.
/// With `endpoint.explode`, the entries of each nested group become records
/// of their own. Columns named in `endpoint.carry` are copied from the
/// enclosing object when the record does not already have them.
pub fn records(response: &Value, endpoint: &Endpoint) -> Vec<Map<String, Value>> {
    let listed = endpoint.list_key.and_then(|key| response.get(key));
    let (items, parent): (Vec<&Value>, Option<&Value>) = match listed {
        Some(Value::Array(items)) => (items.iter().collect(), Some(response)),
        Some(item @ Value::Object(_)) => (vec![item], Some(response)),
        _ => (vec![response], None),
    };

    let mut records = Vec::new();
    for item in items {
        let exploded = endpoint
            .explode
            .iter()
            .any(|section| item.get(section.key).is_some());

        if exploded {
            let enclosing = flatten(item);
            for section in endpoint.explode {
                for mut record in section_records(item.get(section.key), section) {
                    carry(&mut record, &enclosing, endpoint);
                    records.push(record);
                }
            }
        } else {
            let mut record = flatten(item);
            let enclosing = flatten(parent.unwrap_or(item));
            carry(&mut record, &enclosing, endpoint);
            records.push(record);
        }
    }

    if let Some(key) = endpoint.span {
        if let Some(span) = date_span(response.get(key)) {
            for record in &mut records {
                for (column, value) in &span {
                    record
                        .entry(column.to_string())
                        .or_insert_with(|| value.clone());
                }
            }
        }
    }
    records
}

fn section_records(group: Option<&Value>, section: &Section) -> Vec<Map<String, Value>> {
    let mut records: Vec<Map<String, Value>> = match group {
        Some(Value::Array(entries)) => entries.iter().map(flatten).collect(),
        Some(entry @ Value::Object(_)) => vec![flatten(entry)],
        _ => Vec::new(),
    };
    if let Some((column, label)) = section.tag {
        if records.is_empty() {
            records.push(Map::new());
        }
        for record in &mut records {
            record.insert(column.to_string(), Value::from(label));
        }
    }
    records
}

/// `start_day`, `end_day` and `date_range` from the first and last `date`
/// of a dated array.
fn date_span(dated: Option<&Value>) -> Option<[(&'static str, Value); 3]> {
    let entries = dated?.as_array()?;
    let first = entries.first()?.get("date")?.as_str()?;
    let last = entries.last()?.get("date")?.as_str()?;
    Some([
        ("start_day", Value::from(first)),
        ("end_day", Value::from(last)),
        ("date_range", Value::from(format!("{}/{}", first, last))),
    ])
}

fn carry(record: &mut Map<String, Value>, enclosing: &Map<String, Value>, endpoint: &Endpoint) {
    for (source, destination) in endpoint.carry {
        if record.contains_key(*destination) {
            continue;
        }
        let value = record.get(*source).or_else(|| enclosing.get(*source)).cloned();
        if let Some(value) = value {
            record.insert(destination.to_string(), value);
        }
    }
}

/// Set `endpoint.id_column` to the requested id on records that lack it.
///
/// Some resources, model details among them, do not echo the id they were
/// requested by.
pub fn stamp_target_id(records: &mut [Map<String, Value>], endpoint: &Endpoint, target: &Target) {
    if let (Some(column), Target::Id(id)) = (endpoint.id_column, target) {
        for record in records {
            record
                .entry(column.to_string())
                .or_insert_with(|| Value::from(id.as_str()));
        }
    }
}

/// Apply the endpoint's column drops, point geometry and renames.
///
/// Columns listed for dropping that a record lacks are ignored. A record
/// without both coordinate columns keeps a null geometry.
pub fn clean(records: Vec<Map<String, Value>>, endpoint: &Endpoint) -> FeatureCollection {
    let features = records
        .into_iter()
        .map(|mut record| {
            for column in endpoint.drop {
                record.remove(*column);
            }

            let geometry = endpoint.coordinates.and_then(|(lon_key, lat_key)| {
                let lon = record.remove(lon_key).and_then(|v| v.as_f64());
                let lat = record.remove(lat_key).and_then(|v| v.as_f64());
                match (lon, lat) {
                    (Some(lon), Some(lat)) => Some(Geometry::new(GeoJsonValue::Point(vec![lon, lat]))),
                    _ => None,
                }
            });

            for (from, to) in endpoint.rename {
                if let Some(value) = record.remove(*from) {
                    record.insert(to.to_string(), value);
                }
            }

            Feature {
                bbox: None,
                geometry,
                id: None,
                properties: Some(record),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::awhere::endpoint::{
        AGRONOMIC_VALUES, AGRONOMIC_VALUES_DAILY, CROPS, FIELDS, MODEL_DETAILS, MODEL_RESULTS,
        WEATHER_FORECAST, WEATHER_NORMS,
    };
    use serde_json::json;

    fn property<'a>(feature: &'a Feature, name: &str) -> Option<&'a Value> {
        feature.properties.as_ref().and_then(|p| p.get(name))
    }

    fn point(feature: &Feature) -> Vec<f64> {
        match &feature.geometry {
            Some(Geometry {
                value: GeoJsonValue::Point(position),
                ..
            }) => position.clone(),
            other => panic!("expected a point, got {:?}", other),
        }
    }

    #[test]
    fn test_flatten_nested_objects() {
        let flat = flatten(&json!({
            "day": "01-01",
            "meanTemp": {"average": -7.2, "stdDev": 3.1, "units": "C"},
            "links": {},
            "tags": [1, 2]
        }));
        assert_eq!(flat.get("meanTemp.average"), Some(&json!(-7.2)));
        assert_eq!(flat.get("meanTemp.units"), Some(&json!("C")));
        assert_eq!(flat.get("tags"), Some(&json!([1, 2])));
        assert!(!flat.contains_key("links"));
        assert_eq!(flat.len(), 5);
        assert!(flatten(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_weather_norms_range() {
        let response = json!({
            "norms": [
                {
                    "day": "01-01",
                    "location": {"latitude": 43.527, "longitude": -73.4378},
                    "meanTemp": {"average": -7.2, "stdDev": 3.1, "units": "C"},
                    "minHumidity": {"average": 61.0, "stdDev": 9.5},
                    "_links": {"self": {"href": "/v2/weather/locations/43.527,-73.4378/norms/01-01"}}
                },
                {
                    "day": "01-02",
                    "location": {"latitude": 43.527, "longitude": -73.4378},
                    "meanTemp": {"average": -7.5, "stdDev": 3.3, "units": "C"}
                }
            ]
        });

        let table = clean(records(&response, &WEATHER_NORMS), &WEATHER_NORMS);
        assert_eq!(table.features.len(), 2);

        let first = &table.features[0];
        assert_eq!(point(first), vec![-73.4378, 43.527]);
        assert_eq!(property(first, "mean_temp_avg_cels"), Some(&json!(-7.2)));
        assert_eq!(property(first, "min_humidity_avg_%"), Some(&json!(61.0)));
        assert_eq!(property(first, "day"), Some(&json!("01-01")));
        assert!(property(first, "meanTemp.units").is_none());
        assert!(property(first, "_links.self.href").is_none());
        assert!(property(first, "location.latitude").is_none());
        assert!(property(first, "longitude").is_none());
    }

    #[test]
    fn test_single_day_response_is_one_record() {
        let response = json!({
            "day": "01-01",
            "location": {"latitude": 43.527, "longitude": -73.4378},
            "meanTemp": {"average": -7.2, "stdDev": 3.1, "units": "C"}
        });

        let table = clean(records(&response, &WEATHER_NORMS), &WEATHER_NORMS);
        assert_eq!(table.features.len(), 1);
        assert_eq!(point(&table.features[0]), vec![-73.4378, 43.527]);
    }

    #[test]
    fn test_forecast_blocks_carry_day_and_location() {
        let response = json!({
            "forecasts": [
                {
                    "date": "2020-05-01",
                    "location": {"latitude": 43.5, "longitude": -73.4},
                    "forecast": [
                        {"startTime": "2020-05-01T00:00:00+00:00", "temperatures": {"max": 12.0, "units": "C"}, "soilMoisture": []},
                        {"startTime": "2020-05-01T06:00:00+00:00", "temperatures": {"max": 15.5, "units": "C"}}
                    ]
                },
                {
                    "date": "2020-05-02",
                    "location": {"latitude": 43.5, "longitude": -73.4},
                    "forecast": [
                        {"startTime": "2020-05-02T00:00:00+00:00", "temperatures": {"max": 9.0, "units": "C"}}
                    ]
                }
            ]
        });

        let table = clean(records(&response, &WEATHER_FORECAST), &WEATHER_FORECAST);
        assert_eq!(table.features.len(), 3);

        let second = &table.features[1];
        assert_eq!(point(second), vec![-73.4, 43.5]);
        assert_eq!(property(second, "date"), Some(&json!("2020-05-01")));
        assert_eq!(property(second, "temp_max_cels"), Some(&json!(15.5)));
        assert_eq!(
            property(second, "start_time"),
            Some(&json!("2020-05-01T06:00:00+00:00"))
        );
        assert!(property(&table.features[0], "soilMoisture").is_none());
        assert_eq!(property(&table.features[2], "date"), Some(&json!("2020-05-02")));
    }

    #[test]
    fn test_daily_agronomics_take_location_from_response() {
        let response = json!({
            "location": {"latitude": 43.5, "longitude": -73.4, "fieldId": null},
            "accumulations": {"gdd": 120.0},
            "dailyValues": [
                {"date": "2020-05-01", "gdd": 4.5, "pet": {"amount": 2.1, "units": "mm"}},
                {"date": "2020-05-02", "gdd": 6.0, "pet": {"amount": 2.4, "units": "mm"}}
            ]
        });

        let table = clean(
            records(&response, &AGRONOMIC_VALUES_DAILY),
            &AGRONOMIC_VALUES_DAILY,
        );
        assert_eq!(table.features.len(), 2);
        for feature in &table.features {
            assert_eq!(point(feature), vec![-73.4, 43.5]);
        }
        assert_eq!(property(&table.features[1], "gdd_daily_total_cels"), Some(&json!(6.0)));
        assert_eq!(property(&table.features[1], "pet_daily_total_mm"), Some(&json!(2.4)));
        assert!(property(&table.features[1], "pet.units").is_none());
    }

    #[test]
    fn test_agronomic_totals_carry_date_span() {
        let response = json!({
            "location": {"latitude": 43.5, "longitude": -73.4, "fieldId": null},
            "accumulations": {"gdd": 120.0, "ppet": 0.8, "precipitation": {"amount": 31.0, "units": "mm"}},
            "dailyValues": [
                {"date": "2020-05-01", "gdd": 4.5},
                {"date": "2020-05-02", "gdd": 6.0},
                {"date": "2020-05-15", "gdd": 7.1}
            ]
        });

        let table = clean(records(&response, &AGRONOMIC_VALUES), &AGRONOMIC_VALUES);
        assert_eq!(table.features.len(), 1);
        let totals = &table.features[0];
        assert_eq!(point(totals), vec![-73.4, 43.5]);
        assert_eq!(property(totals, "gdd_range_total_cels"), Some(&json!(120.0)));
        assert_eq!(property(totals, "precip_range_total_mm"), Some(&json!(31.0)));
        assert_eq!(property(totals, "start_day"), Some(&json!("2020-05-01")));
        assert_eq!(property(totals, "end_day"), Some(&json!("2020-05-15")));
        assert_eq!(
            property(totals, "date_range"),
            Some(&json!("2020-05-01/2020-05-15"))
        );
    }

    #[test]
    fn test_agronomic_totals_without_daily_values() {
        let response = json!({"accumulations": {"gdd": 120.0}, "dailyValues": []});

        let rows = records(&response, &AGRONOMIC_VALUES);
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].contains_key("start_day"));
        assert!(!rows[0].contains_key("date_range"));
    }

    #[test]
    fn test_model_details_explode_stages() {
        let response = json!({
            "biofix": 1,
            "gddMethod": "standard",
            "gddBaseTemp": 0.0,
            "gddMaxBoundary": 30.0,
            "gddMinBoundary": 0.0,
            "gddUnits": "C",
            "stages": [
                {"id": "stage-1", "stage": "Emergence", "description": "Seedling emerges", "gddThreshold": 125.0},
                {"id": "stage-2", "stage": "Tillering", "description": "Tillers form", "gddThreshold": 395.0}
            ],
            "_links": {"self": {"href": "/v2/agronomics/models/BarleyGenericMSU/details"}}
        });

        let mut rows = records(&response, &MODEL_DETAILS);
        stamp_target_id(&mut rows, &MODEL_DETAILS, &Target::Id("BarleyGenericMSU".to_string()));
        let table = clean(rows, &MODEL_DETAILS);
        assert_eq!(table.features.len(), 2);

        let tillering = &table.features[1];
        assert!(tillering.geometry.is_none());
        assert_eq!(property(tillering, "model_id"), Some(&json!("BarleyGenericMSU")));
        assert_eq!(property(tillering, "stage_id"), Some(&json!("stage-2")));
        assert_eq!(property(tillering, "stage_name"), Some(&json!("Tillering")));
        assert_eq!(property(tillering, "gdd_threshold_cels"), Some(&json!(395.0)));
        assert_eq!(property(tillering, "biofix_days"), Some(&json!(1)));
        assert_eq!(property(tillering, "gdd_method"), Some(&json!("standard")));
        assert_eq!(property(tillering, "gdd_max_boundary_cels"), Some(&json!(30.0)));
        assert!(property(tillering, "gddUnits").is_none());
        assert!(property(tillering, "stages").is_none());
    }

    #[test]
    fn test_model_results_tag_stage_status() {
        let response = json!({
            "biofixDate": "2020-04-20",
            "plantingDate": "2020-04-20",
            "modelId": "WheatHardRedMSU",
            "location": {"latitude": 44.0, "longitude": -72.5, "fieldId": "field-1"},
            "previousStages": [
                {"date": "2020-05-02", "id": "stage-1", "stage": "Emergence", "gddThreshold": 125.0},
                {"date": "2020-05-20", "id": "stage-2", "stage": "Tillering", "gddThreshold": 395.0}
            ],
            "currentStage": {"date": "2020-06-01", "id": "stage-3", "stage": "Jointing", "accumulatedGdds": 610.5},
            "nextStage": {"id": "stage-4", "stage": "Boot", "gddRemaining": 90.0}
        });

        let table = clean(records(&response, &MODEL_RESULTS), &MODEL_RESULTS);
        assert_eq!(table.features.len(), 4);

        let statuses: Vec<&Value> = table
            .features
            .iter()
            .filter_map(|feature| property(feature, "stage_status"))
            .collect();
        assert_eq!(
            statuses,
            vec![&json!("Previous"), &json!("Previous"), &json!("Current"), &json!("Next")]
        );

        let current = &table.features[2];
        assert_eq!(point(current), vec![-72.5, 44.0]);
        assert_eq!(property(current, "stage_id"), Some(&json!("stage-3")));
        assert_eq!(property(current, "stage_start_date"), Some(&json!("2020-06-01")));
        assert_eq!(
            property(current, "gdd_accumulation_current_cels"),
            Some(&json!(610.5))
        );
        assert_eq!(property(current, "model_id"), Some(&json!("WheatHardRedMSU")));
        assert_eq!(property(current, "field_id"), Some(&json!("field-1")));
        assert_eq!(property(current, "planting_date"), Some(&json!("2020-04-20")));

        let next = &table.features[3];
        assert_eq!(property(next, "gdd_remaining_next_cels"), Some(&json!(90.0)));
    }

    #[test]
    fn test_model_results_missing_stage_keeps_status_row() {
        let response = json!({
            "modelId": "WheatHardRedMSU",
            "location": {"latitude": 44.0, "longitude": -72.5, "fieldId": "field-1"},
            "previousStages": [],
            "currentStage": {"date": "2020-04-25", "id": "stage-1", "stage": "Emergence"},
            "nextStage": null
        });

        let table = clean(records(&response, &MODEL_RESULTS), &MODEL_RESULTS);
        assert_eq!(table.features.len(), 3);

        let previous = &table.features[0];
        assert_eq!(property(previous, "stage_status"), Some(&json!("Previous")));
        assert!(property(previous, "stage_id").is_none());
        assert_eq!(property(previous, "model_id"), Some(&json!("WheatHardRedMSU")));
        assert_eq!(property(&table.features[2], "stage_status"), Some(&json!("Next")));
    }

    #[test]
    fn test_fields_are_located_at_centre_point() {
        let response = json!({
            "fields": [
                {"id": "field-1", "name": "North", "farmId": "farm-1", "acres": 12.5,
                 "centerPoint": {"latitude": 44.0, "longitude": -72.5},
                 "_links": {"self": {"href": "/v2/fields/field-1"}}}
            ]
        });

        let table = clean(records(&response, &FIELDS), &FIELDS);
        let field = &table.features[0];
        assert_eq!(point(field), vec![-72.5, 44.0]);
        assert_eq!(property(field, "field_id"), Some(&json!("field-1")));
        assert_eq!(property(field, "area_acres"), Some(&json!(12.5)));
        assert!(property(field, "centerPoint.latitude").is_none());
    }

    #[test]
    fn test_records_without_coordinates() {
        let response = json!({"id": "corn-standard", "name": "corn", "isDefaultForCrop": true});

        let table = clean(records(&response, &CROPS), &CROPS);
        assert_eq!(table.features.len(), 1);
        assert!(table.features[0].geometry.is_none());
        assert_eq!(
            property(&table.features[0], "default_crop"),
            Some(&json!(true))
        );
    }
}
