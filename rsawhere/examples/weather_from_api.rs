use anyhow::Result;
use rsawhere::collect::awhere::endpoint::{DayRange, Query, WEATHER_NORMS, WEATHER_OBSERVATIONS};
use rsawhere::collect::awhere::{AwhereCollect, AwhereConfig};
use rsawhere::geometric::centroid::extract_centroids;
use rsawhere::geometric::grid::{create_grid, GridOptions};

/// Example: weather norms and observations for the first grid centroid
///
/// Requires AWHERE_API_KEY and AWHERE_API_SECRET.
fn main() -> Result<()> {
    pretty_env_logger::init();
    println!("=== Example: Weather from the aWhere API ===\n");

    let (grid, _) = create_grid(
        "./data/vermont_state_boundary.shp",
        &GridOptions::default().with_buffer_distance(0.12),
    )?;
    let Some(&(longitude, latitude)) = extract_centroids(&grid).first() else {
        anyhow::bail!("the grid has no tiles");
    };
    println!("Location: ({:.4}, {:.4})\n", longitude, latitude);

    let client = AwhereCollect::new(AwhereConfig::from_env()?)?;

    let norms_days = DayRange::between("05-01".parse()?, "05-07".parse()?)?;
    let norms = client.get(
        &WEATHER_NORMS,
        &Query::location(latitude, longitude).with_days(norms_days),
    )?;
    println!("Norms: {} days", norms.features.len());

    let observed_days = DayRange::between("2020-05-01".parse()?, "2020-05-07".parse()?)?;
    let observations = client.get(
        &WEATHER_OBSERVATIONS,
        &Query::location(latitude, longitude).with_days(observed_days),
    )?;
    println!("Observations: {} days", observations.features.len());
    for feature in &observations.features {
        if let Some(properties) = &feature.properties {
            println!(
                "  - {}: max {} C, min {} C",
                properties.get("date").unwrap_or(&serde_json::Value::Null),
                properties.get("temp_max_cels").unwrap_or(&serde_json::Value::Null),
                properties.get("temp_min_cels").unwrap_or(&serde_json::Value::Null),
            );
        }
    }

    Ok(())
}
