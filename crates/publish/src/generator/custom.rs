use buildpulse_core::error::Result;
use buildpulse_core::model::point::Point;
use tracing::debug;

use super::RunContext;

pub const DEFAULT_CUSTOM_MEASUREMENT: &str = "jenkins_custom_data";

pub(super) fn has_data(run: &RunContext<'_>) -> bool {
    !run.custom.data.is_empty()
}

pub(super) fn has_map(run: &RunContext<'_>) -> bool {
    run.custom.data_map.values().any(|fields| !fields.is_empty())
}

pub(super) fn generate_data(run: &RunContext<'_>) -> Result<Vec<Point>> {
    if !has_data(run) {
        return Ok(Vec::new());
    }
    let measurement = match &run.settings.measurement_name {
        Some(name) => format!("custom_{name}"),
        None => DEFAULT_CUSTOM_MEASUREMENT.to_string(),
    };
    let point = run
        .point(measurement)
        .tags(&run.custom.data_tags)
        .fields(run.custom.data.clone())
        .build()?;
    Ok(vec![point])
}

/// One point per map entry; the entry key is the measurement name.
pub(super) fn generate_map(run: &RunContext<'_>) -> Result<Vec<Point>> {
    let mut points = Vec::new();
    for (measurement, fields) in &run.custom.data_map {
        if fields.is_empty() {
            debug!(measurement = %measurement, "custom data map entry without fields skipped");
            continue;
        }
        let mut point = run.point(measurement.as_str()).fields(fields.clone());
        if let Some(tags) = run.custom.data_map_tags.get(measurement) {
            point = point.tags(tags);
        }
        points.push(point.build()?);
    }
    Ok(points)
}
