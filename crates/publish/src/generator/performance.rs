use buildpulse_core::error::{BuildPulseError, Result};
use buildpulse_core::model::point::Point;
use buildpulse_core::model::report::{PerformanceFile, PerformanceReport};

use super::{RunContext, percent};

pub const PERFORMANCE_MEASUREMENT: &str = "performance_data";

/// One point per result file. A file that carries its own timestamp keeps it.
pub(super) fn generate(run: &RunContext<'_>, report: &PerformanceReport) -> Result<Vec<Point>> {
    report
        .files
        .iter()
        .map(|file| file_point(run, file))
        .collect()
}

fn file_point(run: &RunContext<'_>, file: &PerformanceFile) -> Result<Point> {
    validate(file)?;

    let mut point = run
        .point(PERFORMANCE_MEASUREMENT)
        .tag("performance_report", file.name.as_str())
        .field("error_percent", percent(file.errors, file.samples))
        .field("error_count", file.errors)
        .field("average", file.average_ms)
        .field("median", file.median_ms)
        .field("min", file.min_ms)
        .field("max", file.max_ms)
        .field("90percentile", file.p90_ms)
        .field("95percentile", file.p95_ms)
        .field("99percentile", file.p99_ms)
        .field("size", file.samples)
        .field("total_traffic", file.total_traffic_kb);
    if let Some(ts) = file.timestamp {
        point = point.time(ts);
    }
    point.build()
}

fn validate(file: &PerformanceFile) -> Result<()> {
    if file.errors > file.samples {
        return Err(BuildPulseError::report_parse(
            "Performance",
            format!(
                "{}: {} errors reported for {} samples",
                file.name, file.errors, file.samples
            ),
        ));
    }
    let timings = [
        ("average", file.average_ms),
        ("median", file.median_ms),
        ("min", file.min_ms),
        ("max", file.max_ms),
        ("90percentile", file.p90_ms),
        ("95percentile", file.p95_ms),
        ("99percentile", file.p99_ms),
        ("total_traffic", file.total_traffic_kb),
    ];
    if let Some((name, value)) = timings.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
        return Err(BuildPulseError::report_parse(
            "Performance",
            format!("{}: {name} has invalid value {value}", file.name),
        ));
    }
    Ok(())
}
