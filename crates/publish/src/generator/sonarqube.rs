use buildpulse_core::error::{BuildPulseError, Result};
use buildpulse_core::model::point::{Point, PointBuilder};
use buildpulse_core::model::report::SonarQubeReport;

use super::RunContext;

pub const SONARQUBE_MEASUREMENT: &str = "sonarqube_data";

/// Integer measures by SonarQube metric key and the field they land in.
const COUNT_MEASURES: &[(&str, &str)] = &[
    ("violations", "total_issues"),
    ("blocker_violations", "blocker_issues"),
    ("critical_violations", "critical_issues"),
    ("major_violations", "major_issues"),
    ("minor_violations", "minor_issues"),
    ("info_violations", "info_issues"),
    ("ncloc", "lines_of_code"),
    ("complexity", "complexity"),
    ("bugs", "bugs"),
    ("vulnerabilities", "vulnerabilities"),
    ("code_smells", "code_smells"),
];

const RATIO_MEASURES: &[(&str, &str)] = &[
    ("coverage", "coverage"),
    ("duplicated_lines_density", "duplicated_lines_density"),
    ("sqale_debt_ratio", "debt_ratio"),
];

/// Measures the server did not report are left out of the point.
pub(super) fn generate(run: &RunContext<'_>, report: &SonarQubeReport) -> Result<Vec<Point>> {
    let mut point = run
        .point(SONARQUBE_MEASUREMENT)
        .tag("sonar_project", report.project_key.as_str())
        .field_opt("sonar_url", report.server_url.clone());

    for (key, field) in COUNT_MEASURES {
        point = count_measure(point, report, key, field)?;
    }
    for (key, field) in RATIO_MEASURES {
        point = ratio_measure(point, report, key, field)?;
    }
    if let Some(status) = measure(report, "alert_status") {
        point = point.field("quality_gate_status", status);
    }
    Ok(vec![point.build()?])
}

fn measure<'r>(report: &'r SonarQubeReport, key: &str) -> Option<&'r str> {
    report
        .measures
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn count_measure(
    point: PointBuilder,
    report: &SonarQubeReport,
    key: &str,
    field: &str,
) -> Result<PointBuilder> {
    let Some(raw) = measure(report, key) else {
        return Ok(point);
    };
    let value: i64 = raw.parse().map_err(|_| invalid_measure(key, raw))?;
    Ok(point.field(field, value))
}

fn ratio_measure(
    point: PointBuilder,
    report: &SonarQubeReport,
    key: &str,
    field: &str,
) -> Result<PointBuilder> {
    let Some(raw) = measure(report, key) else {
        return Ok(point);
    };
    let value: f64 = raw
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| invalid_measure(key, raw))?;
    Ok(point.field(field, value))
}

fn invalid_measure(key: &str, raw: &str) -> BuildPulseError {
    BuildPulseError::report_parse("SonarQube", format!("measure {key} has invalid value '{raw}'"))
}
