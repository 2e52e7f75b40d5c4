use buildpulse_core::error::{BuildPulseError, Result};
use buildpulse_core::model::point::Point;
use buildpulse_core::model::report::{RobotFrameworkReport, RobotSuite, RobotTag};

use super::{RunContext, percent};

pub const RESULTS_MEASUREMENT: &str = "rf_results";
pub const SUITE_MEASUREMENT: &str = "rf_suite_result";
pub const TAG_MEASUREMENT: &str = "rf_tag_point";

const SOURCE: &str = "Robot Framework";

/// Overall totals, then one point per suite and per tag.
pub(super) fn generate(run: &RunContext<'_>, report: &RobotFrameworkReport) -> Result<Vec<Point>> {
    if report.critical_passed > report.passed || report.critical_failed > report.failed {
        return Err(BuildPulseError::report_parse(
            SOURCE,
            format!(
                "critical counts {}/{} exceed overall counts {}/{}",
                report.critical_passed, report.critical_failed, report.passed, report.failed
            ),
        ));
    }

    let mut points = Vec::with_capacity(1 + report.suites.len() + report.tags.len());
    points.push(results_point(run, report)?);
    for suite in &report.suites {
        points.push(suite_point(run, suite)?);
    }
    for tag in &report.tags {
        points.push(tag_point(run, tag)?);
    }
    Ok(points)
}

fn results_point(run: &RunContext<'_>, report: &RobotFrameworkReport) -> Result<Point> {
    // Skipped tests do not count toward the pass percentage.
    let executed = sum(&[report.passed, report.failed], "results")?;
    let total = sum(&[executed, report.skipped], "results")?;
    let critical_total = sum(&[report.critical_passed, report.critical_failed], "critical")?;
    run.point(RESULTS_MEASUREMENT)
        .field("rf_failed", report.failed)
        .field("rf_passed", report.passed)
        .field("rf_skipped", report.skipped)
        .field("rf_total", total)
        .field("rf_pass_percentage", percent(report.passed, executed))
        .field("rf_critical_failed", report.critical_failed)
        .field("rf_critical_passed", report.critical_passed)
        .field("rf_critical_total", critical_total)
        .field(
            "rf_critical_pass_percentage",
            percent(report.critical_passed, critical_total),
        )
        .field("rf_duration", report.duration_ms)
        .field("rf_suites", report.suites.len() as u64)
        .build()
}

fn suite_point(run: &RunContext<'_>, suite: &RobotSuite) -> Result<Point> {
    let total = sum(&[suite.passed, suite.failed, suite.skipped], &suite.name)?;
    run.point(SUITE_MEASUREMENT)
        .tag("suite_name", suite.name.as_str())
        .field("rf_suite_name", suite.name.as_str())
        .field("rf_passed", suite.passed)
        .field("rf_failed", suite.failed)
        .field("rf_skipped", suite.skipped)
        .field("rf_total", total)
        .field("rf_duration", suite.duration_ms)
        .build()
}

fn tag_point(run: &RunContext<'_>, tag: &RobotTag) -> Result<Point> {
    let total = sum(&[tag.passed, tag.failed, tag.skipped], &tag.name)?;
    run.point(TAG_MEASUREMENT)
        .tag("tag_name", tag.name.as_str())
        .field("rf_tag_name", tag.name.as_str())
        .field("rf_passed", tag.passed)
        .field("rf_failed", tag.failed)
        .field("rf_skipped", tag.skipped)
        .field("rf_total", total)
        .field("rf_critical", tag.critical)
        .build()
}

fn sum(counts: &[u64], scope: &str) -> Result<u64> {
    counts
        .iter()
        .try_fold(0u64, |acc, n| acc.checked_add(*n))
        .ok_or_else(|| BuildPulseError::report_parse(SOURCE, format!("{scope} test counts overflow")))
}

#[cfg(test)]
mod tests {
    use buildpulse_core::config::Settings;
    use buildpulse_core::model::custom::CustomData;
    use buildpulse_core::model::point::FieldValue;

    use super::*;

    fn generate_report(report: &RobotFrameworkReport) -> Result<Vec<Point>> {
        let build = testkit::full_build();
        let custom = CustomData::default();
        let settings = Settings::default();
        let run = RunContext {
            build: &build,
            custom: &custom,
            settings: &settings,
            project_name: "service".to_string(),
            timestamp: testkit::run_timestamp(),
        };
        generate(&run, report)
    }

    #[test]
    fn totals_suites_and_tags() {
        let report = testkit::full_build().reports.robot_framework.unwrap();
        let points = generate_report(&report).unwrap();
        let names: Vec<_> = points.iter().map(Point::measurement).collect();
        assert_eq!(
            names,
            vec!["rf_results", "rf_suite_result", "rf_suite_result", "rf_tag_point"]
        );

        let results = &points[0];
        assert_eq!(results.field("rf_total"), Some(&FieldValue::Integer(21)));
        assert_eq!(
            results.field("rf_pass_percentage"),
            Some(&FieldValue::Float(90.0))
        );
        assert_eq!(results.field("rf_critical_total"), Some(&FieldValue::Integer(11)));
        assert_eq!(results.field("rf_suites"), Some(&FieldValue::Integer(2)));

        assert_eq!(points[2].tag("suite_name"), Some("Checkout"));
        assert_eq!(points[2].field("rf_total"), Some(&FieldValue::Integer(13)));
        assert_eq!(points[3].tag("tag_name"), Some("smoke"));
        assert_eq!(points[3].field("rf_critical"), Some(&FieldValue::Boolean(true)));
    }

    #[test]
    fn empty_run_has_zero_percentages() {
        let points = generate_report(&RobotFrameworkReport::default()).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(
            points[0].field("rf_critical_pass_percentage"),
            Some(&FieldValue::Float(0.0))
        );
    }

    #[test]
    fn critical_counts_above_totals_are_rejected() {
        let report = RobotFrameworkReport {
            passed: 1,
            critical_passed: 3,
            ..RobotFrameworkReport::default()
        };
        assert!(matches!(
            generate_report(&report),
            Err(BuildPulseError::ReportParse { .. })
        ));
    }

    #[test]
    fn overflowing_counts_are_rejected() {
        let report = RobotFrameworkReport {
            passed: u64::MAX,
            failed: 1,
            ..RobotFrameworkReport::default()
        };
        let err = generate_report(&report).unwrap_err();
        assert!(matches!(err, BuildPulseError::ReportParse { .. }));
        assert!(err.to_string().contains("overflow"));

        let report = RobotFrameworkReport {
            suites: vec![RobotSuite {
                name: "Huge".into(),
                passed: u64::MAX,
                skipped: 1,
                ..RobotSuite::default()
            }],
            ..RobotFrameworkReport::default()
        };
        assert!(matches!(
            generate_report(&report),
            Err(BuildPulseError::ReportParse { .. })
        ));
    }
}
