use std::collections::BTreeMap;

use buildpulse_core::error::{BuildPulseError, Result};
use buildpulse_core::model::point::{Point, PointBuilder};
use buildpulse_core::model::report::{PerfPublisherReport, PerfTest};

use super::{RunContext, percent};

pub const SUMMARY_MEASUREMENT: &str = "perfpublisher_summary";
pub const METRIC_MEASUREMENT: &str = "perfpublisher_metric";
pub const TEST_MEASUREMENT: &str = "perfpublisher_test";

/// Running min/max/mean over one series of measurements.
#[derive(Debug, Default, Clone, Copy)]
struct Stats {
    count: u64,
    sum: f64,
    best: f64,
    worst: f64,
}

impl Stats {
    fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.best = value;
            self.worst = value;
        } else {
            self.best = self.best.min(value);
            self.worst = self.worst.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    fn apply(&self, point: PointBuilder, prefix: &str) -> PointBuilder {
        if self.count == 0 {
            return point;
        }
        point
            .field(format!("{prefix}average"), self.average())
            .field(format!("{prefix}best"), self.best)
            .field(format!("{prefix}worst"), self.worst)
    }
}

/// A summary point, one point per metric across all tests, then one point
/// per test.
pub(super) fn generate(run: &RunContext<'_>, report: &PerfPublisherReport) -> Result<Vec<Point>> {
    validate(report)?;

    let mut points = Vec::with_capacity(1 + report.tests.len());
    points.push(summary_point(run, report)?);

    let mut metrics: BTreeMap<&str, Stats> = BTreeMap::new();
    for test in report.tests.iter().filter(|t| t.executed) {
        for (name, value) in &test.metrics {
            metrics.entry(name.as_str()).or_default().push(*value);
        }
    }
    for (name, stats) in &metrics {
        let point = stats
            .apply(run.point(METRIC_MEASUREMENT).tag("metric_name", *name), "")
            .field("count", stats.count)
            .build()?;
        points.push(point);
    }

    for test in &report.tests {
        points.push(test_point(run, test)?);
    }
    Ok(points)
}

fn validate(report: &PerfPublisherReport) -> Result<()> {
    for test in &report.tests {
        let timings = [
            ("compile_time", test.compile_time),
            ("execution_time", test.execution_time),
            ("performance", test.performance),
        ];
        let bad_timing = timings
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
            .chain(test.metrics.iter().map(|(k, v)| (k.clone(), *v)))
            .find(|(_, v)| !v.is_finite());
        if let Some((name, value)) = bad_timing {
            return Err(BuildPulseError::report_parse(
                "Performance Publisher",
                format!("test {}: {name} has invalid value {value}", test.name),
            ));
        }
    }
    Ok(())
}

fn summary_point(run: &RunContext<'_>, report: &PerfPublisherReport) -> Result<Point> {
    let total = report.tests.len() as u64;
    let executed: Vec<&PerfTest> = report.tests.iter().filter(|t| t.executed).collect();
    let passed = executed.iter().filter(|t| t.successful).count() as u64;
    let executed_count = executed.len() as u64;

    let mut compile = Stats::default();
    let mut execution = Stats::default();
    let mut performance = Stats::default();
    for test in &executed {
        if let Some(v) = test.compile_time {
            compile.push(v);
        }
        if let Some(v) = test.execution_time {
            execution.push(v);
        }
        if let Some(v) = test.performance {
            performance.push(v);
        }
    }

    let mut point = run
        .point(SUMMARY_MEASUREMENT)
        .field("number_of_tests", total)
        .field("number_of_executed_tests", executed_count)
        .field("number_of_not_executed_tests", total - executed_count)
        .field("number_of_passed_tests", passed)
        .field("number_of_failed_tests", executed_count - passed)
        .field("success_rate", percent(passed, executed_count));
    point = compile.apply(point, "compile_time_");
    point = execution.apply(point, "execution_time_");
    point = performance.apply(point, "performance_");
    point.build()
}

fn test_point(run: &RunContext<'_>, test: &PerfTest) -> Result<Point> {
    run.point(TEST_MEASUREMENT)
        .tag("test_name", test.name.as_str())
        .field("executed", test.executed)
        .field("successful", test.successful)
        .field_opt("compile_time", test.compile_time)
        .field_opt("execution_time", test.execution_time)
        .field_opt("performance", test.performance)
        .fields(test.metrics.iter().map(|(k, v)| (k.as_str(), *v)))
        .build()
}
