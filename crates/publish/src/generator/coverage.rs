use buildpulse_core::error::Result;
use buildpulse_core::model::point::Point;
use buildpulse_core::model::report::{CoberturaReport, CoverageCounter, JacocoReport};

use super::RunContext;

pub const COBERTURA_MEASUREMENT: &str = "cobertura_data";
pub const JACOCO_MEASUREMENT: &str = "jacoco_data";

pub(super) fn generate_cobertura(run: &RunContext<'_>, report: &CoberturaReport) -> Result<Vec<Point>> {
    let point = run
        .point(COBERTURA_MEASUREMENT)
        .field("cobertura_number_of_packages", report.packages.total.round() as i64)
        .field("cobertura_number_of_source_files", report.files.total.round() as i64)
        .field("cobertura_number_of_classes", report.classes.total.round() as i64)
        .field("cobertura_package_coverage_rate", report.packages.percent("package")?)
        .field("cobertura_file_coverage_rate", report.files.percent("file")?)
        .field("cobertura_class_coverage_rate", report.classes.percent("class")?)
        .field("cobertura_method_coverage_rate", report.methods.percent("method")?)
        .field("cobertura_line_coverage_rate", report.lines.percent("line")?)
        .field("cobertura_branch_coverage_rate", report.conditionals.percent("branch")?)
        .build()?;
    Ok(vec![point])
}

pub(super) fn generate_jacoco(run: &RunContext<'_>, report: &JacocoReport) -> Result<Vec<Point>> {
    let counters: [(&str, CoverageCounter); 6] = [
        ("instruction", report.instruction),
        ("branch", report.branch),
        ("complexity", report.complexity),
        ("line", report.line),
        ("method", report.method),
        ("class", report.class),
    ];

    let mut point = run.point(JACOCO_MEASUREMENT);
    for (name, counter) in counters {
        point = point
            .field(format!("jacoco_{name}_coverage_rate"), counter.percent())
            .field(format!("jacoco_{name}_covered"), counter.covered)
            .field(format!("jacoco_{name}_missed"), counter.missed);
    }
    Ok(vec![point.build()?])
}
