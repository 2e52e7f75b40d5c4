use buildpulse_core::config::EnvParameter;
use buildpulse_core::error::Result;
use buildpulse_core::model::point::{Point, PointBuilder};
use tracing::debug;

use super::RunContext;

pub const DEFAULT_MEASUREMENT: &str = "jenkins_data";

pub(super) fn generate(run: &RunContext<'_>) -> Result<Vec<Point>> {
    let build = run.build;
    let measurement = run
        .settings
        .measurement_name
        .as_deref()
        .unwrap_or(DEFAULT_MEASUREMENT);

    let mut point = run
        .point(measurement)
        .tag("result", build.result.as_str())
        .field("duration", build.duration_ms)
        .field("result", build.result.as_str())
        .field("result_ordinal", build.result.ordinal())
        .field("successful", build.result.is_successful())
        .field("project_name", run.project_name.as_str())
        .field("project_path", build.job_path())
        .field("measured_time", run.timestamp.timestamp_millis())
        .field_opt("start_time", build.started_at.map(|t| t.timestamp_millis()))
        .field_opt("queue_time", build.queue_time_ms)
        .field_opt("agent_name", build.agent_name.clone())
        .field_opt("cause", build.cause.clone())
        .field_opt("health_score", build.health_score)
        .field_opt("last_successful_build", build.last_successful_build)
        .field_opt("last_stable_build", build.last_stable_build);

    if let Some(tests) = build.test_summary {
        point = point
            .field("tests_total", tests.total)
            .field("tests_failed", tests.failed)
            .field("tests_skipped", tests.skipped);
    }

    point = apply_env_parameters(point, &run.settings.env_parameter_fields, run, |p, k, v| {
        p.field(k, v)
    });
    point = apply_env_parameters(point, &run.settings.env_parameter_tags, run, |p, k, v| {
        p.tag(k, v)
    });

    Ok(vec![point.build()?])
}

fn apply_env_parameters(
    mut point: PointBuilder,
    params: &[EnvParameter],
    run: &RunContext<'_>,
    add: impl Fn(PointBuilder, String, String) -> PointBuilder,
) -> PointBuilder {
    for param in params {
        match param.resolve(&run.build.env) {
            Some(value) => point = add(point, param.key.clone(), value),
            None => debug!(key = %param.key, "env parameter not set for build, skipped"),
        }
    }
    point
}
