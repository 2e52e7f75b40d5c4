use buildpulse_core::model::point::PointBatch;
use tracing::{debug, warn};

use crate::build_log::BuildLog;
use crate::generator::{Generator, RunContext};

/// Runs every generator in [`Generator::ALL`] order.
pub fn collect_points(run: &RunContext<'_>, log: &dyn BuildLog) -> PointBatch {
    collect_with(run, &Generator::ALL, log)
}

/// Runs `generators` in order. A failing generator contributes nothing; the
/// others are unaffected.
pub fn collect_with(run: &RunContext<'_>, generators: &[Generator], log: &dyn BuildLog) -> PointBatch {
    let mut batch = PointBatch::new();
    for &generator in generators {
        if let Err(e) = generator.check_available(run.build) {
            debug!(generator = %generator, error = %e, "plugin skipped");
            continue;
        }
        if !generator.has_report(run) {
            debug!(generator = %generator, "no report, skipped");
            continue;
        }

        log.line(&format!("{generator} data found. Writing to InfluxDB..."));
        match generator.generate(run) {
            Ok(points) => {
                debug!(generator = %generator, points = points.len(), "generated");
                batch.append(points);
            }
            Err(e) => {
                warn!(generator = %generator, error = ?e, "failed to collect data");
                log.line(&format!("Failed to collect {generator} data, ignoring: {e}"));
            }
        }
    }
    batch
}
