use buildpulse_core::config::Settings;
use buildpulse_core::error::Result;
use buildpulse_core::model::RunInput;
use buildpulse_core::model::point::PointBatch;
use buildpulse_core::model::target::{ErrorPolicy, Target};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::build_log::BuildLog;
use crate::client::{Connector, HttpConnector, PointWriter, WriteRequest, validate_target_url};
use crate::generator::RunContext;
use crate::orchestrator;
use crate::renderer::MeasurementRenderer;

/// Outcome of one publish run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishSummary {
    pub points: usize,
    pub written: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

pub struct PublicationService<C = HttpConnector> {
    settings: Settings,
    connector: C,
}

impl PublicationService<HttpConnector> {
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let connector = HttpConnector::new(&settings)?;
        Ok(Self::new(settings, connector))
    }
}

impl<C: Connector> PublicationService<C> {
    pub fn new(settings: Settings, connector: C) -> Self {
        Self {
            settings,
            connector,
        }
    }

    /// Collects the batch a publish run would write.
    pub fn preview(&self, input: &RunInput, timestamp: DateTime<Utc>, log: &dyn BuildLog) -> PointBatch {
        let renderer = MeasurementRenderer::from_settings(&self.settings);
        let run = RunContext {
            build: &input.build,
            custom: &input.custom,
            settings: &self.settings,
            project_name: renderer.render(&input.build),
            timestamp,
        };
        orchestrator::collect_points(&run, log)
    }

    /// Writes the run's batch to each target in order. Only a target with the
    /// expose policy can fail the run, and it stops the remaining targets.
    pub async fn publish(
        &self,
        input: &RunInput,
        targets: &[Target],
        timestamp: DateTime<Utc>,
        log: &dyn BuildLog,
    ) -> Result<PublishSummary> {
        log.line("Collecting data...");
        let batch = self.preview(input, timestamp, log);
        let mut summary = PublishSummary {
            points: batch.len(),
            ..PublishSummary::default()
        };

        for target in targets {
            let url = match validate_target_url(target) {
                Ok(url) => url,
                Err(e) => {
                    warn!(target = %target.description, error = %e, "skipping target");
                    log.line(&format!("Skipping target {target}: {e}"));
                    summary.skipped.push(target.description.clone());
                    continue;
                }
            };

            log.line(&format!("Publishing data to target {target}"));
            let result = match self.connector.connect(target, &url) {
                Ok(conn) => conn.write(&WriteRequest::for_target(target, &batch)).await,
                Err(e) => Err(e),
            };
            match (result, target.error_policy()) {
                (Ok(()), _) => {
                    info!(target = %target.description, points = batch.len(), "published");
                    summary.written.push(target.description.clone());
                }
                (Err(e), ErrorPolicy::Expose) => {
                    log.line(&format!("Failed to publish to target {target}: {e}"));
                    return Err(e);
                }
                (Err(e), ErrorPolicy::Swallow) => {
                    warn!(target = %target.description, error = ?e, "publish failed, continuing");
                    log.line(&format!("Failed to publish to target {target}, ignoring: {e}"));
                    summary.failed.push(target.description.clone());
                }
            }
        }

        log.line("Completed.");
        Ok(summary)
    }
}
