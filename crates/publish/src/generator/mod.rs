//! One point generator per report source.
//!
//! The set of sources is closed, so generators are variants of a single enum
//! rather than trait objects. Each variant checks whether its host integration
//! is installed and whether its report is present before producing points.

mod base;
mod changelog;
mod coverage;
mod custom;
mod perfpublisher;
mod performance;
mod robot;
mod sonarqube;

use buildpulse_core::config::Settings;
use buildpulse_core::error::{BuildPulseError, Result};
use buildpulse_core::model::build::BuildContext;
use buildpulse_core::model::custom::CustomData;
use buildpulse_core::model::point::{Point, PointBuilder};
use buildpulse_core::model::report::Integration;
use chrono::{DateTime, Utc};

pub use base::DEFAULT_MEASUREMENT;
pub use custom::DEFAULT_CUSTOM_MEASUREMENT;

/// Everything a generator reads during one run.
#[derive(Debug, Clone)]
pub struct RunContext<'a> {
    pub build: &'a BuildContext,
    pub custom: &'a CustomData,
    pub settings: &'a Settings,
    /// Renderer output shared by every point of the run.
    pub project_name: String,
    pub timestamp: DateTime<Utc>,
}

impl RunContext<'_> {
    /// Starts a point carrying the tags and fields that identify the build.
    pub fn point(&self, measurement: impl Into<String>) -> PointBuilder {
        Point::builder(measurement, self.timestamp)
            .tag("project_name", self.project_name.as_str())
            .tag("project_path", self.build.job_path())
            .field("buildnumber", self.build.build_number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generator {
    JenkinsBase,
    CustomData,
    CustomDataMap,
    Cobertura,
    RobotFramework,
    Jacoco,
    Performance,
    SonarQube,
    ChangeLog,
    PerfPublisher,
}

impl Generator {
    /// Every generator in execution order.
    pub const ALL: [Generator; 10] = [
        Generator::JenkinsBase,
        Generator::CustomData,
        Generator::CustomDataMap,
        Generator::Cobertura,
        Generator::RobotFramework,
        Generator::Jacoco,
        Generator::Performance,
        Generator::SonarQube,
        Generator::ChangeLog,
        Generator::PerfPublisher,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::JenkinsBase => "Jenkins base",
            Self::CustomData => "Custom data",
            Self::CustomDataMap => "Custom data map",
            Self::ChangeLog => "Change log",
            other => other
                .integration()
                .map(Integration::as_str)
                .unwrap_or("Unknown"),
        }
    }

    /// Host integration that has to be installed for the report to exist.
    pub fn integration(self) -> Option<Integration> {
        match self {
            Self::Cobertura => Some(Integration::Cobertura),
            Self::RobotFramework => Some(Integration::RobotFramework),
            Self::Jacoco => Some(Integration::Jacoco),
            Self::Performance => Some(Integration::Performance),
            Self::SonarQube => Some(Integration::SonarQube),
            Self::PerfPublisher => Some(Integration::PerfPublisher),
            Self::JenkinsBase | Self::CustomData | Self::CustomDataMap | Self::ChangeLog => None,
        }
    }

    pub fn check_available(self, build: &BuildContext) -> Result<()> {
        match self.integration() {
            Some(integration) if !build.is_installed(integration) => Err(
                BuildPulseError::GeneratorUnavailable(integration.as_str().to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Cheap presence check. A missing integration reads as a missing report.
    pub fn has_report(self, run: &RunContext<'_>) -> bool {
        if self.check_available(run.build).is_err() {
            return false;
        }
        let reports = &run.build.reports;
        match self {
            Self::JenkinsBase => true,
            Self::CustomData => custom::has_data(run),
            Self::CustomDataMap => custom::has_map(run),
            Self::Cobertura => reports.cobertura.is_some(),
            Self::RobotFramework => reports.robot_framework.is_some(),
            Self::Jacoco => reports.jacoco.is_some(),
            Self::Performance => reports.performance.is_some(),
            Self::SonarQube => reports.sonarqube.is_some(),
            Self::ChangeLog => reports.change_log.is_some(),
            Self::PerfPublisher => reports.perf_publisher.is_some(),
        }
    }

    /// Converts the report into points. Returns no points when the report is
    /// absent; callers normally check [`Generator::has_report`] first.
    pub fn generate(self, run: &RunContext<'_>) -> Result<Vec<Point>> {
        self.check_available(run.build)?;
        let reports = &run.build.reports;
        match self {
            Self::JenkinsBase => base::generate(run),
            Self::CustomData => custom::generate_data(run),
            Self::CustomDataMap => custom::generate_map(run),
            Self::Cobertura => with_report(reports.cobertura.as_ref(), |r| {
                coverage::generate_cobertura(run, r)
            }),
            Self::RobotFramework => {
                with_report(reports.robot_framework.as_ref(), |r| robot::generate(run, r))
            }
            Self::Jacoco => {
                with_report(reports.jacoco.as_ref(), |r| coverage::generate_jacoco(run, r))
            }
            Self::Performance => {
                with_report(reports.performance.as_ref(), |r| performance::generate(run, r))
            }
            Self::SonarQube => {
                with_report(reports.sonarqube.as_ref(), |r| sonarqube::generate(run, r))
            }
            Self::ChangeLog => {
                with_report(reports.change_log.as_ref(), |r| changelog::generate(run, r))
            }
            Self::PerfPublisher => with_report(reports.perf_publisher.as_ref(), |r| {
                perfpublisher::generate(run, r)
            }),
        }
    }
}

impl std::fmt::Display for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn with_report<R>(
    report: Option<&R>,
    generate: impl FnOnce(&R) -> Result<Vec<Point>>,
) -> Result<Vec<Point>> {
    match report {
        Some(report) => generate(report),
        None => Ok(Vec::new()),
    }
}

/// Percentage of `part` in `whole`, `0.0` for an empty whole.
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
