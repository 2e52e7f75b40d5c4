//! Structured report data supplied alongside a build. Locating and parsing the
//! underlying report files is the host's job; these types only carry the
//! numbers each integration exposes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BuildPulseError, Result};

/// Host integrations that provide optional reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integration {
    Cobertura,
    Jacoco,
    Performance,
    RobotFramework,
    #[serde(rename = "sonarqube")]
    SonarQube,
    PerfPublisher,
}

impl Integration {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cobertura => "Cobertura",
            Self::Jacoco => "JaCoCo",
            Self::Performance => "Performance",
            Self::RobotFramework => "Robot Framework",
            Self::SonarQube => "SonarQube",
            Self::PerfPublisher => "Performance Publisher",
        }
    }
}

impl std::fmt::Display for Integration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reports {
    pub cobertura: Option<CoberturaReport>,
    pub jacoco: Option<JacocoReport>,
    pub performance: Option<PerformanceReport>,
    pub robot_framework: Option<RobotFrameworkReport>,
    pub sonarqube: Option<SonarQubeReport>,
    pub change_log: Option<ChangeLog>,
    pub perf_publisher: Option<PerfPublisherReport>,
}

/// Covered/total pair as reported by Cobertura. Values are fractional for
/// branch coverage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageRatio {
    pub covered: f64,
    pub total: f64,
}

impl CoverageRatio {
    pub fn new(covered: f64, total: f64) -> Self {
        Self { covered, total }
    }

    /// Coverage in percent, `0.0` when nothing was measured.
    pub fn percent(&self, name: &str) -> Result<f64> {
        if !self.covered.is_finite() || !self.total.is_finite() {
            return Err(BuildPulseError::report_parse(
                "Cobertura",
                format!("{name} ratio is not a finite number"),
            ));
        }
        if self.covered < 0.0 || self.total < 0.0 || self.covered > self.total {
            return Err(BuildPulseError::report_parse(
                "Cobertura",
                format!(
                    "{name} ratio {}/{} is out of range",
                    self.covered, self.total
                ),
            ));
        }
        if self.total == 0.0 {
            return Ok(0.0);
        }
        Ok(self.covered * 100.0 / self.total)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoberturaReport {
    pub packages: CoverageRatio,
    pub files: CoverageRatio,
    pub classes: CoverageRatio,
    pub methods: CoverageRatio,
    pub lines: CoverageRatio,
    pub conditionals: CoverageRatio,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageCounter {
    pub covered: u64,
    pub missed: u64,
}

impl CoverageCounter {
    pub fn new(covered: u64, missed: u64) -> Self {
        Self { covered, missed }
    }

    pub fn total(&self) -> u64 {
        self.covered.saturating_add(self.missed)
    }

    pub fn percent(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.covered as f64 * 100.0 / total as f64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JacocoReport {
    pub instruction: CoverageCounter,
    pub branch: CoverageCounter,
    pub complexity: CoverageCounter,
    pub line: CoverageCounter,
    pub method: CoverageCounter,
    pub class: CoverageCounter,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceReport {
    pub files: Vec<PerformanceFile>,
}

/// Aggregated response times for one load-test result file, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceFile {
    pub name: String,
    pub samples: u64,
    pub errors: u64,
    pub average_ms: f64,
    pub median_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub total_traffic_kb: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotFrameworkReport {
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub critical_passed: u64,
    pub critical_failed: u64,
    pub duration_ms: u64,
    pub suites: Vec<RobotSuite>,
    pub tags: Vec<RobotTag>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotSuite {
    pub name: String,
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotTag {
    pub name: String,
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub critical: bool,
}

/// SonarQube measures exactly as the web API returns them: metric key to a
/// string value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SonarQubeReport {
    pub project_key: String,
    pub server_url: Option<String>,
    pub measures: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeLog {
    pub change_sets: Vec<ChangeSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeSet {
    pub commit_id: String,
    pub author: String,
    pub message: String,
    pub affected_paths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfPublisherReport {
    pub tests: Vec<PerfTest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfTest {
    pub name: String,
    pub executed: bool,
    pub successful: bool,
    pub compile_time: Option<f64>,
    pub execution_time: Option<f64>,
    pub performance: Option<f64>,
    pub metrics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestSummary {
    pub total: u64,
    pub failed: u64,
    pub skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_ratio_percent() {
        assert_eq!(CoverageRatio::new(1.0, 4.0).percent("line").unwrap(), 25.0);
        assert_eq!(CoverageRatio::new(0.0, 0.0).percent("line").unwrap(), 0.0);
    }

    #[test]
    fn coverage_ratio_rejects_impossible_values() {
        assert!(CoverageRatio::new(5.0, 4.0).percent("line").is_err());
        assert!(CoverageRatio::new(-1.0, 4.0).percent("line").is_err());
        assert!(CoverageRatio::new(f64::NAN, 4.0).percent("line").is_err());
    }

    #[test]
    fn coverage_counter_percent() {
        assert_eq!(CoverageCounter::new(3, 1).percent(), 75.0);
        assert_eq!(CoverageCounter::default().percent(), 0.0);
    }

    #[test]
    fn integrations_use_snake_case_names() {
        let parsed: Vec<Integration> =
            serde_json::from_str(r#"["robot_framework","sonarqube","perf_publisher"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                Integration::RobotFramework,
                Integration::SonarQube,
                Integration::PerfPublisher
            ]
        );
    }
}
