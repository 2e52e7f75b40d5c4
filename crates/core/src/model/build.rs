use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::report::{Integration, Reports, TestSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    #[default]
    NotBuilt,
    Aborted,
}

impl BuildResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Unstable => "UNSTABLE",
            Self::Failure => "FAILURE",
            Self::NotBuilt => "NOT_BUILT",
            Self::Aborted => "ABORTED",
        }
    }

    /// Severity order used by CI servers: lower is better.
    pub fn ordinal(self) -> i64 {
        match self {
            Self::Success => 0,
            Self::Unstable => 1,
            Self::Failure => 2,
            Self::NotBuilt => 3,
            Self::Aborted => 4,
        }
    }

    pub fn is_successful(self) -> bool {
        self == Self::Success
    }
}

impl std::fmt::Display for BuildResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of one finished build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildContext {
    pub job_name: String,
    /// Slash separated folder path of the job, e.g. `team/service/main`.
    pub job_path: Option<String>,
    pub build_number: i64,
    pub result: BuildResult,
    pub duration_ms: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub queue_time_ms: Option<u64>,
    pub agent_name: Option<String>,
    pub cause: Option<String>,
    pub health_score: Option<i64>,
    pub last_successful_build: Option<i64>,
    pub last_stable_build: Option<i64>,
    pub env: BTreeMap<String, String>,
    pub test_summary: Option<TestSummary>,
    pub reports: Reports,
    /// Report integrations that are not installed on the host.
    pub unavailable: BTreeSet<Integration>,
}

impl BuildContext {
    pub fn new(
        job_name: impl Into<String>,
        build_number: i64,
        result: BuildResult,
        duration: Duration,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            build_number,
            result,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            ..Self::default()
        }
    }

    pub fn job_path(&self) -> &str {
        self.job_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(&self.job_name)
    }

    pub fn is_installed(&self, integration: Integration) -> bool {
        !self.unavailable.contains(&integration)
    }
}
