use buildpulse_core::config::Settings;
use buildpulse_core::model::build::BuildContext;

pub const FALLBACK_PROJECT_NAME: &str = "unnamed_job";

/// Derives the project series name every point is tagged with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementRenderer {
    prefix: Option<String>,
    project_name: Option<String>,
}

impl MeasurementRenderer {
    pub fn new(prefix: Option<&str>, project_name: Option<&str>) -> Self {
        Self {
            prefix: non_blank(prefix),
            project_name: non_blank(project_name),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.custom_prefix.as_deref(),
            settings.custom_project_name.as_deref(),
        )
    }

    pub fn render(&self, build: &BuildContext) -> String {
        let name = match &self.project_name {
            Some(name) => name.clone(),
            None => flatten_job_path(build.job_path()),
        };
        let name = if name.is_empty() {
            FALLBACK_PROJECT_NAME.to_string()
        } else {
            name
        };
        match &self.prefix {
            Some(prefix) => format!("{prefix}_{name}"),
            None => name,
        }
    }
}

/// Blank values count as unset; others are kept untrimmed.
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

/// `team/service/main` becomes `team_service_main`.
fn flatten_job_path(path: &str) -> String {
    path.split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
