use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_RETENTION_POLICY: &str = "autogen";

/// How write failures for a target reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log and move on to the next target.
    Swallow,
    /// Abort the run and return the error.
    Expose,
}

/// A configured InfluxDB endpoint.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub description: String,
    pub url: String,
    pub database: String,
    #[serde(default = "default_retention_policy")]
    pub retention_policy: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub use_proxy: bool,
    #[serde(default)]
    pub expose_exceptions: bool,
    #[serde(default)]
    pub gzip: bool,
}

fn default_retention_policy() -> String {
    DEFAULT_RETENTION_POLICY.to_string()
}

impl Target {
    pub fn new(
        description: impl Into<String>,
        url: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            url: url.into(),
            database: database.into(),
            retention_policy: default_retention_policy(),
            username: None,
            password: None,
            use_proxy: false,
            expose_exceptions: false,
            gzip: false,
        }
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        if self.expose_exceptions {
            ErrorPolicy::Expose
        } else {
            ErrorPolicy::Swallow
        }
    }

    /// Basic credentials, only when a non-empty username is configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().filter(|u| !u.is_empty())?;
        Some((username, self.password.as_deref().unwrap_or_default()))
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("description", &self.description)
            .field("url", &self.url)
            .field("database", &self.database)
            .field("retention_policy", &self.retention_policy)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("use_proxy", &self.use_proxy)
            .field("expose_exceptions", &self.expose_exceptions)
            .field("gzip", &self.gzip)
            .finish()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' (url='{}', database='{}')",
            self.description, self.url, self.database
        )
    }
}
