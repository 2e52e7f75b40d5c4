use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BuildPulseError, Result};
use crate::model::target::Target;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub targets: Vec<Target>,
    pub proxy: Option<ProxyConfig>,
    pub custom_project_name: Option<String>,
    pub custom_prefix: Option<String>,
    pub measurement_name: Option<String>,
    pub env_parameter_fields: Vec<EnvParameter>,
    pub env_parameter_tags: Vec<EnvParameter>,
    pub write_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            proxy: None,
            custom_project_name: None,
            custom_prefix: None,
            measurement_name: None,
            env_parameter_fields: Vec::new(),
            env_parameter_tags: Vec::new(),
            write_timeout: Duration::from_secs(10),
        }
    }
}

/// Proxy used by targets with `use_proxy = true`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Hosts that bypass the proxy.
    #[serde(default)]
    pub no_proxy: Vec<String>,
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("no_proxy", &self.no_proxy)
            .finish()
    }
}

/// One `key=value` entry of an env-parameter spec. Values written as `$NAME`
/// or `${NAME}` are looked up in the build environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvParameter {
    pub key: String,
    pub value: EnvValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    Literal(String),
    Variable(String),
}

impl EnvParameter {
    pub fn resolve(&self, env: &BTreeMap<String, String>) -> Option<String> {
        match &self.value {
            EnvValue::Literal(v) => Some(v.clone()),
            EnvValue::Variable(name) => env.get(name).cloned(),
        }
    }
}

impl Settings {
    /// Defaults, then the config file (explicit path or the default location),
    /// then environment overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit_path, |key| env::var(key).ok())
    }

    fn load_with(explicit_path: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();
        let config_path = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(BuildPulseError::Config(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => config_file_path(&env),
        };
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides(&env);
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }

    /// Targets matching the given descriptions, in configuration order. An
    /// empty selection means every configured target.
    pub fn select_targets(&self, descriptions: &[String]) -> Result<Vec<Target>> {
        if descriptions.is_empty() {
            return Ok(self.targets.clone());
        }
        if let Some(unknown) = descriptions
            .iter()
            .find(|d| !self.targets.iter().any(|t| &t.description == *d))
        {
            return Err(BuildPulseError::InvalidArgument(format!(
                "no target named '{unknown}' is configured"
            )));
        }
        Ok(self
            .targets
            .iter()
            .filter(|t| descriptions.contains(&t.description))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    targets: Option<Vec<Target>>,
    proxy: Option<ProxyOverrides>,
    custom_project_name: Option<String>,
    custom_prefix: Option<String>,
    measurement_name: Option<String>,
    env_parameter_field: Option<String>,
    env_parameter_tag: Option<String>,
    write_timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProxyOverrides {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    no_proxy: Option<String>,
}

fn config_file_path(env: &impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(path) = env("BUILDPULSE_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env("HOME").unwrap_or_else(|| ".".to_string());
    let config_home = env("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(home).join(".config"));
    config_home.join("buildpulse/config.toml")
}

fn load_file_overrides(path: &Path) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path).map_err(|e| {
        BuildPulseError::Config(format!("failed reading {}: {e}", path.display()))
    })?;
    let parsed: ConfigOverrides = toml::from_str(&raw).map_err(|e| {
        BuildPulseError::Config(format!("failed parsing {}: {e}", path.display()))
    })?;
    Ok(Some(parsed))
}

fn load_env_overrides(env: &impl Fn(&str) -> Option<String>) -> ConfigOverrides {
    let proxy = ProxyOverrides {
        url: env("BUILDPULSE_PROXY_URL"),
        username: env("BUILDPULSE_PROXY_USERNAME"),
        password: env("BUILDPULSE_PROXY_PASSWORD"),
        no_proxy: env("BUILDPULSE_NO_PROXY"),
    };
    let has_proxy = proxy.url.is_some()
        || proxy.username.is_some()
        || proxy.password.is_some()
        || proxy.no_proxy.is_some();

    ConfigOverrides {
        targets: None,
        proxy: has_proxy.then_some(proxy),
        custom_project_name: env("BUILDPULSE_CUSTOM_PROJECT_NAME"),
        custom_prefix: env("BUILDPULSE_CUSTOM_PREFIX"),
        measurement_name: env("BUILDPULSE_MEASUREMENT_NAME"),
        env_parameter_field: env("BUILDPULSE_ENV_PARAMETER_FIELD"),
        env_parameter_tag: env("BUILDPULSE_ENV_PARAMETER_TAG"),
        write_timeout: env("BUILDPULSE_WRITE_TIMEOUT"),
    }
}

fn apply_overrides(cfg: &mut Settings, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.targets {
        cfg.targets = v;
    }
    if let Some(v) = overrides.proxy {
        apply_proxy_overrides(cfg, v, source)?;
    }
    if let Some(v) = overrides.custom_project_name {
        cfg.custom_project_name = non_empty(v);
    }
    if let Some(v) = overrides.custom_prefix {
        cfg.custom_prefix = non_empty(v);
    }
    if let Some(v) = overrides.measurement_name {
        cfg.measurement_name = non_empty(v);
    }
    if let Some(v) = overrides.env_parameter_field {
        cfg.env_parameter_fields = parse_env_parameters(&v).map_err(|e| {
            BuildPulseError::Config(format!(
                "bad env_parameter_field in {source}: {e} (value={v})"
            ))
        })?;
    }
    if let Some(v) = overrides.env_parameter_tag {
        cfg.env_parameter_tags = parse_env_parameters(&v).map_err(|e| {
            BuildPulseError::Config(format!("bad env_parameter_tag in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.write_timeout {
        cfg.write_timeout = humantime::parse_duration(&v).map_err(|e| {
            BuildPulseError::Config(format!("bad write_timeout in {source}: {e} (value={v})"))
        })?;
    }
    Ok(())
}

fn apply_proxy_overrides(cfg: &mut Settings, overrides: ProxyOverrides, source: &str) -> Result<()> {
    let mut proxy = match (cfg.proxy.take(), overrides.url) {
        (_, Some(url)) => ProxyConfig {
            url,
            username: None,
            password: None,
            no_proxy: Vec::new(),
        },
        (Some(existing), None) => existing,
        (None, None) => {
            return Err(BuildPulseError::Config(format!(
                "proxy settings in {source} need a proxy url"
            )));
        }
    };
    if let Some(v) = overrides.username {
        proxy.username = non_empty(v);
    }
    if let Some(v) = overrides.password {
        proxy.password = Some(v);
    }
    if let Some(v) = overrides.no_proxy {
        proxy.no_proxy = v
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect();
    }
    cfg.proxy = Some(proxy);
    Ok(())
}

fn non_empty(v: String) -> Option<String> {
    if v.trim().is_empty() { None } else { Some(v) }
}

/// Parses one `key=value` entry per line. Values may contain commas.
pub fn parse_env_parameters(raw: &str) -> Result<Vec<EnvParameter>> {
    let mut out = Vec::new();
    for entry in raw.lines() {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            return Err(BuildPulseError::Config(
                "env parameter entries must use key=value syntax".to_string(),
            ));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(BuildPulseError::Config(
                "env parameter key cannot be empty".to_string(),
            ));
        }
        out.push(EnvParameter {
            key: key.to_string(),
            value: parse_env_value(value.trim()),
        });
    }
    Ok(out)
}

fn parse_env_value(value: &str) -> EnvValue {
    if let Some(name) = value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        return EnvValue::Variable(name.trim().to_string());
    }
    match value.strip_prefix('$') {
        Some(name) if !name.is_empty() => EnvValue::Variable(name.to_string()),
        _ => EnvValue::Literal(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_targets_and_timeout() {
        let cfg = Settings::default();
        assert!(cfg.targets.is_empty());
        assert!(cfg.proxy.is_none());
        assert_eq!(cfg.write_timeout, Duration::from_secs(10));
    }

    #[test]
    fn parse_env_parameters_accepts_literals_and_variables() {
        let params = parse_env_parameters("branch=$GIT_BRANCH\r\nnode=${NODE_NAME}\n team=infra,dev").unwrap();
        assert_eq!(
            params,
            vec![
                EnvParameter {
                    key: "branch".into(),
                    value: EnvValue::Variable("GIT_BRANCH".into())
                },
                EnvParameter {
                    key: "node".into(),
                    value: EnvValue::Variable("NODE_NAME".into())
                },
                EnvParameter {
                    key: "team".into(),
                    value: EnvValue::Literal("infra,dev".into())
                },
            ]
        );
    }

    #[test]
    fn parse_env_parameters_rejects_bad_entries() {
        assert!(parse_env_parameters("branch").is_err());
        assert!(parse_env_parameters("=main").is_err());
    }

    #[test]
    fn env_parameter_resolution() {
        let env = BTreeMap::from([("GIT_BRANCH".to_string(), "main".to_string())]);
        let params = parse_env_parameters("branch=$GIT_BRANCH\nmissing=$NOPE\nlit=x").unwrap();
        let resolved: Vec<_> = params.iter().map(|p| p.resolve(&env)).collect();
        assert_eq!(
            resolved,
            vec![Some("main".to_string()), None, Some("x".to_string())]
        );
    }

    #[test]
    fn apply_file_overrides_reads_targets_and_proxy() {
        let file: ConfigOverrides = toml::from_str(
            r#"
            custom_prefix = "pr"
            measurement_name = ""
            write_timeout = "3s"
            env_parameter_field = "branch=$GIT_BRANCH"

            [proxy]
            url = "http://proxy.local:3128"
            username = "ci"
            password = "secret"
            no_proxy = "localhost, influx.internal"

            [[targets]]
            description = "primary"
            url = "http://influx.internal:8086"
            database = "jenkins"
            expose_exceptions = true

            [[targets]]
            description = "backup"
            url = "http://backup:8086"
            database = "jenkins"
            use_proxy = true
            "#,
        )
        .unwrap();

        let mut cfg = Settings::default();
        apply_overrides(&mut cfg, file, "config file").unwrap();

        assert_eq!(cfg.custom_prefix.as_deref(), Some("pr"));
        assert_eq!(cfg.measurement_name, None);
        assert_eq!(cfg.write_timeout, Duration::from_secs(3));
        assert_eq!(cfg.env_parameter_fields.len(), 1);
        assert_eq!(cfg.targets.len(), 2);
        assert!(cfg.targets[0].expose_exceptions);
        assert!(cfg.targets[1].use_proxy);

        let proxy = cfg.proxy.unwrap();
        assert_eq!(proxy.url, "http://proxy.local:3128");
        assert_eq!(proxy.username.as_deref(), Some("ci"));
        assert_eq!(proxy.no_proxy, vec!["localhost", "influx.internal"]);
    }

    #[test]
    fn proxy_credentials_without_url_are_rejected() {
        let mut cfg = Settings::default();
        let overrides = ConfigOverrides {
            proxy: Some(ProxyOverrides {
                username: Some("ci".into()),
                ..ProxyOverrides::default()
            }),
            ..ConfigOverrides::default()
        };
        assert!(apply_overrides(&mut cfg, overrides, "environment").is_err());
    }

    #[test]
    fn bad_timeout_is_config_error() {
        let mut cfg = Settings::default();
        let overrides = ConfigOverrides {
            write_timeout: Some("soon".into()),
            ..ConfigOverrides::default()
        };
        let err = apply_overrides(&mut cfg, overrides, "environment").unwrap_err();
        assert!(matches!(err, BuildPulseError::Config(_)));
    }

    #[test]
    fn select_targets_by_description() {
        let cfg = Settings {
            targets: vec![
                Target::new("a", "http://a:8086", "db"),
                Target::new("b", "http://b:8086", "db"),
            ],
            ..Settings::default()
        };
        assert_eq!(cfg.select_targets(&[]).unwrap().len(), 2);
        let picked = cfg.select_targets(&["b".to_string()]).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].description, "b");
        assert!(cfg.select_targets(&["c".to_string()]).is_err());
    }

    #[test]
    fn explicit_missing_config_file_is_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/buildpulse.toml"))).unwrap_err();
        assert!(matches!(err, BuildPulseError::Config(_)));
    }

    #[test]
    fn loads_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[[targets]]\ndescription = \"local\"\nurl = \"http://localhost:8086\"\ndatabase = \"ci\"\n",
        )
        .unwrap();
        let cfg = Settings::load(Some(&path)).unwrap();
        assert_eq!(cfg.targets[0].database, "ci");
    }

    fn lookup(vars: &[(&str, String)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    const FILE_CONFIG: &str = r#"
custom_prefix = "file"
custom_project_name = "from-file"
write_timeout = "3s"

[proxy]
url = "http://file-proxy:3128"
username = "file-user"

[[targets]]
description = "local"
url = "http://localhost:8086"
database = "ci"
"#;

    #[test]
    fn environment_overrides_every_setting() {
        let home = tempfile::tempdir().unwrap();
        let env = lookup(&[
            ("HOME", home.path().display().to_string()),
            ("BUILDPULSE_CUSTOM_PROJECT_NAME", "web".into()),
            ("BUILDPULSE_CUSTOM_PREFIX", "pr".into()),
            ("BUILDPULSE_MEASUREMENT_NAME", "ci_builds".into()),
            ("BUILDPULSE_WRITE_TIMEOUT", "250ms".into()),
            ("BUILDPULSE_PROXY_URL", "http://proxy.local:3128".into()),
            ("BUILDPULSE_PROXY_USERNAME", "ci".into()),
            ("BUILDPULSE_PROXY_PASSWORD", "secret".into()),
            ("BUILDPULSE_NO_PROXY", "localhost,influx.internal".into()),
            ("BUILDPULSE_ENV_PARAMETER_FIELD", "branch=$GIT_BRANCH".into()),
            ("BUILDPULSE_ENV_PARAMETER_TAG", "node=${NODE_NAME}\nteam=infra".into()),
        ]);

        let cfg = Settings::load_with(None, env).unwrap();
        assert!(cfg.targets.is_empty());
        assert_eq!(cfg.custom_project_name.as_deref(), Some("web"));
        assert_eq!(cfg.custom_prefix.as_deref(), Some("pr"));
        assert_eq!(cfg.measurement_name.as_deref(), Some("ci_builds"));
        assert_eq!(cfg.write_timeout, Duration::from_millis(250));
        assert_eq!(cfg.env_parameter_fields.len(), 1);
        assert_eq!(cfg.env_parameter_tags.len(), 2);

        let proxy = cfg.proxy.unwrap();
        assert_eq!(proxy.url, "http://proxy.local:3128");
        assert_eq!(proxy.username.as_deref(), Some("ci"));
        assert_eq!(proxy.password.as_deref(), Some("secret"));
        assert_eq!(proxy.no_proxy, vec!["localhost", "influx.internal"]);
    }

    #[test]
    fn environment_wins_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, FILE_CONFIG).unwrap();
        let env = lookup(&[
            ("BUILDPULSE_CONFIG", path.display().to_string()),
            ("BUILDPULSE_CUSTOM_PREFIX", "env".into()),
            ("BUILDPULSE_PROXY_USERNAME", "env-user".into()),
        ]);

        let cfg = Settings::load_with(None, env).unwrap();
        assert_eq!(cfg.targets.len(), 1);
        assert_eq!(cfg.custom_prefix.as_deref(), Some("env"));
        assert_eq!(cfg.custom_project_name.as_deref(), Some("from-file"));
        assert_eq!(cfg.write_timeout, Duration::from_secs(3));

        let proxy = cfg.proxy.unwrap();
        assert_eq!(proxy.url, "http://file-proxy:3128");
        assert_eq!(proxy.username.as_deref(), Some("env-user"));
    }

    #[test]
    fn blank_environment_value_clears_file_setting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, FILE_CONFIG).unwrap();
        let env = lookup(&[("BUILDPULSE_CUSTOM_PROJECT_NAME", " ".into())]);

        let cfg = Settings::load_with(Some(&path), env).unwrap();
        assert_eq!(cfg.custom_project_name, None);
        assert_eq!(cfg.custom_prefix.as_deref(), Some("file"));
    }

    #[test]
    fn default_path_uses_xdg_config_home() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("buildpulse")).unwrap();
        fs::write(dir.path().join("buildpulse/config.toml"), FILE_CONFIG).unwrap();
        let env = lookup(&[
            ("HOME", "/nonexistent".into()),
            ("XDG_CONFIG_HOME", dir.path().display().to_string()),
        ]);

        let cfg = Settings::load_with(None, env).unwrap();
        assert_eq!(cfg.targets[0].description, "local");
    }

    #[test]
    fn missing_default_config_file_yields_defaults() {
        let home = tempfile::tempdir().unwrap();
        let env = lookup(&[("HOME", home.path().display().to_string())]);
        assert_eq!(Settings::load_with(None, env).unwrap(), Settings::default());
    }

    #[test]
    fn bad_environment_timeout_names_its_source() {
        let home = tempfile::tempdir().unwrap();
        let env = lookup(&[
            ("HOME", home.path().display().to_string()),
            ("BUILDPULSE_WRITE_TIMEOUT", "soon".into()),
        ]);
        let err = Settings::load_with(None, env).unwrap_err();
        assert!(err.to_string().contains("environment"));
    }
}
