//! InfluxDB 1.x HTTP write client.

use std::future::Future;
use std::io::Write;

use buildpulse_core::config::{ProxyConfig, Settings};
use buildpulse_core::error::{BuildPulseError, Result};
use buildpulse_core::model::point::PointBatch;
use buildpulse_core::model::target::Target;
use flate2::Compression;
use flate2::write::GzEncoder;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{Client, NoProxy, Proxy, Url};
use tracing::{debug, warn};

use crate::line_protocol;

/// One batched write: every point of the run, bound for one database.
#[derive(Debug, Clone, Copy)]
pub struct WriteRequest<'a> {
    pub database: &'a str,
    pub retention_policy: &'a str,
    pub points: &'a PointBatch,
}

impl<'a> WriteRequest<'a> {
    pub fn for_target(target: &'a Target, points: &'a PointBatch) -> Self {
        Self {
            database: &target.database,
            retention_policy: &target.retention_policy,
            points,
        }
    }
}

/// Opens connections to targets. The URL has already been validated.
pub trait Connector: Send + Sync {
    type Connection: PointWriter;

    fn connect(&self, target: &Target, url: &Url) -> Result<Self::Connection>;
}

pub trait PointWriter {
    /// Writes the whole batch in one call or fails without partial writes.
    fn write(&self, request: &WriteRequest<'_>) -> impl Future<Output = Result<()>> + Send;
}

/// Accepts only absolute `http`/`https` URLs with a host.
pub fn validate_target_url(target: &Target) -> Result<Url> {
    let invalid = |reason: String| BuildPulseError::InvalidTargetUrl {
        url: target.url.clone(),
        reason,
    };
    let url = Url::parse(target.url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Connector backed by pooled reqwest clients. The direct client ignores
/// system proxy variables; the proxied client is built once from settings.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    direct: Client,
    proxied: Option<Client>,
}

impl HttpConnector {
    pub fn new(settings: &Settings) -> Result<Self> {
        let direct = Client::builder()
            .timeout(settings.write_timeout)
            .no_proxy()
            .build()
            .map_err(|e| BuildPulseError::Config(format!("failed to build http client: {e}")))?;
        let proxied = settings
            .proxy
            .as_ref()
            .map(|proxy| build_proxied_client(settings, proxy))
            .transpose()?;
        Ok(Self { direct, proxied })
    }
}

fn build_proxied_client(settings: &Settings, cfg: &ProxyConfig) -> Result<Client> {
    let mut proxy = Proxy::all(cfg.url.as_str())
        .map_err(|e| BuildPulseError::Config(format!("invalid proxy url '{}': {e}", cfg.url)))?;
    if let Some(username) = cfg.username.as_deref().filter(|u| !u.is_empty()) {
        proxy = proxy.basic_auth(username, cfg.password.as_deref().unwrap_or_default());
    }
    if !cfg.no_proxy.is_empty() {
        proxy = proxy.no_proxy(NoProxy::from_string(&cfg.no_proxy.join(",")));
    }
    Client::builder()
        .timeout(settings.write_timeout)
        .proxy(proxy)
        .build()
        .map_err(|e| BuildPulseError::Config(format!("failed to build proxied http client: {e}")))
}

impl Connector for HttpConnector {
    type Connection = InfluxConnection;

    fn connect(&self, target: &Target, url: &Url) -> Result<InfluxConnection> {
        let client = match (&self.proxied, target.use_proxy) {
            (Some(proxied), true) => proxied.clone(),
            (None, true) => {
                warn!(target = %target.description, "target asks for a proxy but none is configured, connecting directly");
                self.direct.clone()
            }
            (_, false) => self.direct.clone(),
        };
        Ok(InfluxConnection {
            client,
            base_url: url.clone(),
            target: target.description.clone(),
            credentials: target
                .credentials()
                .map(|(u, p)| (u.to_string(), p.to_string())),
            gzip: target.gzip,
        })
    }
}

#[derive(Debug, Clone)]
pub struct InfluxConnection {
    client: Client,
    base_url: Url,
    target: String,
    credentials: Option<(String, String)>,
    gzip: bool,
}

impl InfluxConnection {
    fn write_url(&self, request: &WriteRequest<'_>) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| self.publish_error("url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("write");
        {
            let mut query = url.query_pairs_mut();
            query.clear().append_pair("db", request.database);
            if !request.retention_policy.is_empty() {
                query.append_pair("rp", request.retention_policy);
            }
            // One acknowledging replica is enough.
            query
                .append_pair("consistency", "any")
                .append_pair("precision", "ns");
        }
        Ok(url)
    }

    fn publish_error(&self, reason: String) -> BuildPulseError {
        BuildPulseError::Publish {
            target: self.target.clone(),
            reason,
        }
    }
}

impl PointWriter for InfluxConnection {
    async fn write(&self, request: &WriteRequest<'_>) -> Result<()> {
        let url = self.write_url(request)?;
        let body = line_protocol::encode_batch(request.points).into_bytes();
        let (body, encoding) = maybe_gzip(body, self.gzip)
            .map_err(|e| self.publish_error(format!("failed to compress body: {e}")))?;

        let mut req = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "text/plain; charset=utf-8");
        if let Some(encoding) = encoding {
            req = req.header(CONTENT_ENCODING, encoding);
        }
        if let Some((username, password)) = &self.credentials {
            req = req.basic_auth(username, Some(password));
        }

        let resp = req
            .body(body)
            .send()
            .await
            .map_err(|e| self.publish_error(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            debug!(target = %self.target, points = request.points.len(), "batch written");
            return Ok(());
        }
        let detail = resp.text().await.unwrap_or_default();
        Err(self.publish_error(format!("server answered {status}: {}", detail.trim())))
    }
}

fn maybe_gzip(body: Vec<u8>, gzip: bool) -> std::io::Result<(Vec<u8>, Option<&'static str>)> {
    if !gzip {
        return Ok((body, None));
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&body)?;
    Ok((encoder.finish()?, Some("gzip")))
}
