use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub prometheus: PrometheusConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub capacity: CapacityConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Base URL of the Prometheus server, without the `/api/v1` suffix.
    #[serde(default = "default_prometheus_url")]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_prometheus_url() -> String {
    "http://localhost:9090".into()
}

fn default_timeout_secs() -> u64 {
    30
}

impl PrometheusConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_api_host() -> String {
    "0.0.0.0".into()
}

fn default_api_port() -> u16 {
    1323
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

/// Installed solar capacity, used to scale monitored figures up to the
/// unmonitored estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityConfig {
    /// Estimated unmonitored capacity in kW.
    #[serde(default = "default_estimated_kw")]
    pub estimated_kw: f64,
    /// Monitored capacity in kW.
    #[serde(default = "default_monitored_kw")]
    pub monitored_kw: f64,
}

fn default_estimated_kw() -> f64 {
    500.0
}

fn default_monitored_kw() -> f64 {
    20.0
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            estimated_kw: default_estimated_kw(),
            monitored_kw: default_monitored_kw(),
        }
    }
}

impl CapacityConfig {
    /// Multiplier applied to monitored sums to estimate unmonitored output.
    pub fn scale_factor(&self) -> f64 {
        self.estimated_kw / self.monitored_kw
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    60
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl StreamConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Metric names and the label matcher selecting solar meters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Cumulative energy counter (kWh).
    #[serde(default = "default_generation_metric")]
    pub generation: String,
    /// Instantaneous active power gauge (W).
    #[serde(default = "default_power_metric")]
    pub power: String,
    #[serde(default = "default_purpose")]
    pub purpose: String,
}

fn default_generation_metric() -> String {
    "total_import".into()
}

fn default_power_metric() -> String {
    "total_act_power".into()
}

fn default_purpose() -> String {
    "solar".into()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            generation: default_generation_metric(),
            power: default_power_metric(),
            purpose: default_purpose(),
        }
    }
}

impl Config {
    /// Load YAML from disk, substitute $(VAR)/${VAR} with env vars, apply
    /// GRIDWATCH_* overrides, then validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let expanded = expand_env_placeholders(&raw)?;
        let mut cfg: Self = serde_yaml::from_str(&expanded)?;

        cfg.apply_env_overrides()?;
        cfg.validate()?;

        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("GRIDWATCH_PROM_URL") {
            self.prometheus.url = url;
        }
        if let Ok(username) = std::env::var("GRIDWATCH_USERNAME") {
            self.prometheus.username = Some(username);
        }
        if let Ok(password) = std::env::var("GRIDWATCH_PASSWORD") {
            self.prometheus.password = Some(password);
        }
        if let Ok(host) = std::env::var("GRIDWATCH_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("GRIDWATCH_PORT") {
            self.api.port = parse_env("GRIDWATCH_PORT", &port)?;
        }
        if let Ok(estimate) = std::env::var("GRIDWATCH_ESTIMATED_DNC") {
            self.capacity.estimated_kw = parse_env("GRIDWATCH_ESTIMATED_DNC", &estimate)?;
        }
        if let Ok(monitored) = std::env::var("GRIDWATCH_DNC") {
            self.capacity.monitored_kw = parse_env("GRIDWATCH_DNC", &monitored)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.prometheus.url.is_empty() {
            return Err(AppError::Config(
                "Prometheus url cannot be empty".to_string(),
            ));
        }

        if self.api.port == 0 {
            return Err(AppError::Config("API port cannot be 0".to_string()));
        }

        if self.capacity.monitored_kw.is_nan() || self.capacity.monitored_kw <= 0.0 {
            return Err(AppError::Config(
                "Monitored capacity must be greater than 0".to_string(),
            ));
        }

        if self.capacity.estimated_kw.is_nan() || self.capacity.estimated_kw < 0.0 {
            return Err(AppError::Config(
                "Estimated capacity cannot be negative".to_string(),
            ));
        }

        if self.stream.interval_secs == 0 {
            return Err(AppError::Config(
                "Stream interval cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("invalid value for {}: {:?}", name, value)))
}

/// Expand $(VAR) and ${VAR} placeholders using environment variables.
/// "$$" becomes a literal "$".
fn expand_env_placeholders(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut it = input.chars().peekable();

    while let Some(c) = it.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let close = match it.peek().copied() {
            Some('$') => {
                it.next();
                out.push('$');
                continue;
            }
            Some('(') => ')',
            Some('{') => '}',
            _ => {
                out.push('$');
                continue;
            }
        };

        it.next();
        let var = read_until(&mut it, close).ok_or_else(|| {
            AppError::Config(format!(
                "unterminated env placeholder: missing '{}'",
                close
            ))
        })?;
        let val = std::env::var(&var)
            .map_err(|_| AppError::Config(format!("missing environment variable: {}", var)))?;
        out.push_str(&val);
    }

    Ok(out)
}

/// Read characters until we hit `end`, consuming the delimiter.
fn read_until<I>(it: &mut std::iter::Peekable<I>, end: char) -> Option<String>
where
    I: Iterator<Item = char>,
{
    let mut buf = String::new();
    for ch in it.by_ref() {
        if ch == end {
            return Some(buf);
        }
        buf.push(ch);
    }
    None
}
