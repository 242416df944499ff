use crate::config::PrometheusConfig;
use crate::error::{AppError, Result};
use crate::prometheus::models::{ApiResponse, Series};
use crate::prometheus::{MetricsSource, RangeWindow};
use async_trait::async_trait;
use tracing::debug;

/// HTTP client for the Prometheus query API.
#[derive(Clone)]
pub struct PrometheusClient {
    http: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl PrometheusClient {
    pub fn new(config: &PrometheusConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    async fn fetch(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<Series>> {
        let mut request = self
            .http
            .get(self.endpoint(path))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(params);

        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: ApiResponse = serde_json::from_str(&body).map_err(|e| {
            debug!(%status, body = %body, "undecodable Prometheus response");
            AppError::Decode(e)
        })?;

        decode_result(parsed)
    }
}

/// Unwrap the result rows of a decoded response, turning `status: error`
/// into an upstream failure.
pub(crate) fn decode_result(response: ApiResponse) -> Result<Vec<Series>> {
    if response.status != "success" {
        return Err(AppError::Upstream(format!(
            "{}: {}",
            response.error_type.as_deref().unwrap_or("error"),
            response.error.as_deref().unwrap_or("unknown Prometheus error")
        )));
    }

    response
        .data
        .map(|data| data.result)
        .ok_or_else(|| AppError::Upstream("response without data".to_string()))
}

#[async_trait]
impl MetricsSource for PrometheusClient {
    async fn query(&self, expr: &str) -> Result<Vec<Series>> {
        debug!(query = %expr, "instant query");
        self.fetch("query", &[("query", expr.to_string())]).await
    }

    async fn query_range(&self, expr: &str, window: &RangeWindow) -> Result<Vec<Series>> {
        debug!(query = %expr, start = %window.start, end = %window.end, "range query");
        self.fetch(
            "query_range",
            &[
                ("query", expr.to_string()),
                ("start", window.start.to_rfc3339()),
                ("end", window.end.to_rfc3339()),
                ("step", window.step.as_secs().to_string()),
            ],
        )
        .await
    }
}
