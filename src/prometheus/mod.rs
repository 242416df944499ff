pub mod client;
pub mod models;
pub mod query;

pub use client::PrometheusClient;
pub use models::{EntitySample, MetricSample, Series};

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Time window for a range query.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step: Duration,
}

/// A source of PromQL query results.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Evaluate `expr` at the current instant.
    async fn query(&self, expr: &str) -> Result<Vec<Series>>;

    /// Evaluate `expr` over `window` at a fixed step.
    async fn query_range(&self, expr: &str, window: &RangeWindow) -> Result<Vec<Series>>;
}
