//! In-memory `MetricsSource` for unit tests.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::prometheus::models::SeriesLabels;
use crate::prometheus::{MetricsSource, RangeWindow, Series};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Answers queries from a fixed table keyed by expression. Unknown
/// expressions return zero rows.
#[derive(Default)]
pub(crate) struct FakeSource {
    responses: HashMap<String, Vec<Series>>,
    failing: HashSet<String>,
    issued: Mutex<Vec<String>>,
    windows: Mutex<Vec<RangeWindow>>,
}

impl FakeSource {
    pub(crate) fn with(mut self, expr: &str, rows: Vec<Series>) -> Self {
        self.responses.insert(expr.to_string(), rows);
        self
    }

    pub(crate) fn failing(mut self, expr: &str) -> Self {
        self.failing.insert(expr.to_string());
        self
    }

    pub(crate) fn issued(&self) -> Vec<String> {
        self.issued.lock().unwrap().clone()
    }

    pub(crate) fn windows(&self) -> Vec<RangeWindow> {
        self.windows.lock().unwrap().clone()
    }

    fn answer(&self, expr: &str) -> Result<Vec<Series>> {
        self.issued.lock().unwrap().push(expr.to_string());
        if self.failing.contains(expr) {
            return Err(AppError::Upstream(format!("refused: {}", expr)));
        }
        Ok(self.responses.get(expr).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl MetricsSource for FakeSource {
    async fn query(&self, expr: &str) -> Result<Vec<Series>> {
        self.answer(expr)
    }

    async fn query_range(&self, expr: &str, window: &RangeWindow) -> Result<Vec<Series>> {
        self.windows.lock().unwrap().push(window.clone());
        self.answer(expr)
    }
}

pub(crate) fn site_value(site: &str, value: &str) -> Series {
    Series {
        metric: SeriesLabels {
            name: None,
            site: Some(site.to_string()),
        },
        value: Some((1_700_000_000.0, value.to_string())),
        values: Vec::new(),
    }
}

pub(crate) fn fleet_value(value: &str) -> Series {
    Series {
        value: Some((1_700_000_000.0, value.to_string())),
        ..Default::default()
    }
}

pub(crate) fn site_series(site: Option<&str>, points: &[(f64, &str)]) -> Series {
    Series {
        metric: SeriesLabels {
            name: None,
            site: site.map(str::to_string),
        },
        value: None,
        values: points
            .iter()
            .map(|(ts, value)| (*ts, value.to_string()))
            .collect(),
    }
}

pub(crate) fn test_config(estimated_kw: f64, monitored_kw: f64) -> Config {
    let mut config: Config =
        serde_yaml::from_str("prometheus: {}").expect("minimal config parses");
    config.capacity.estimated_kw = estimated_kw;
    config.capacity.monitored_kw = monitored_kw;
    config
}
