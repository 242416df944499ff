use serde::{Deserialize, Serialize};

/// Envelope of every `/api/v1/query*` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<ResponseData>,
    #[serde(default, rename = "errorType")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseData {
    #[serde(rename = "resultType")]
    pub result_type: String,
    #[serde(default)]
    pub result: Vec<Series>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SeriesLabels {
    #[serde(default, rename = "__name__")]
    pub name: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
}

/// Raw `[timestamp, "value"]` pair as it travels on the wire.
pub type RawSample = (f64, String);

/// One result row. Vector results carry `value`, matrix results `values`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub metric: SeriesLabels,
    #[serde(default)]
    pub value: Option<RawSample>,
    #[serde(default)]
    pub values: Vec<RawSample>,
}

impl Series {
    /// The site label, or the empty name for fleet-wide results.
    pub fn site(&self) -> &str {
        self.metric.site.as_deref().unwrap_or_default()
    }

    /// Instant value parsed to a float; missing or unparsable reads as zero.
    pub fn scalar(&self) -> f64 {
        self.value
            .as_ref()
            .map(|(_, raw)| parse_value(raw))
            .unwrap_or_default()
    }

    pub fn samples(&self) -> Vec<MetricSample> {
        self.values
            .iter()
            .map(|(timestamp, raw)| MetricSample {
                timestamp: *timestamp,
                value: parse_value(raw),
            })
            .collect()
    }

    pub fn entity_sample(&self) -> EntitySample {
        EntitySample {
            name: self.site().to_string(),
            value: self.scalar(),
        }
    }
}

/// A `(name, value)` pair produced by a per-site instant query.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySample {
    pub name: String,
    pub value: f64,
}

impl EntitySample {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Parsed time-series point, serialized as `[timestamp, value]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct MetricSample {
    pub timestamp: f64,
    pub value: f64,
}

impl From<(f64, f64)> for MetricSample {
    fn from((timestamp, value): (f64, f64)) -> Self {
        Self { timestamp, value }
    }
}

impl From<MetricSample> for (f64, f64) {
    fn from(sample: MetricSample) -> Self {
        (sample.timestamp, sample.value)
    }
}

/// Parse a sample value. Unparsable or non-finite text (`NaN`, `+Inf`)
/// degrades to zero so totals stay finite and serializable.
pub fn parse_value(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            tracing::warn!(raw = %raw, "unusable sample value, using 0");
            0.0
        }
    }
}
