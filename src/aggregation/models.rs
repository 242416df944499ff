use crate::prometheus::MetricSample;
use serde::{Deserialize, Serialize};

/// Label of the synthetic site standing in for unmonitored capacity.
pub const UNMONITORED_SITE: &str = "Unmonitored (estimated)";

/// Per-site figures for the fleet snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub name: String,
    /// Current output in W.
    pub snapshot: f64,
    /// Generation since local midnight in kWh.
    pub today: f64,
    /// Generation over the last 7 days in kWh.
    pub week: f64,
    /// Generation over the last 365 days in kWh.
    pub year: f64,
    /// Peak output over the last year in W.
    pub max: f64,
}

impl SiteRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    /// All-time monitored generation in kWh.
    pub total_kwh: f64,
    pub day_kwh: f64,
    pub week_kwh: f64,
    pub year_kwh: f64,
    pub current_w: f64,
    /// Monitored sites in first-seen order, then the unmonitored estimate.
    pub sites: Vec<SiteRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitePeriodRecord {
    pub name: String,
    /// Latest cumulative meter reading in kWh.
    pub meter: f64,
    /// Current output in W.
    pub current: f64,
    #[serde(rename = "generation_in_period")]
    pub period: f64,
    /// Peak output within the period in W.
    pub max: f64,
    /// Averaged output over the period.
    pub data: Vec<MetricSample>,
}

impl SitePeriodRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Fleet output since local midnight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationCurve {
    pub values: Vec<MetricSample>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_record_json_keys() {
        let json = serde_json::to_value(SiteRecord::named("Barn")).unwrap();
        for key in ["name", "snapshot", "today", "week", "year", "max"] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
    }

    #[test]
    fn test_period_record_json_keys() {
        let mut record = SitePeriodRecord::named("Barn");
        record.period = 4.5;
        record.data = vec![MetricSample::from((1.0, 2.0))];

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["generation_in_period"], 4.5);
        assert_eq!(json["data"], serde_json::json!([[1.0, 2.0]]));
    }
}
