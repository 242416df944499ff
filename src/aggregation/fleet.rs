use crate::aggregation::merge::{merge_field, Roster, SiteField};
use crate::aggregation::models::{FleetSnapshot, SiteRecord, UNMONITORED_SITE};
use crate::config::Config;
use crate::config::MetricsConfig;
use crate::error::{AppError, Result};
use crate::prometheus::query::{self, Selectors};
use crate::prometheus::{EntitySample, MetricsSource};
use chrono::{Local, NaiveTime, Timelike};
use tracing::debug;

const FIELDS: [SiteField; 5] = [
    SiteField::Snapshot,
    SiteField::Today,
    SiteField::Week,
    SiteField::Year,
    SiteField::Max,
];

/// Builds the fleet-wide snapshot from per-site and fleet queries.
pub struct FleetAggregator<'a, S: ?Sized> {
    source: &'a S,
    metrics: &'a MetricsConfig,
    scale: f64,
}

impl<'a, S: MetricsSource + ?Sized> FleetAggregator<'a, S> {
    pub fn new(source: &'a S, config: &'a Config) -> Self {
        Self {
            source,
            metrics: &config.metrics,
            scale: config.capacity.scale_factor(),
        }
    }

    pub async fn snapshot(&self) -> Result<FleetSnapshot> {
        self.snapshot_at(Local::now().time()).await
    }

    /// Snapshot with "today" measured from midnight to `now` (local time).
    pub async fn snapshot_at(&self, now: NaiveTime) -> Result<FleetSnapshot> {
        let sel = Selectors::new(self.metrics);
        let generation = sel.generation(None);
        let power = sel.power(None);

        let mut roster = Roster::new();
        let mut snapshot = FleetSnapshot::default();

        snapshot.year_kwh += self
            .fold(&mut roster, &query::delta(&generation, "365d"), SiteField::Year)
            .await?;
        snapshot.week_kwh += self
            .fold(&mut roster, &query::delta(&generation, "7d"), SiteField::Week)
            .await?;
        snapshot.day_kwh += self
            .fold(
                &mut roster,
                &query::delta(&generation, &day_window(now)),
                SiteField::Today,
            )
            .await?;
        self.fold(
            &mut roster,
            &query::max_over_time(&power, "1y"),
            SiteField::Max,
        )
        .await?;
        snapshot.current_w += self.fold(&mut roster, &power, SiteField::Snapshot).await?;

        snapshot.total_kwh = self
            .fleet_scalar(&query::sum(&query::last_over_time(&generation, "1y")))
            .await?;

        let mut sites = roster.into_vec();
        let unmonitored = unmonitored_estimate(&sites, self.scale);

        // The all-time and yearly totals stay monitored-only.
        snapshot.day_kwh += unmonitored.today;
        snapshot.week_kwh += unmonitored.week;
        snapshot.current_w += unmonitored.snapshot;

        sites.push(unmonitored);
        snapshot.sites = sites;

        debug!(
            sites = snapshot.sites.len(),
            current_w = snapshot.current_w,
            "fleet snapshot assembled"
        );
        Ok(snapshot)
    }

    async fn fold(
        &self,
        roster: &mut Roster<SiteRecord>,
        expr: &str,
        field: SiteField,
    ) -> Result<f64> {
        let rows = self.source.query(expr).await?;
        debug!(query = %expr, rows = rows.len(), ?field, "folding site query");

        let samples: Vec<EntitySample> = rows.iter().map(|s| s.entity_sample()).collect();
        Ok(merge_field(roster, &samples, field))
    }

    async fn fleet_scalar(&self, expr: &str) -> Result<f64> {
        let rows = self.source.query(expr).await?;
        rows.first()
            .map(|row| row.scalar())
            .ok_or_else(|| AppError::Upstream(format!("empty result for query: {}", expr)))
    }
}

/// Range selector covering local midnight up to `now`, at least one second wide.
pub fn day_window(now: NaiveTime) -> String {
    format!("{}s", now.num_seconds_from_midnight().max(1))
}

/// The synthetic unmonitored site: every field is the monitored sum times `scale`.
pub fn unmonitored_estimate(sites: &[SiteRecord], scale: f64) -> SiteRecord {
    let mut estimate = SiteRecord::named(UNMONITORED_SITE);
    for field in FIELDS {
        let total: f64 = sites.iter().map(|site| field.get(site)).sum();
        *field.slot(&mut estimate) = total * scale;
    }
    estimate
}
