use crate::aggregation::merge::Roster;
use crate::aggregation::models::SitePeriodRecord;
use crate::config::{Config, MetricsConfig};
use crate::error::{AppError, Result};
use crate::prometheus::query::{self, Selectors};
use crate::prometheus::{MetricsSource, Series};
use tracing::debug;

/// Sampling step of the averaged output series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Minute,
    QuarterHour,
    ThreeHours,
    Day,
}

impl Resolution {
    /// Breakpoints at 1, 7 and 31 days.
    pub fn for_days(days: u32) -> Self {
        match days {
            0..=1 => Resolution::Minute,
            2..=7 => Resolution::QuarterHour,
            8..=31 => Resolution::ThreeHours,
            _ => Resolution::Day,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Minute => "1m",
            Resolution::QuarterHour => "15m",
            Resolution::ThreeHours => "3h",
            Resolution::Day => "24h",
        }
    }
}

/// Periods shorter than a day are treated as one day.
pub fn normalize_days(days: i64) -> u32 {
    u32::try_from(days.max(1)).unwrap_or(u32::MAX)
}

/// Site names arrive URL-encoded with `+` for spaces.
pub fn decode_site_name(raw: &str) -> String {
    raw.replace('+', " ")
}

/// Assembles per-site figures over a period of whole days.
pub struct PeriodAssembler<'a, S: ?Sized> {
    source: &'a S,
    metrics: &'a MetricsConfig,
}

impl<'a, S: MetricsSource + ?Sized> PeriodAssembler<'a, S> {
    pub fn new(source: &'a S, config: &'a Config) -> Self {
        Self {
            source,
            metrics: &config.metrics,
        }
    }

    /// Period figures for one site. Fails with `NotFound` when the site has
    /// no meter reading.
    pub async fn site(&self, raw_name: &str, days: i64) -> Result<SitePeriodRecord> {
        let name = decode_site_name(raw_name);
        if name.is_empty() {
            return Err(AppError::InvalidInput(
                "you must include a site name".to_string(),
            ));
        }

        let days = normalize_days(days);
        let resolution = Resolution::for_days(days).as_str();
        let range = format!("{}d", days);

        let sel = Selectors::new(self.metrics);
        let generation = sel.generation(Some(&name));
        let power = sel.power(Some(&name));

        let meter = self.source.query(&generation).await?;
        let meter = meter
            .first()
            .ok_or_else(|| AppError::NotFound(format!("site: {} - not found", name)))?;

        let mut record = SitePeriodRecord::named(name.as_str());
        record.meter = meter.scalar();

        record.current = first_scalar(&self.source.query(&power).await?);

        let series_expr = query::subquery(
            &query::avg_over_time(&power, resolution),
            &range,
            resolution,
        );
        record.data = self
            .source
            .query(&series_expr)
            .await?
            .first()
            .map(Series::samples)
            .unwrap_or_default();

        record.period = first_scalar(
            &self
                .source
                .query(&query::delta(&generation, &range))
                .await?,
        );
        record.max = first_scalar(
            &self
                .source
                .query(&query::max_over_time(&power, &range))
                .await?,
        );

        debug!(site = %name, days, resolution, "site period assembled");
        Ok(record)
    }

    /// Period figures for every site with a meter reading. Later queries
    /// only fill in sites the meter query reported. An empty meter result
    /// is an upstream failure, not a missing site.
    pub async fn all(&self, days: i64) -> Result<Vec<SitePeriodRecord>> {
        let days = normalize_days(days);
        let resolution = Resolution::for_days(days).as_str();
        let range = format!("{}d", days);

        let sel = Selectors::new(self.metrics);
        let generation = sel.generation(None);
        let power = sel.power(None);

        let meter = self
            .source
            .query(&query::last_over_time(&generation, "1y"))
            .await?;
        if meter.is_empty() {
            return Err(AppError::Upstream(
                "no results found for fleet meter query".to_string(),
            ));
        }

        let mut roster = Roster::new();
        for row in &meter {
            roster
                .upsert(row.site(), || SitePeriodRecord::named(row.site()))
                .meter = row.scalar();
        }

        let current = self
            .source
            .query(&query::last_over_time(&power, "1y"))
            .await?;
        update_existing(&mut roster, &current, |record, row| {
            record.current = row.scalar()
        });

        let series_expr = query::subquery(
            &query::avg_over_time(&power, resolution),
            &range,
            resolution,
        );
        let series = self.source.query(&series_expr).await?;
        update_existing(&mut roster, &series, |record, row| {
            record.data = row.samples()
        });

        let period = self
            .source
            .query(&query::delta(&generation, &range))
            .await?;
        update_existing(&mut roster, &period, |record, row| {
            record.period = row.scalar()
        });

        let max = self
            .source
            .query(&query::max_over_time(&power, &range))
            .await?;
        update_existing(&mut roster, &max, |record, row| record.max = row.scalar());

        debug!(sites = roster.len(), days, resolution, "fleet period assembled");
        Ok(roster.into_vec())
    }
}

fn first_scalar(rows: &[Series]) -> f64 {
    rows.first().map(Series::scalar).unwrap_or_default()
}

/// Apply `rows` to records that already exist; rows for unknown sites are dropped.
fn update_existing<F>(roster: &mut Roster<SitePeriodRecord>, rows: &[Series], mut apply: F)
where
    F: FnMut(&mut SitePeriodRecord, &Series),
{
    for row in rows {
        match roster.get_mut(row.site()) {
            Some(record) => apply(record, row),
            None => debug!(site = %row.site(), "dropping row for site without meter reading"),
        }
    }
}
