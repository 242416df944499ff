use crate::aggregation::models::GenerationCurve;
use crate::config::Config;
use crate::error::Result;
use crate::prometheus::query::{self, Selectors};
use crate::prometheus::{MetricsSource, RangeWindow};
use chrono::{DateTime, Local, TimeZone, Utc};
use std::time::Duration;
use tracing::debug;

const CURVE_STEP: Duration = Duration::from_secs(1800);

/// Fleet output averaged over 30 minute buckets from local midnight to now.
pub async fn todays_generation<S>(source: &S, config: &Config) -> Result<GenerationCurve>
where
    S: MetricsSource + ?Sized,
{
    let now = Local::now();
    let midnight = local_midnight(&now);
    generation_between(source, config, midnight, now.with_timezone(&Utc)).await
}

/// An empty result is a valid curve: nothing has been generated yet.
pub async fn generation_between<S>(
    source: &S,
    config: &Config,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<GenerationCurve>
where
    S: MetricsSource + ?Sized,
{
    let sel = Selectors::new(&config.metrics);
    let expr = query::sum(&query::avg_over_time(&sel.power(None), "30m"));
    let window = RangeWindow {
        start,
        end,
        step: CURVE_STEP,
    };

    let rows = source.query_range(&expr, &window).await?;
    match rows.first() {
        Some(series) => Ok(GenerationCurve {
            values: series.samples(),
        }),
        None => {
            debug!(query = %expr, "no generation data yet today");
            Ok(GenerationCurve::default())
        }
    }
}

/// Start of the current local day, in UTC. Falls back to `now` on a day
/// where local midnight does not exist.
fn local_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| now.timezone().from_local_datetime(&naive).earliest())
        .map(|midnight| midnight.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}
