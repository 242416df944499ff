use crate::aggregation::{todays_generation, GenerationCurve, PeriodAssembler};
use crate::api::AppState;
use crate::error::{AppError, Result};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

static SITE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_+-]+$").expect("site name pattern is valid")
});

/// Site name that selects every site instead of one.
const ALL_SITES: &str = "all";

pub fn is_valid_site_name(name: &str) -> bool {
    SITE_NAME.is_match(name)
}

/// `GET /site/{site}/{period}`: one site's figures over `period` days, or a
/// list for every site when `site` is `all`.
pub async fn get_site_period(
    State(state): State<AppState>,
    Path((site, period)): Path<(String, String)>,
) -> Result<Response> {
    if !is_valid_site_name(&site) {
        warn!(site = %site, "rejected site name");
        return Err(AppError::InvalidInput("bad route".to_string()));
    }

    let days: i64 = period.parse().map_err(|_| {
        warn!(period = %period, "rejected period");
        AppError::InvalidInput("bad period".to_string())
    })?;

    let assembler = PeriodAssembler::new(state.source.as_ref(), &state.config);
    if site == ALL_SITES {
        Ok(Json(assembler.all(days).await?).into_response())
    } else {
        Ok(Json(assembler.site(&site, days).await?).into_response())
    }
}

/// `GET /site/all`: today's fleet generation curve.
pub async fn get_today(State(state): State<AppState>) -> Result<Json<GenerationCurve>> {
    let curve = todays_generation(state.source.as_ref(), &state.config).await?;
    Ok(Json(curve))
}
