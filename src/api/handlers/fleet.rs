use crate::aggregation::{FleetAggregator, FleetSnapshot};
use crate::api::AppState;
use crate::error::Result;
use axum::{extract::State, response::Json};

pub async fn get_snapshot(State(state): State<AppState>) -> Result<Json<FleetSnapshot>> {
    let snapshot = FleetAggregator::new(state.source.as_ref(), &state.config)
        .snapshot()
        .await?;
    Ok(Json(snapshot))
}
