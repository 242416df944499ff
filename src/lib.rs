pub mod aggregation;
pub mod api;
pub mod config;
pub mod error;
pub mod prometheus;
pub mod stream;

#[cfg(test)]
mod testing;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{AppError, Result};
pub use prometheus::{MetricsSource, PrometheusClient};
