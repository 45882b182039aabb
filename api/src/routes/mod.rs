//! API route definitions.
//!
//! This module organizes all HTTP routes for the otelwatch query API.

mod analysis;
mod health;
mod logs;
mod metrics;
mod params;
mod services;
mod status;
mod traces;

pub use analysis::analysis_routes;
pub use health::health_routes;
pub use logs::logs_routes;
pub use metrics::metrics_routes;
pub use services::services_routes;
pub use status::status_routes;
pub use traces::traces_routes;
