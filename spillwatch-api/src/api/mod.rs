//! HTTP API handlers for spillwatch-api

pub mod collaborators;
pub mod error;
pub mod health;
pub mod info;
pub mod snapshot;
pub mod stream;

pub use collaborators::{predict, send_alert};
pub use error::ApiError;
pub use health::health_routes;
pub use info::service_info;
pub use snapshot::ais_snapshot;
pub use stream::ais_stream;
