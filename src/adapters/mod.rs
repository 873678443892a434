// Adapters layer: concrete clients for the external services (auth, http, optimizer, tracker)

pub mod auth;
pub mod fleet_engine;
pub mod http;
pub mod route_optimization;

pub use auth::{ServiceAccountKey, ServiceAccountTokenMinter, StaticTokenProvider};
pub use fleet_engine::DeliveryServiceClient;
pub use http::ApiClient;
pub use route_optimization::RouteOptimizationClient;
