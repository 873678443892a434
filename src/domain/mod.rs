// Domain layer: service records, plan models and ports (interfaces).

pub mod model;
pub mod optimization;
pub mod ports;
pub mod proto_json;
pub mod tracking;
