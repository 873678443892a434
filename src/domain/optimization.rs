//! Request and response records of the tour optimization service
//! (`OptimizeToursRequest` / `OptimizeToursResponse`).
//!
//! Only the fields the orchestration reads or writes are typed; everything
//! else in a model file is kept in `extra` and sent back unchanged.

use crate::domain::proto_json::{duration_opt, int64};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchMode {
    SearchModeUnspecified,
    ReturnFast,
    ConsumeAllAvailableTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeToursRequest {
    /// Carried in the request path, never in the body.
    #[serde(default, skip_serializing)]
    pub parent: String,
    #[serde(
        default,
        with = "duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub model: ShipmentModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_mode: Option<SearchMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub injected_first_solution_routes: Vec<ShipmentRoute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentModel {
    #[serde(default)]
    pub shipments: Vec<Shipment>,
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_end_time: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pickups: Vec<VisitRequest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deliveries: Vec<VisitRequest>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub load_demands: BTreeMap<String, Load>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_location: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_waypoint: Option<Waypoint>,
    #[serde(
        default,
        with = "duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Duration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_windows: Vec<TimeWindow>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VisitRequest {
    /// Arrival point, whether given directly or through a waypoint.
    pub fn arrival_point(&self) -> Option<LatLng> {
        self.arrival_location.or_else(|| {
            self.arrival_waypoint
                .as_ref()
                .and_then(Waypoint::lat_lng)
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<WaypointLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Waypoint {
    pub fn lat_lng(&self) -> Option<LatLng> {
        self.location.as_ref().and_then(|location| location.lat_lng)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaypointLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat_lng: Option<LatLng>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Load {
    #[serde(default, with = "int64")]
    pub amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_location: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_waypoint: Option<Waypoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_location: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_waypoint: Option<Waypoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Vehicle {
    pub fn start_point(&self) -> Option<LatLng> {
        self.start_location
            .or_else(|| self.start_waypoint.as_ref().and_then(Waypoint::lat_lng))
    }

    pub fn end_point(&self) -> Option<LatLng> {
        self.end_location
            .or_else(|| self.end_waypoint.as_ref().and_then(Waypoint::lat_lng))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeToursResponse {
    #[serde(default)]
    pub routes: Vec<ShipmentRoute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_shipments: Vec<SkippedShipment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<AggregatedMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_label: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OptimizeToursResponse {
    pub fn used_vehicle_count(&self) -> i32 {
        self.metrics
            .as_ref()
            .map(|m| m.used_vehicle_count)
            .unwrap_or(0)
    }

    pub fn skipped_mandatory_shipment_count(&self) -> i32 {
        self.metrics
            .as_ref()
            .map(|m| m.skipped_mandatory_shipment_count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    #[serde(default)]
    pub used_vehicle_count: i32,
    #[serde(default)]
    pub skipped_mandatory_shipment_count: i32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedShipment {
    #[serde(default)]
    pub index: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRoute {
    /// Zero is omitted on the wire, hence the default.
    #[serde(default)]
    pub vehicle_index: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vehicle_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visits: Vec<Visit>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    #[serde(default)]
    pub shipment_index: usize,
    #[serde(default)]
    pub is_pickup: bool,
    #[serde(default)]
    pub visit_request_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub detour: Option<Duration>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shipment_label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub visit_label: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
