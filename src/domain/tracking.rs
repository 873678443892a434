//! Delivery vehicle and task records of the fleet-tracking service.

use crate::domain::optimization::LatLng;
use crate::domain::proto_json::duration_opt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

pub const REMAINING_SEGMENTS_MASK: &str = "remainingVehicleJourneySegments";
pub const LAST_LOCATION_MASK: &str = "lastLocation";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryVehicle {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_location: Option<DeliveryVehicleLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_status: Option<NavigationStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remaining_vehicle_journey_segments: Vec<VehicleJourneySegment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryVehicleLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavigationStatus {
    UnknownNavigationStatus,
    NoGuidance,
    EnrouteToDestination,
    OffRoute,
    ArrivedAtDestination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    TypeUnspecified,
    Pickup,
    Delivery,
    ScheduledStop,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    StateUnspecified,
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(default = "default_task_state")]
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_vehicle_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_location: Option<LocationInfo>,
    #[serde(
        default,
        with = "duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_duration: Option<Duration>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_task_state() -> TaskState {
    TaskState::StateUnspecified
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<LatLng>,
}

impl LocationInfo {
    pub fn at(point: LatLng) -> Self {
        Self { point: Some(point) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleJourneySegment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<VehicleStop>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStopState {
    StateUnspecified,
    New,
    Enroute,
    Arrived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_location: Option<LocationInfo>,
    #[serde(default)]
    pub tasks: Vec<TaskInfo>,
    pub state: VehicleStopState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    pub task_id: String,
    #[serde(
        default,
        with = "duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_duration: Option<Duration>,
}
