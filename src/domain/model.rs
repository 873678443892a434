use crate::domain::optimization::{LatLng, OptimizeToursRequest, OptimizeToursResponse};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One optimizer round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedPlan {
    pub request: OptimizeToursRequest,
    pub response: OptimizeToursResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    RouteStart,
    Pickup,
    Delivery,
    RouteEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStop {
    pub kind: StopKind,
    pub location: LatLng,
    pub duration: Duration,
    /// Set for pickups and deliveries; dropped when the pickup becomes a scheduled stop.
    pub tracking_id: Option<String>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehiclePlan {
    pub vehicle_index: usize,
    pub vehicle_id: String,
    pub start_location: Option<LatLng>,
    pub stops: Vec<PlannedStop>,
}

impl VehiclePlan {
    pub fn visit_count(&self) -> usize {
        self.stops
            .iter()
            .filter(|stop| matches!(stop.kind, StopKind::Pickup | StopKind::Delivery))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRoute {
    pub vehicle_index: usize,
    pub vehicle_label: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationOutcome {
    pub plans: Vec<VehiclePlan>,
    pub skipped: Vec<SkippedRoute>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VehicleOutcome {
    pub vehicle_id: String,
    pub vehicle_name: String,
    pub task_names: Vec<String>,
    pub segments_attached: bool,
    pub error: Option<String>,
}

impl VehicleOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.segments_attached
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub vehicles: Vec<VehicleOutcome>,
}

impl PublishReport {
    pub fn task_count(&self) -> usize {
        self.vehicles.iter().map(|v| v.task_names.len()).sum()
    }

    pub fn failed_vehicles(&self) -> usize {
        self.vehicles.iter().filter(|v| !v.is_success()).count()
    }
}
