//! Plan-to-tracking translation.
//!
//! Every optimized route becomes an ordered list of stops: the vehicle's start,
//! one stop per visit in route order, the vehicle's end. Each stop then maps to
//! one tracker task, and each created task to one journey segment.

use crate::domain::model::{
    OptimizedPlan, PlannedStop, SkippedRoute, StopKind, TranslationOutcome, VehiclePlan,
};
use crate::domain::optimization::{LatLng, ShipmentModel, ShipmentRoute, Vehicle, Visit, VisitRequest};
use crate::domain::tracking::{
    DeliveryVehicle, DeliveryVehicleLocation, LocationInfo, NavigationStatus, Task, TaskInfo,
    TaskState, TaskType, VehicleJourneySegment, VehicleStop, VehicleStopState,
};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Where a visit's task duration comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskDurationSource {
    /// The extra time the visit adds to the route, as reported by the optimizer.
    #[default]
    Detour,
    /// The service duration of the visit request in the model.
    VisitDuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationOptions {
    pub duration_source: TaskDurationSource,
    /// Pickups are priced differently from scheduled stops; check current terms before changing.
    pub pickup_task_type: TaskType,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            duration_source: TaskDurationSource::Detour,
            pickup_task_type: TaskType::ScheduledStop,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTranslator {
    options: TranslationOptions,
}

impl RouteTranslator {
    pub fn new(options: TranslationOptions) -> Self {
        Self { options }
    }

    pub fn translate(&self, plan: &OptimizedPlan) -> TranslationOutcome {
        let model = &plan.request.model;
        let mut outcome = TranslationOutcome::default();

        for route in &plan.response.routes {
            let skip = |reason: String| SkippedRoute {
                vehicle_index: route.vehicle_index,
                vehicle_label: route.vehicle_label.clone(),
                reason,
            };

            let Some(vehicle) = model.vehicles.get(route.vehicle_index) else {
                tracing::warn!(
                    "⚠️ Route references vehicle index {} but the model has {} vehicles",
                    route.vehicle_index,
                    model.vehicles.len()
                );
                outcome
                    .skipped
                    .push(skip("vehicle index out of range".to_string()));
                continue;
            };

            if !route.vehicle_label.is_empty() && route.vehicle_label != vehicle.label {
                tracing::warn!(
                    "⚠️ Route label '{}' does not match model vehicle '{}'",
                    route.vehicle_label,
                    vehicle.label
                );
                outcome.skipped.push(skip(format!(
                    "route label does not match vehicle '{}'",
                    vehicle.label
                )));
                continue;
            }

            if route.visits.is_empty() {
                tracing::info!("There are no visits for vehicle '{}'", vehicle.label);
                outcome.skipped.push(skip("no visits".to_string()));
                continue;
            }

            match self.plan_vehicle(model, route, vehicle) {
                Ok(vehicle_plan) => outcome.plans.push(vehicle_plan),
                Err(reason) => {
                    tracing::warn!("⚠️ Skipping vehicle '{}': {}", vehicle.label, reason);
                    outcome.skipped.push(skip(reason));
                }
            }
        }

        outcome
    }

    fn plan_vehicle(
        &self,
        model: &ShipmentModel,
        route: &ShipmentRoute,
        vehicle: &Vehicle,
    ) -> Result<VehiclePlan, String> {
        let mut stops = Vec::with_capacity(route.visits.len() + 2);
        // 同一貨件的取貨與送貨共用追蹤碼
        let mut tracking_ids = HashMap::new();

        let start_location = vehicle.start_point();
        if let Some(location) = start_location {
            stops.push(depot_stop(StopKind::RouteStart, location));
        }

        for (position, visit) in route.visits.iter().enumerate() {
            let location = visit_location(model, visit).ok_or_else(|| {
                format!(
                    "no location for visit {} (shipment {}, label '{}')",
                    position, visit.shipment_index, visit.visit_label
                )
            })?;

            let kind = if visit.is_pickup {
                StopKind::Pickup
            } else {
                StopKind::Delivery
            };
            let tracking_id = Some(tracking_id_for(model, visit, &mut tracking_ids));

            stops.push(PlannedStop {
                kind,
                location,
                duration: self.visit_duration(model, visit),
                tracking_id,
                label: visit.visit_label.clone(),
            });
        }

        if let Some(location) = vehicle.end_point() {
            stops.push(depot_stop(StopKind::RouteEnd, location));
        }

        Ok(VehiclePlan {
            vehicle_index: route.vehicle_index,
            vehicle_id: vehicle_id(vehicle, route.vehicle_index),
            start_location,
            stops,
        })
    }

    fn visit_duration(&self, model: &ShipmentModel, visit: &Visit) -> Duration {
        match self.options.duration_source {
            TaskDurationSource::Detour => visit.detour.unwrap_or_default(),
            TaskDurationSource::VisitDuration => visit_request(model, visit)
                .and_then(|request| request.duration)
                .unwrap_or_default(),
        }
    }

    pub fn build_task(&self, stop: &PlannedStop) -> Task {
        let task_type = match stop.kind {
            StopKind::RouteStart | StopKind::RouteEnd => TaskType::ScheduledStop,
            StopKind::Pickup => self.options.pickup_task_type,
            StopKind::Delivery => TaskType::Delivery,
        };

        Task {
            name: String::new(),
            task_type,
            state: TaskState::Open,
            tracking_id: match task_type {
                TaskType::Delivery | TaskType::Pickup => stop.tracking_id.clone(),
                _ => None,
            },
            delivery_vehicle_id: None,
            planned_location: Some(LocationInfo::at(stop.location)),
            task_duration: Some(stop.duration),
            extra: Map::new(),
        }
    }
}

fn depot_stop(kind: StopKind, location: LatLng) -> PlannedStop {
    PlannedStop {
        kind,
        location,
        duration: Duration::ZERO,
        tracking_id: None,
        label: String::new(),
    }
}

pub fn vehicle_id(vehicle: &Vehicle, index: usize) -> String {
    if vehicle.label.trim().is_empty() {
        format!("vehicle-{}", index)
    } else {
        vehicle.label.clone()
    }
}

/// Shipments are tracked by label; an unlabelled shipment gets one fresh id per route.
fn tracking_id_for(
    model: &ShipmentModel,
    visit: &Visit,
    generated: &mut HashMap<usize, String>,
) -> String {
    if !visit.shipment_label.is_empty() {
        return visit.shipment_label.clone();
    }
    model
        .shipments
        .get(visit.shipment_index)
        .map(|shipment| shipment.label.clone())
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| {
            generated
                .entry(visit.shipment_index)
                .or_insert_with(|| Uuid::new_v4().to_string())
                .clone()
        })
}

fn visit_request<'a>(model: &'a ShipmentModel, visit: &Visit) -> Option<&'a VisitRequest> {
    let shipment = model.shipments.get(visit.shipment_index)?;
    let requests = if visit.is_pickup {
        &shipment.pickups
    } else {
        &shipment.deliveries
    };
    requests.get(visit.visit_request_index)
}

/// Arrival location of a visit, by index first and by visit label otherwise.
pub fn visit_location(model: &ShipmentModel, visit: &Visit) -> Option<LatLng> {
    visit_request(model, visit)
        .and_then(VisitRequest::arrival_point)
        .or_else(|| location_by_label(model, &visit.visit_label))
}

/// First shipment whose first delivery, then first pickup, carries `label`.
pub fn location_by_label(model: &ShipmentModel, label: &str) -> Option<LatLng> {
    if label.is_empty() {
        return None;
    }

    model.shipments.iter().find_map(|shipment| {
        [shipment.deliveries.first(), shipment.pickups.first()]
            .into_iter()
            .flatten()
            .find(|request| request.label == label)
            .and_then(VisitRequest::arrival_point)
    })
}

pub fn strip_full_path_from_id(full_path: &str) -> &str {
    match full_path.rfind('/') {
        Some(position) => &full_path[position + 1..],
        None => full_path,
    }
}

/// One segment per task, in task order.
pub fn journey_segments(tasks: &[Task]) -> Vec<VehicleJourneySegment> {
    tasks
        .iter()
        .map(|task| VehicleJourneySegment {
            stop: Some(VehicleStop {
                planned_location: task.planned_location,
                tasks: vec![TaskInfo {
                    task_id: strip_full_path_from_id(&task.name).to_string(),
                    task_duration: Some(task.task_duration.unwrap_or_default()),
                }],
                state: VehicleStopState::New,
            }),
            extra: Map::new(),
        })
        .collect()
}

pub fn delivery_vehicle_name(provider_id: &str, vehicle_id: &str) -> String {
    format!("providers/{}/deliveryVehicles/{}", provider_id, vehicle_id)
}

pub fn new_delivery_vehicle(
    provider_id: &str,
    vehicle_id: &str,
    last_location: Option<LatLng>,
) -> DeliveryVehicle {
    DeliveryVehicle {
        name: delivery_vehicle_name(provider_id, vehicle_id),
        last_location: last_location.map(|location| DeliveryVehicleLocation {
            location: Some(location),
            update_time: None,
            extra: Map::new(),
        }),
        navigation_status: Some(NavigationStatus::UnknownNavigationStatus),
        remaining_vehicle_journey_segments: Vec::new(),
        extra: Map::new(),
    }
}
