use crate::core::translator::{
    delivery_vehicle_name, journey_segments, new_delivery_vehicle, RouteTranslator,
};
use crate::domain::model::{PublishReport, VehicleOutcome, VehiclePlan};
use crate::domain::optimization::LatLng;
use crate::domain::ports::DeliveryService;
use crate::domain::tracking::{
    DeliveryVehicle, DeliveryVehicleLocation, NavigationStatus, Task, LAST_LOCATION_MASK,
    REMAINING_SEGMENTS_MASK,
};
use crate::utils::error::Result;
use serde_json::Map;
use uuid::Uuid;

pub type IdGenerator = Box<dyn Fn() -> String + Send + Sync>;

/// 將車輛計畫發佈到追蹤服務：建立車輛、建立任務、附加行程區段
pub struct TrackingPublisher<D: DeliveryService> {
    service: D,
    translator: RouteTranslator,
    next_task_id: IdGenerator,
    verify_tasks: bool,
}

impl<D: DeliveryService> TrackingPublisher<D> {
    pub fn new(service: D, translator: RouteTranslator) -> Self {
        Self {
            service,
            translator,
            next_task_id: Box::new(|| Uuid::new_v4().to_string()),
            verify_tasks: false,
        }
    }

    pub fn with_id_generator(mut self, generator: IdGenerator) -> Self {
        self.next_task_id = generator;
        self
    }

    /// Re-read every created task (debug aid).
    pub fn with_task_verification(mut self, enabled: bool) -> Self {
        self.verify_tasks = enabled;
        self
    }

    pub fn service(&self) -> &D {
        &self.service
    }

    pub fn translator(&self) -> &RouteTranslator {
        &self.translator
    }

    /// Publishes every plan; a failing vehicle is recorded and the next one still runs.
    pub async fn publish(&self, plans: &[VehiclePlan]) -> PublishReport {
        let mut report = PublishReport::default();

        for plan in plans {
            let outcome = match self.publish_vehicle(plan).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("❌ Creating route for vehicle '{}' failed: {}", plan.vehicle_id, e);
                    VehicleOutcome {
                        vehicle_id: plan.vehicle_id.clone(),
                        vehicle_name: delivery_vehicle_name(self.service.provider_id(), &plan.vehicle_id),
                        error: Some(e.to_string()),
                        ..VehicleOutcome::default()
                    }
                }
            };
            report.vehicles.push(outcome);
        }

        report
    }

    async fn publish_vehicle(&self, plan: &VehiclePlan) -> Result<VehicleOutcome> {
        let vehicle = self.ensure_vehicle(plan).await?;

        let mut tasks = Vec::with_capacity(plan.stops.len());
        for stop in &plan.stops {
            let task_id = (self.next_task_id)();
            let request = self.translator.build_task(stop);
            let mut created = self.service.create_task(&task_id, &request).await?;
            if created.name.is_empty() {
                created.name = format!("providers/{}/tasks/{}", self.service.provider_id(), task_id);
            }
            tracing::debug!("📝 Task created: {} ({:?})", created.name, created.task_type);
            tasks.push(created);
        }

        if self.verify_tasks {
            self.verify(&tasks).await;
        }

        let mut outcome = VehicleOutcome {
            vehicle_id: plan.vehicle_id.clone(),
            vehicle_name: vehicle.name.clone(),
            task_names: tasks.iter().map(|task| task.name.clone()).collect(),
            segments_attached: false,
            error: None,
        };

        match self.attach_segments(vehicle, &tasks).await {
            Ok(updated) => {
                outcome.segments_attached = true;
                tracing::info!("🚚 Vehicle assigned: {}", updated.name);
            }
            Err(e) => {
                tracing::error!("❌ Adding journey segments failed: {}", e);
                outcome.error = Some(e.to_string());
            }
        }

        Ok(outcome)
    }

    /// Creates the vehicle; an existing one is reused as built locally.
    async fn ensure_vehicle(&self, plan: &VehiclePlan) -> Result<DeliveryVehicle> {
        let local = new_delivery_vehicle(
            self.service.provider_id(),
            &plan.vehicle_id,
            plan.start_location,
        );

        match self
            .service
            .create_delivery_vehicle(&plan.vehicle_id, &local)
            .await
        {
            Ok(created) => {
                tracing::info!("✅ Delivery Vehicle with name '{}' created", created.name);
                Ok(created)
            }
            Err(e) if e.is_already_exists() => {
                tracing::info!("This vehicle already exists! {}", plan.vehicle_id);
                Ok(local)
            }
            Err(e) => Err(e),
        }
    }

    async fn attach_segments(
        &self,
        mut vehicle: DeliveryVehicle,
        tasks: &[Task],
    ) -> Result<DeliveryVehicle> {
        vehicle.remaining_vehicle_journey_segments = journey_segments(tasks);
        self.service
            .update_delivery_vehicle(&vehicle, REMAINING_SEGMENTS_MASK)
            .await
    }

    async fn verify(&self, tasks: &[Task]) {
        for task in tasks {
            match self.service.get_task(&task.name).await {
                Ok(found) => tracing::info!("🔎 TASK found: {}", found.name),
                Err(e) => tracing::warn!("⚠️ Task {} could not be read back: {}", task.name, e),
            }
        }
    }

    /// Moves an existing vehicle; `Ok(None)` when the tracker does not know it.
    pub async fn relocate_vehicle(
        &self,
        vehicle_id: &str,
        location: LatLng,
    ) -> Result<Option<DeliveryVehicle>> {
        if self.service.get_delivery_vehicle(vehicle_id).await?.is_none() {
            tracing::info!("Vehicle does not exist: {}", vehicle_id);
            return Ok(None);
        }

        let vehicle = DeliveryVehicle {
            name: delivery_vehicle_name(self.service.provider_id(), vehicle_id),
            last_location: Some(DeliveryVehicleLocation {
                location: Some(location),
                update_time: Some(chrono::Utc::now()),
                extra: Map::new(),
            }),
            navigation_status: Some(NavigationStatus::UnknownNavigationStatus),
            remaining_vehicle_journey_segments: Vec::new(),
            extra: Map::new(),
        };

        let updated = self
            .service
            .update_delivery_vehicle(&vehicle, LAST_LOCATION_MASK)
            .await?;
        tracing::debug!("📍 Vehicle {} relocated", updated.name);
        Ok(Some(updated))
    }
}
