use crate::adapters::http::ApiClient;
use crate::domain::ports::DeliveryService;
use crate::domain::tracking::{DeliveryVehicle, Task};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::Method;

pub const FLEET_ENGINE_ENDPOINT: &str = "https://fleetengine.googleapis.com";

/// Deliveries API of the fleet-tracking service for one provider.
pub struct DeliveryServiceClient {
    api: ApiClient,
    provider_id: String,
}

impl DeliveryServiceClient {
    pub fn new(api: ApiClient, provider_id: impl Into<String>) -> Result<Self> {
        let provider_id = provider_id.into();
        if provider_id.trim().is_empty() {
            return Err(SyncError::MissingConfigError {
                field: "fleet_engine.provider_id".to_string(),
            });
        }
        Ok(Self { api, provider_id })
    }

    fn provider_path<'a>(&'a self, rest: &[&'a str]) -> Vec<&'a str> {
        let mut segments = vec!["v1", "providers", self.provider_id.as_str()];
        segments.extend_from_slice(rest);
        segments
    }

    /// 資源名稱 `providers/{p}/{collection}/{id}` 轉成路徑段，id 維持單一段
    fn resource_path<'a>(&'a self, name: &'a str, collection: &'a str) -> Vec<&'a str> {
        let id = name
            .strip_prefix("providers/")
            .and_then(|rest| rest.strip_prefix(self.provider_id.as_str()))
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| rest.strip_prefix(collection))
            .and_then(|rest| rest.strip_prefix('/'));
        match id {
            Some(id) => self.provider_path(&[collection, id]),
            None => std::iter::once("v1").chain(name.split('/')).collect(),
        }
    }
}

#[async_trait]
impl DeliveryService for DeliveryServiceClient {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    async fn create_delivery_vehicle(
        &self,
        vehicle_id: &str,
        vehicle: &DeliveryVehicle,
    ) -> Result<DeliveryVehicle> {
        self.api
            .send_json(
                Method::POST,
                &self.provider_path(&["deliveryVehicles"]),
                &[("deliveryVehicleId", vehicle_id)],
                Some(vehicle),
            )
            .await
    }

    async fn get_delivery_vehicle(&self, vehicle_id: &str) -> Result<Option<DeliveryVehicle>> {
        let path = self.provider_path(&["deliveryVehicles", vehicle_id]);
        match self
            .api
            .send_json::<(), DeliveryVehicle>(Method::GET, &path, &[], None)
            .await
        {
            Ok(vehicle) => Ok(Some(vehicle)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update_delivery_vehicle(
        &self,
        vehicle: &DeliveryVehicle,
        update_mask: &str,
    ) -> Result<DeliveryVehicle> {
        if vehicle.name.is_empty() {
            return Err(SyncError::ModelError {
                message: "delivery vehicle update needs the full vehicle name".to_string(),
            });
        }
        let path = self.resource_path(&vehicle.name, "deliveryVehicles");
        self.api
            .send_json(Method::PATCH, &path, &[("updateMask", update_mask)], Some(vehicle))
            .await
    }

    async fn create_task(&self, task_id: &str, task: &Task) -> Result<Task> {
        self.api
            .send_json(
                Method::POST,
                &self.provider_path(&["tasks"]),
                &[("taskId", task_id)],
                Some(task),
            )
            .await
    }

    async fn get_task(&self, task_name: &str) -> Result<Task> {
        let path = self.resource_path(task_name, "tasks");
        self.api
            .send_json::<(), Task>(Method::GET, &path, &[], None)
            .await
    }
}
