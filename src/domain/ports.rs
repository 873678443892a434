use crate::domain::model::{OptimizedPlan, PublishReport, TranslationOutcome};
use crate::domain::optimization::{OptimizeToursRequest, OptimizeToursResponse};
use crate::domain::tracking::{DeliveryVehicle, Task};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}

#[async_trait]
pub trait RouteOptimizer: Send + Sync {
    async fn optimize_tours(&self, request: &OptimizeToursRequest) -> Result<OptimizeToursResponse>;
}

/// Delivery side of the fleet-tracking service, scoped to one provider.
#[async_trait]
pub trait DeliveryService: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn create_delivery_vehicle(
        &self,
        vehicle_id: &str,
        vehicle: &DeliveryVehicle,
    ) -> Result<DeliveryVehicle>;

    /// `Ok(None)` when the vehicle does not exist.
    async fn get_delivery_vehicle(&self, vehicle_id: &str) -> Result<Option<DeliveryVehicle>>;

    /// `vehicle.name` selects the vehicle; only fields named in `update_mask` change.
    async fn update_delivery_vehicle(
        &self,
        vehicle: &DeliveryVehicle,
        update_mask: &str,
    ) -> Result<DeliveryVehicle>;

    async fn create_task(&self, task_id: &str, task: &Task) -> Result<Task>;

    async fn get_task(&self, task_name: &str) -> Result<Task>;
}

/// 帶上下文的規劃階段：extract 取得最佳化結果，transform 轉換為追蹤資料，load 發佈
#[async_trait]
pub trait ContextualPipeline: Send + Sync {
    async fn extract_with_context(&self, context: &crate::core::sequence::PlanContext) -> Result<OptimizedPlan>;
    async fn transform_with_context(&self, plan: &OptimizedPlan) -> Result<TranslationOutcome>;
    async fn load_with_context(&self, outcome: &TranslationOutcome) -> Result<PublishReport>;

    fn get_name(&self) -> &str;
}
