use super::PlanningServices;
use crate::core::sequence::PlanContext;
use crate::core::translator::vehicle_id;
use crate::domain::model::{OptimizedPlan, PublishReport, TranslationOutcome};
use crate::domain::optimization::{LatLng, ShipmentModel, SearchMode};
use crate::domain::ports::{ContextualPipeline, DeliveryService, RouteOptimizer, Storage};
use crate::utils::error::Result;
use std::sync::Arc;

/// Use case 2: re-optimize the previous plan, seeding the solver with its routes.
pub struct ReoptimizationPipeline<S: Storage, O: RouteOptimizer, D: DeliveryService> {
    services: Arc<PlanningServices<S, O, D>>,
    relocate_to: Option<LatLng>,
}

impl<S: Storage, O: RouteOptimizer, D: DeliveryService> ReoptimizationPipeline<S, O, D> {
    pub fn new(services: Arc<PlanningServices<S, O, D>>, relocate_to: Option<LatLng>) -> Self {
        Self {
            services,
            relocate_to,
        }
    }

    /// 將追蹤服務中已存在的車輛移到新位置，並同步更新模型的出發點
    async fn relocate_vehicles(&self, model: &mut ShipmentModel, location: LatLng) -> Result<()> {
        for (index, vehicle) in model.vehicles.iter_mut().enumerate() {
            let id = vehicle_id(vehicle, index);
            if self
                .services
                .publisher
                .relocate_vehicle(&id, location)
                .await?
                .is_some()
            {
                vehicle.start_location = Some(location);
                vehicle.start_waypoint = None;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S, O, D> ContextualPipeline for ReoptimizationPipeline<S, O, D>
where
    S: Storage + 'static,
    O: RouteOptimizer + 'static,
    D: DeliveryService + 'static,
{
    async fn extract_with_context(&self, context: &PlanContext) -> Result<OptimizedPlan> {
        let previous = context.require_previous_plan(self.get_name())?;
        let mut model = previous.request.model.clone();

        if let Some(location) = self.relocate_to {
            self.relocate_vehicles(&mut model, location).await?;
        }

        let mut request = self.services.fresh_request(model);
        request.search_mode = Some(SearchMode::ConsumeAllAvailableTime);
        request.injected_first_solution_routes = previous.response.routes.clone();

        tracing::info!(
            "🔁 Re-optimize request with {} injected routes",
            request.injected_first_solution_routes.len()
        );
        self.services.optimize(request).await
    }

    async fn transform_with_context(&self, plan: &OptimizedPlan) -> Result<TranslationOutcome> {
        Ok(self.services.translate(plan))
    }

    async fn load_with_context(&self, outcome: &TranslationOutcome) -> Result<PublishReport> {
        Ok(self.services.publish(outcome).await)
    }

    fn get_name(&self) -> &str {
        "reoptimize"
    }
}
