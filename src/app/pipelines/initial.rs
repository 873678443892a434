use super::PlanningServices;
use crate::core::sequence::PlanContext;
use crate::domain::model::{OptimizedPlan, PublishReport, TranslationOutcome};
use crate::domain::ports::{ContextualPipeline, DeliveryService, RouteOptimizer, Storage};
use crate::utils::error::Result;
use std::sync::Arc;

/// Use case 1: optimize the model file as is and publish the routes.
pub struct InitialPlanningPipeline<S: Storage, O: RouteOptimizer, D: DeliveryService> {
    services: Arc<PlanningServices<S, O, D>>,
    model_path: String,
}

impl<S: Storage, O: RouteOptimizer, D: DeliveryService> InitialPlanningPipeline<S, O, D> {
    pub fn new(services: Arc<PlanningServices<S, O, D>>, model_path: impl Into<String>) -> Self {
        Self {
            services,
            model_path: model_path.into(),
        }
    }
}

#[async_trait::async_trait]
impl<S, O, D> ContextualPipeline for InitialPlanningPipeline<S, O, D>
where
    S: Storage + 'static,
    O: RouteOptimizer + 'static,
    D: DeliveryService + 'static,
{
    async fn extract_with_context(&self, _context: &PlanContext) -> Result<OptimizedPlan> {
        let request = self.services.load_request(&self.model_path).await?;
        tracing::info!("🚀 Requesting initial plan for {}", self.model_path);
        self.services.optimize(request).await
    }

    async fn transform_with_context(&self, plan: &OptimizedPlan) -> Result<TranslationOutcome> {
        Ok(self.services.translate(plan))
    }

    async fn load_with_context(&self, outcome: &TranslationOutcome) -> Result<PublishReport> {
        Ok(self.services.publish(outcome).await)
    }

    fn get_name(&self) -> &str {
        "initial"
    }
}
