pub mod initial;
pub mod new_stop;
pub mod reoptimize;

pub use initial::InitialPlanningPipeline;
pub use new_stop::{build_new_shipment, NewStopPipeline};
pub use reoptimize::ReoptimizationPipeline;

use crate::core::publisher::TrackingPublisher;
use crate::domain::model::{OptimizedPlan, PublishReport, TranslationOutcome};
use crate::domain::optimization::OptimizeToursRequest;
use crate::domain::ports::{DeliveryService, RouteOptimizer, Storage};
use crate::utils::error::{Result, SyncError};
use std::time::Duration;

/// 各階段共用的服務：模型讀取、最佳化、追蹤發佈
pub struct PlanningServices<S: Storage, O: RouteOptimizer, D: DeliveryService> {
    pub storage: S,
    pub optimizer: O,
    pub publisher: TrackingPublisher<D>,
    /// `projects/<id>`
    pub parent: String,
    pub solve_timeout: Duration,
}

impl<S: Storage, O: RouteOptimizer, D: DeliveryService> PlanningServices<S, O, D> {
    /// Reads a model file and fills in `parent` and `timeout` when it leaves them out.
    pub async fn load_request(&self, model_path: &str) -> Result<OptimizeToursRequest> {
        let mut request = load_model(&self.storage, model_path).await?;
        if request.parent.is_empty() {
            request.parent = self.parent.clone();
        }
        if request.timeout.is_none() {
            request.timeout = Some(self.solve_timeout);
        }
        Ok(request)
    }

    /// A request built from scratch for `model`, as every follow-up stage sends it.
    pub fn fresh_request(&self, model: crate::domain::optimization::ShipmentModel) -> OptimizeToursRequest {
        OptimizeToursRequest {
            parent: self.parent.clone(),
            timeout: Some(self.solve_timeout),
            model,
            ..OptimizeToursRequest::default()
        }
    }

    pub async fn optimize(&self, request: OptimizeToursRequest) -> Result<OptimizedPlan> {
        let response = self.optimizer.optimize_tours(&request).await?;
        Ok(OptimizedPlan { request, response })
    }

    pub fn translate(&self, plan: &OptimizedPlan) -> TranslationOutcome {
        let outcome = self.publisher.translator().translate(plan);
        for skipped in &outcome.skipped {
            tracing::info!(
                "⏭️ Route of vehicle {} ('{}') not published: {}",
                skipped.vehicle_index,
                skipped.vehicle_label,
                skipped.reason
            );
        }
        outcome
    }

    pub async fn publish(&self, outcome: &TranslationOutcome) -> PublishReport {
        self.publisher.publish(&outcome.plans).await
    }
}

/// Parses a JSON model file (an `OptimizeToursRequest`).
pub async fn load_model<S: Storage>(storage: &S, model_path: &str) -> Result<OptimizeToursRequest> {
    let data = storage.read_file(model_path).await?;
    let request: OptimizeToursRequest =
        serde_json::from_slice(&data).map_err(|e| SyncError::ModelError {
            message: format!("'{}' is not a valid OptimizeToursRequest: {}", model_path, e),
        })?;

    tracing::debug!(
        "📥 Model {} loaded: {} shipments, {} vehicles",
        model_path,
        request.model.shipments.len(),
        request.model.vehicles.len()
    );
    Ok(request)
}
