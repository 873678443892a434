use super::PlanningServices;
use crate::config::NewShipmentConfig;
use crate::core::sequence::PlanContext;
use crate::domain::model::{OptimizedPlan, PublishReport, TranslationOutcome};
use crate::domain::optimization::{Load, Shipment, TimeWindow, VisitRequest};
use crate::domain::ports::{ContextualPipeline, DeliveryService, RouteOptimizer, Storage};
use crate::utils::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const WEIGHT_LOAD: &str = "Weight";

/// Use case 3: add one shipment to the previous model and plan again.
pub struct NewStopPipeline<S: Storage, O: RouteOptimizer, D: DeliveryService> {
    services: Arc<PlanningServices<S, O, D>>,
    shipment: NewShipmentConfig,
}

impl<S: Storage, O: RouteOptimizer, D: DeliveryService> NewStopPipeline<S, O, D> {
    pub fn new(services: Arc<PlanningServices<S, O, D>>, shipment: NewShipmentConfig) -> Self {
        Self { services, shipment }
    }
}

fn epoch(field: &str, seconds: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| SyncError::ModelError {
        message: format!("{} {} is not a valid timestamp", field, seconds),
    })
}

fn window(field: &str, bounds: [i64; 2]) -> Result<TimeWindow> {
    Ok(TimeWindow {
        start_time: Some(epoch(field, bounds[0])?),
        end_time: Some(epoch(field, bounds[1])?),
        ..TimeWindow::default()
    })
}

/// One pickup, one delivery, each with a single time window, and a `Weight` demand.
pub fn build_new_shipment(config: &NewShipmentConfig) -> Result<Shipment> {
    let pickup = VisitRequest {
        arrival_location: Some(config.pickup),
        duration: Some(Duration::from_secs(config.pickup_duration_seconds)),
        time_windows: vec![window("pickup_window", config.pickup_window)?],
        ..VisitRequest::default()
    };
    let delivery = VisitRequest {
        arrival_location: Some(config.delivery),
        duration: Some(Duration::from_secs(config.delivery_duration_seconds)),
        time_windows: vec![window("delivery_window", config.delivery_window)?],
        ..VisitRequest::default()
    };

    let mut load_demands = BTreeMap::new();
    load_demands.insert(
        WEIGHT_LOAD.to_string(),
        Load {
            amount: config.weight,
        },
    );

    Ok(Shipment {
        pickups: vec![pickup],
        deliveries: vec![delivery],
        load_demands,
        label: config.label.clone(),
        ..Shipment::default()
    })
}

#[async_trait::async_trait]
impl<S, O, D> ContextualPipeline for NewStopPipeline<S, O, D>
where
    S: Storage + 'static,
    O: RouteOptimizer + 'static,
    D: DeliveryService + 'static,
{
    async fn extract_with_context(&self, context: &PlanContext) -> Result<OptimizedPlan> {
        let previous = context.require_previous_plan(self.get_name())?;
        let mut model = previous.request.model.clone();
        model.shipments.push(build_new_shipment(&self.shipment)?);

        tracing::info!(
            "➕ Creating new plan with added shipment ({} shipments)",
            model.shipments.len()
        );
        let request = self.services.fresh_request(model);
        self.services.optimize(request).await
    }

    async fn transform_with_context(&self, plan: &OptimizedPlan) -> Result<TranslationOutcome> {
        Ok(self.services.translate(plan))
    }

    async fn load_with_context(&self, outcome: &TranslationOutcome) -> Result<PublishReport> {
        Ok(self.services.publish(outcome).await)
    }

    fn get_name(&self) -> &str {
        "new_stop"
    }
}
