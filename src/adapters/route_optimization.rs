use crate::adapters::http::ApiClient;
use crate::domain::optimization::{OptimizeToursRequest, OptimizeToursResponse};
use crate::domain::ports::RouteOptimizer;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::Method;

pub const ROUTE_OPTIMIZATION_ENDPOINT: &str = "https://routeoptimization.googleapis.com";

pub struct RouteOptimizationClient {
    api: ApiClient,
}

impl RouteOptimizationClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RouteOptimizer for RouteOptimizationClient {
    async fn optimize_tours(&self, request: &OptimizeToursRequest) -> Result<OptimizeToursResponse> {
        if request.parent.is_empty() {
            return Err(SyncError::MissingConfigError {
                field: "parent".to_string(),
            });
        }

        tracing::info!(
            "📡 Optimizing {} shipments for {} vehicles",
            request.model.shipments.len(),
            request.model.vehicles.len()
        );

        let target = format!("{}:optimizeTours", request.parent);
        let path: Vec<&str> = std::iter::once("v1").chain(target.split('/')).collect();
        let response: OptimizeToursResponse = self
            .api
            .send_json(Method::POST, &path, &[], Some(request))
            .await?;

        // 檢查未使用車輛或略過的貨件
        tracing::info!("Used vehicle count: {}", response.used_vehicle_count());
        let skipped = response.skipped_mandatory_shipment_count();
        if skipped > 0 {
            tracing::warn!(
                "⚠️ There is a problem with your plan! {} shipment(s) skipped.",
                skipped
            );
        }

        Ok(response)
    }
}
