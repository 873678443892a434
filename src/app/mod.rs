pub mod pipelines;

use crate::adapters::auth::{
    ServiceAccountKey, ServiceAccountTokenMinter, StaticTokenProvider, FLEET_ENGINE_AUDIENCE,
    ROUTE_OPTIMIZATION_AUDIENCE,
};
use crate::adapters::{ApiClient, DeliveryServiceClient, RouteOptimizationClient};
use crate::config::{AppConfig, AuthMethod, LocalStorage, ScenarioConfig, ScenarioKind};
use crate::core::engine::Scenario;
use crate::core::publisher::TrackingPublisher;
use crate::core::sequence::PipelineSequence;
use crate::core::translator::RouteTranslator;
use crate::domain::ports::{DeliveryService, RouteOptimizer, Storage, TokenProvider};
use crate::utils::error::{Result, SyncError};
use pipelines::{InitialPlanningPipeline, NewStopPipeline, PlanningServices, ReoptimizationPipeline};
use std::sync::Arc;
use std::time::Duration;

pub type CloudServices = PlanningServices<LocalStorage, RouteOptimizationClient, DeliveryServiceClient>;

fn token_provider(
    config: &AppConfig,
    static_token: Option<&str>,
    static_field: &str,
    audience: &str,
) -> Result<Arc<dyn TokenProvider>> {
    match config.auth.method {
        AuthMethod::Static => {
            let token = static_token.ok_or_else(|| SyncError::MissingConfigError {
                field: static_field.to_string(),
            })?;
            Ok(Arc::new(StaticTokenProvider::new(token)?))
        }
        AuthMethod::ServiceAccount => {
            let path = config
                .auth
                .service_account_key
                .as_deref()
                .ok_or_else(|| SyncError::MissingConfigError {
                    field: "auth.service_account_key".to_string(),
                })?;
            let key = ServiceAccountKey::from_file(path)?;
            Ok(Arc::new(ServiceAccountTokenMinter::new(
                key,
                audience,
                config.auth.token_lifetime_seconds,
            )?))
        }
    }
}

/// Builds the REST clients and the shared stage services from the configuration.
pub fn build_services(config: &AppConfig) -> Result<Arc<CloudServices>> {
    let optimization_tokens = token_provider(
        config,
        config.auth.optimization_token.as_deref(),
        "auth.optimization_token",
        ROUTE_OPTIMIZATION_AUDIENCE,
    )?;
    let fleet_tokens = token_provider(
        config,
        config.auth.fleet_engine_token.as_deref(),
        "auth.fleet_engine_token",
        FLEET_ENGINE_AUDIENCE,
    )?;

    let optimizer = RouteOptimizationClient::new(ApiClient::new(
        "Route Optimization",
        &config.optimization.endpoint,
        optimization_tokens,
        Duration::from_secs(config.optimization.request_timeout_seconds),
    )?);
    let fleet = DeliveryServiceClient::new(
        ApiClient::new(
            "Fleet Engine",
            &config.fleet_engine.endpoint,
            fleet_tokens,
            Duration::from_secs(config.fleet_engine.request_timeout_seconds),
        )?,
        config.project.provider_id.clone(),
    )?;

    let publisher = TrackingPublisher::new(fleet, RouteTranslator::new(config.translation_options()))
        .with_task_verification(config.fleet_engine.verify_tasks);

    Ok(Arc::new(PlanningServices {
        storage: LocalStorage::new(config.project.model_directory.clone()),
        optimizer,
        publisher,
        parent: config.parent(),
        solve_timeout: config.solve_timeout(),
    }))
}

/// 依情境種類組出階段序列：UC1 [initial]、UC2 [initial, reoptimize]、UC3 [initial, new_stop]
pub fn build_scenario<S, O, D>(services: &Arc<PlanningServices<S, O, D>>, scenario: &ScenarioConfig) -> Scenario
where
    S: Storage + 'static,
    O: RouteOptimizer + 'static,
    D: DeliveryService + 'static,
{
    let mut sequence = PipelineSequence::new(format!("{}-{}", scenario.name, uuid::Uuid::new_v4()));
    sequence.add_pipeline(Box::new(InitialPlanningPipeline::new(
        services.clone(),
        scenario.model.clone(),
    )));

    match scenario.kind {
        ScenarioKind::InitialPlanning => {}
        ScenarioKind::Reoptimization => {
            sequence.add_pipeline(Box::new(ReoptimizationPipeline::new(
                services.clone(),
                scenario.relocate_vehicles_to,
            )));
        }
        ScenarioKind::NewStop => {
            sequence.add_pipeline(Box::new(NewStopPipeline::new(
                services.clone(),
                scenario.new_shipment.clone().unwrap_or_default(),
            )));
        }
    }

    Scenario {
        name: scenario.name.clone(),
        sequence,
    }
}

pub fn build_scenarios<S, O, D>(
    services: &Arc<PlanningServices<S, O, D>>,
    scenarios: &[&ScenarioConfig],
) -> Vec<Scenario>
where
    S: Storage + 'static,
    O: RouteOptimizer + 'static,
    D: DeliveryService + 'static,
{
    scenarios
        .iter()
        .map(|scenario| build_scenario(services, scenario))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipelines::test_support::*;

    fn scenario(kind: ScenarioKind) -> ScenarioConfig {
        ScenarioConfig {
            name: format!("{:?}", kind),
            kind,
            model: "uc.json".to_string(),
            enabled: true,
            relocate_vehicles_to: None,
            new_shipment: None,
        }
    }

    #[test]
    fn test_scenario_stage_layout() {
        let services = services(RecordingOptimizer::default(), AcceptingDeliveryService::default());

        let initial = build_scenario(&services, &scenario(ScenarioKind::InitialPlanning));
        let reoptimize = build_scenario(&services, &scenario(ScenarioKind::Reoptimization));
        let new_stop = build_scenario(&services, &scenario(ScenarioKind::NewStop));

        assert_eq!(initial.sequence.len(), 1);
        assert_eq!(reoptimize.sequence.len(), 2);
        assert_eq!(new_stop.sequence.len(), 2);
        assert!(new_stop.sequence.execution_id().starts_with("NewStop-"));
    }

    #[test]
    fn test_static_auth_builds_services() {
        let config = AppConfig::from_toml_str(
            r#"
[project]
provider_id = "demo-provider"

[auth]
method = "static"
optimization_token = "ro-token"
fleet_engine_token = "fe-token"

[[scenarios]]
name = "UC1"
kind = "initial_planning"
model = "uc.json"
"#,
        )
        .unwrap();

        let services = build_services(&config).unwrap();
        assert_eq!(services.parent, "projects/demo-provider");
        assert_eq!(services.publisher.service().provider_id(), "demo-provider");
    }

    #[test]
    fn test_missing_service_account_key_file() {
        let config = AppConfig::from_toml_str(
            r#"
[project]
provider_id = "demo-provider"

[auth]
method = "service_account"
service_account_key = "/nonexistent/key.json"
"#,
        )
        .unwrap();

        assert!(matches!(build_services(&config), Err(SyncError::IoError(_))));
    }
}
