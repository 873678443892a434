use httpmock::prelude::*;
use route_fleet_sync::app::{build_scenarios, build_services};
use route_fleet_sync::utils::validation::Validate;
use route_fleet_sync::{AppConfig, LocalStorage, PlanningEngine};
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

const PROVIDER: &str = "demo-provider";

fn model(label: &str) -> serde_json::Value {
    json!({
        "label": label,
        "model": {
            "shipments": [
                {
                    "label": "hki-parcel-001",
                    "pickups": [{"arrivalLocation": {"latitude": 60.168992, "longitude": 24.932366}, "duration": "120s"}],
                    "deliveries": [{"arrivalLocation": {"latitude": 60.184213, "longitude": 24.950624}, "duration": "180s"}]
                },
                {
                    "label": "hki-parcel-002",
                    "deliveries": [{"arrivalLocation": {"latitude": 60.176316, "longitude": 24.921544}, "duration": "150s"}]
                }
            ],
            "vehicles": [
                {
                    "label": "hki-van-1",
                    "startLocation": {"latitude": 60.171253, "longitude": 24.941268},
                    "endLocation": {"latitude": 60.171253, "longitude": 24.941268}
                },
                {
                    "label": "hki-van-2",
                    "startLocation": {"latitude": 60.198862, "longitude": 24.933878}
                }
            ]
        }
    })
}

/// Vehicle 0 does every visit; vehicle 1 stays home.
fn plan_response() -> serde_json::Value {
    json!({
        "routes": [
            {
                "vehicleLabel": "hki-van-1",
                "visits": [
                    {"shipmentIndex": 0, "isPickup": true, "detour": "0s"},
                    {"shipmentIndex": 1, "detour": "95s"},
                    {"visitRequestIndex": 0, "detour": "140s"}
                ]
            },
            {"vehicleIndex": 1, "vehicleLabel": "hki-van-2"}
        ],
        "metrics": {"usedVehicleCount": 1, "skippedMandatoryShipmentCount": 0}
    })
}

fn write_model(dir: &Path, file: &str, label: &str) {
    std::fs::write(dir.join(file), serde_json::to_vec_pretty(&model(label)).unwrap()).unwrap();
}

fn config(optimizer: &MockServer, fleet: &MockServer, models: &Path, output: &Path, scenarios: &str) -> AppConfig {
    let toml_content = format!(
        r#"
[project]
provider_id = "{provider}"
model_directory = "{models}"

[optimization]
endpoint = "{optimizer}"

[fleet_engine]
endpoint = "{fleet}"

[auth]
method = "static"
optimization_token = "ro-token"
fleet_engine_token = "fe-token"

[output]
save_responses = true
directory = "{output}"

{scenarios}
"#,
        provider = PROVIDER,
        models = models.display(),
        optimizer = optimizer.base_url(),
        fleet = fleet.base_url(),
        output = output.display(),
        scenarios = scenarios,
    );

    let config = AppConfig::from_toml_str(&toml_content).unwrap();
    config.validate().unwrap();
    config
}

async fn run(config: &AppConfig) -> route_fleet_sync::core::engine::RunSummary {
    let services = build_services(config).unwrap();
    let scenarios = config.selected_scenarios(&[]).unwrap();
    PlanningEngine::new(build_scenarios(&services, &scenarios))
        .with_response_storage(LocalStorage::new(config.output.directory.clone()))
        .run()
        .await
}

struct FleetMocks<'a> {
    scheduled_stops: httpmock::Mock<'a>,
    parcel_1: httpmock::Mock<'a>,
    parcel_2: httpmock::Mock<'a>,
    segments: httpmock::Mock<'a>,
}

/// Task and segment endpoints for vehicle `hki-van-1`.
fn fleet_mocks(fleet: &MockServer) -> FleetMocks<'_> {
    let tasks_path = format!("/v1/providers/{}/tasks", PROVIDER);

    let scheduled_stops = fleet.mock(|when, then| {
        when.method(POST)
            .path(tasks_path.clone())
            .header("authorization", "Bearer fe-token")
            .json_body_partial(r#"{"type": "SCHEDULED_STOP", "state": "OPEN"}"#);
        then.status(200).json_body(json!({"type": "SCHEDULED_STOP", "state": "OPEN"}));
    });
    let parcel_1 = fleet.mock(|when, then| {
        when.method(POST)
            .path(tasks_path.clone())
            .json_body_partial(r#"{"type": "DELIVERY", "trackingId": "hki-parcel-001", "taskDuration": "140s"}"#);
        then.status(200).json_body(json!({"type": "DELIVERY", "state": "OPEN"}));
    });
    let parcel_2 = fleet.mock(|when, then| {
        when.method(POST)
            .path(tasks_path.clone())
            .json_body_partial(r#"{"type": "DELIVERY", "trackingId": "hki-parcel-002", "taskDuration": "95s"}"#);
        then.status(200).json_body(json!({"type": "DELIVERY", "state": "OPEN"}));
    });
    let segments = fleet.mock(|when, then| {
        when.method(httpmock::Method::PATCH)
            .path(format!("/v1/providers/{}/deliveryVehicles/hki-van-1", PROVIDER))
            .query_param("updateMask", "remainingVehicleJourneySegments")
            .body_contains("\"taskId\"");
        then.status(200)
            .json_body(json!({"name": format!("providers/{}/deliveryVehicles/hki-van-1", PROVIDER)}));
    });

    FleetMocks {
        scheduled_stops,
        parcel_1,
        parcel_2,
        segments,
    }
}

#[tokio::test]
async fn test_initial_planning_end_to_end() {
    let models = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_model(models.path(), "uc1.json", "uc1-initial");

    let optimizer = MockServer::start();
    let fleet = MockServer::start();

    let optimize = optimizer.mock(|when, then| {
        when.method(POST)
            .path(format!("/v1/projects/{}:optimizeTours", PROVIDER))
            .header("authorization", "Bearer ro-token")
            .json_body_partial(r#"{"timeout": "100s", "label": "uc1-initial"}"#);
        then.status(200).json_body(plan_response());
    });
    let create_vehicle = fleet.mock(|when, then| {
        when.method(POST)
            .path(format!("/v1/providers/{}/deliveryVehicles", PROVIDER))
            .query_param("deliveryVehicleId", "hki-van-1")
            .json_body_partial(r#"{"navigationStatus": "UNKNOWN_NAVIGATION_STATUS"}"#);
        then.status(200)
            .json_body(json!({"name": format!("providers/{}/deliveryVehicles/hki-van-1", PROVIDER)}));
    });
    let mocks = fleet_mocks(&fleet);

    let config = config(
        &optimizer,
        &fleet,
        models.path(),
        output.path(),
        r#"
[[scenarios]]
name = "UC1_InitialPlanning"
kind = "initial_planning"
model = "uc1.json"
"#,
    );
    let summary = run(&config).await;

    assert_eq!(summary.failed(), 0);
    assert_eq!(summary.vehicles_published(), 1);

    optimize.assert_hits(1);
    create_vehicle.assert_hits(1);
    // route start, pickup, route end
    mocks.scheduled_stops.assert_hits(3);
    mocks.parcel_1.assert_hits(1);
    mocks.parcel_2.assert_hits(1);
    mocks.segments.assert_hits(1);

    let stage = &summary.scenarios[0].stages[0];
    assert_eq!(stage.skipped_routes, 1);
    assert_eq!(stage.report.task_count(), 5);

    let saved = std::fs::read_to_string(output.path().join("UC1_InitialPlanning_1_initial.json")).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved["routes"][0]["vehicleLabel"], "hki-van-1");
}

#[tokio::test]
async fn test_existing_vehicle_is_reused() {
    let models = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_model(models.path(), "uc1.json", "uc1-initial");

    let optimizer = MockServer::start();
    let fleet = MockServer::start();

    optimizer.mock(|when, then| {
        when.method(POST).path(format!("/v1/projects/{}:optimizeTours", PROVIDER));
        then.status(200).json_body(plan_response());
    });
    let create_vehicle = fleet.mock(|when, then| {
        when.method(POST)
            .path(format!("/v1/providers/{}/deliveryVehicles", PROVIDER));
        then.status(409).json_body(json!({
            "error": {"code": 409, "message": "Requested entity already exists", "status": "ALREADY_EXISTS"}
        }));
    });
    let mocks = fleet_mocks(&fleet);

    let config = config(
        &optimizer,
        &fleet,
        models.path(),
        output.path(),
        r#"
[[scenarios]]
name = "UC1_InitialPlanning"
kind = "initial_planning"
model = "uc1.json"
"#,
    );
    let summary = run(&config).await;

    create_vehicle.assert_hits(1);
    mocks.segments.assert_hits(1);
    assert_eq!(summary.vehicles_published(), 1);
    assert_eq!(
        summary.scenarios[0].stages[0].report.vehicles[0].vehicle_name,
        format!("providers/{}/deliveryVehicles/hki-van-1", PROVIDER)
    );
}

#[tokio::test]
async fn test_reoptimization_sends_previous_routes() {
    let models = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_model(models.path(), "uc2.json", "uc2-initial");

    let optimizer = MockServer::start();
    let fleet = MockServer::start();

    let initial = optimizer.mock(|when, then| {
        when.method(POST)
            .path(format!("/v1/projects/{}:optimizeTours", PROVIDER))
            .json_body_partial(r#"{"label": "uc2-initial"}"#);
        then.status(200).json_body(plan_response());
    });
    let reoptimize = optimizer.mock(|when, then| {
        when.method(POST)
            .path(format!("/v1/projects/{}:optimizeTours", PROVIDER))
            .json_body_partial(
                r#"{
                    "timeout": "100s",
                    "searchMode": "CONSUME_ALL_AVAILABLE_TIME",
                    "injectedFirstSolutionRoutes": [{"vehicleLabel": "hki-van-1"}, {"vehicleIndex": 1, "vehicleLabel": "hki-van-2"}]
                }"#,
            );
        then.status(200).json_body(plan_response());
    });
    fleet.mock(|when, then| {
        when.method(POST)
            .path(format!("/v1/providers/{}/deliveryVehicles", PROVIDER));
        then.status(409).json_body(json!({"error": {"status": "ALREADY_EXISTS", "message": "exists"}}));
    });
    let mocks = fleet_mocks(&fleet);

    let config = config(
        &optimizer,
        &fleet,
        models.path(),
        output.path(),
        r#"
[[scenarios]]
name = "UC2_Reoptimization"
kind = "reoptimization"
model = "uc2.json"
"#,
    );
    let summary = run(&config).await;

    assert_eq!(summary.failed(), 0);
    initial.assert_hits(1);
    reoptimize.assert_hits(1);
    // both stages publish the same route
    mocks.segments.assert_hits(2);

    let stages: Vec<&str> = summary.scenarios[0]
        .stages
        .iter()
        .map(|s| s.stage_name.as_str())
        .collect();
    assert_eq!(stages, vec!["initial", "reoptimize"]);
    assert!(output.path().join("UC2_Reoptimization_2_reoptimize.json").exists());
}

#[tokio::test]
async fn test_new_stop_and_failed_scenario() {
    let models = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_model(models.path(), "uc3.json", "uc3-initial");

    let optimizer = MockServer::start();
    let fleet = MockServer::start();

    let initial = optimizer.mock(|when, then| {
        when.method(POST)
            .path(format!("/v1/projects/{}:optimizeTours", PROVIDER))
            .json_body_partial(r#"{"label": "uc3-initial"}"#);
        then.status(200).json_body(plan_response());
    });
    let with_new_stop = optimizer.mock(|when, then| {
        when.method(POST)
            .path(format!("/v1/projects/{}:optimizeTours", PROVIDER))
            .body_contains("\"123s\"")
            .body_contains("\"Weight\"")
            .body_contains("1970-01-01T00:16:45Z");
        then.status(200).json_body(plan_response());
    });
    fleet.mock(|when, then| {
        when.method(POST)
            .path(format!("/v1/providers/{}/deliveryVehicles", PROVIDER));
        then.status(200)
            .json_body(json!({"name": format!("providers/{}/deliveryVehicles/hki-van-1", PROVIDER)}));
    });
    let mocks = fleet_mocks(&fleet);

    let config = config(
        &optimizer,
        &fleet,
        models.path(),
        output.path(),
        r#"
[[scenarios]]
name = "UC0_Missing"
kind = "initial_planning"
model = "does-not-exist.json"

[[scenarios]]
name = "UC3_NewStop"
kind = "new_stop"
model = "uc3.json"
"#,
    );
    let summary = run(&config).await;

    assert_eq!(summary.scenarios.len(), 2);
    assert!(!summary.scenarios[0].is_success());
    assert!(summary.scenarios[1].is_success());
    assert_eq!(summary.failed(), 1);

    initial.assert_hits(1);
    with_new_stop.assert_hits(1);
    mocks.segments.assert_hits(2);
}
