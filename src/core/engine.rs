use crate::core::sequence::{PipelineSequence, StageResult};
use crate::domain::ports::Storage;
use crate::utils::monitor::SystemMonitor;

pub struct Scenario {
    pub name: String,
    pub sequence: PipelineSequence,
}

#[derive(Debug)]
pub struct ScenarioOutcome {
    pub name: String,
    pub stages: Vec<StageResult>,
    pub error: Option<String>,
}

impl ScenarioOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub scenarios: Vec<ScenarioOutcome>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.scenarios.iter().filter(|s| !s.is_success()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.scenarios.len() - self.failed()
    }

    pub fn vehicles_published(&self) -> usize {
        self.scenarios
            .iter()
            .flat_map(|s| &s.stages)
            .map(|stage| stage.report.vehicles.iter().filter(|v| v.is_success()).count())
            .sum()
    }
}

/// 依序執行情境；單一情境失敗只記錄，不影響後續情境
pub struct PlanningEngine<S: Storage> {
    scenarios: Vec<Scenario>,
    monitor: SystemMonitor,
    response_storage: Option<S>,
}

impl<S: Storage> PlanningEngine<S> {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self::new_with_monitoring(scenarios, false)
    }

    pub fn new_with_monitoring(scenarios: Vec<Scenario>, monitor_enabled: bool) -> Self {
        Self {
            scenarios,
            monitor: SystemMonitor::new(monitor_enabled),
            response_storage: None,
        }
    }

    /// Optimizer responses of every stage are written here as pretty JSON.
    pub fn with_response_storage(mut self, storage: S) -> Self {
        self.response_storage = Some(storage);
        self
    }

    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        for (index, scenario) in self.scenarios.iter().enumerate() {
            let number = index + 1;
            tracing::info!("*** Use Case {} - STARTED! *** ({})", number, scenario.name);
            self.monitor.log_stats(&format!("{} started", scenario.name));

            let run = scenario.sequence.execute_stages().await;
            // 失敗前已完成的階段照樣保存與統計
            self.save_responses(&scenario.name, &run.stages).await;
            for stage in &run.stages {
                let failed = stage.report.failed_vehicles();
                if failed > 0 {
                    tracing::warn!(
                        "⚠️ {}: {} of {} vehicles were not fully published",
                        stage.stage_name,
                        failed,
                        stage.report.vehicles.len()
                    );
                }
            }
            if let Some(e) = &run.error {
                tracing::error!("❌ EXCEPTION in {}: {}", scenario.name, e);
            }
            let outcome = ScenarioOutcome {
                name: scenario.name.clone(),
                stages: run.stages,
                error: run.error.map(|e| e.to_string()),
            };

            self.monitor.log_stats(&format!("{} finished", scenario.name));
            tracing::info!("*** Use Case {} - DONE! *** ({})", number, scenario.name);
            summary.scenarios.push(outcome);
        }

        summary
    }

    async fn save_responses(&self, scenario_name: &str, stages: &[StageResult]) {
        let Some(storage) = &self.response_storage else {
            return;
        };

        for (index, stage) in stages.iter().enumerate() {
            let filename = format!("{}_{}_{}.json", scenario_name, index + 1, stage.stage_name);
            let written = match serde_json::to_vec_pretty(&stage.plan.response) {
                Ok(body) => storage.write_file(&filename, &body).await,
                Err(e) => Err(e.into()),
            };
            match written {
                Ok(()) => tracing::debug!("💾 Saved optimizer response to {}", filename),
                Err(e) => tracing::warn!("⚠️ Could not save {}: {}", filename, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocalStorage;
    use crate::core::sequence::PlanContext;
    use crate::domain::model::{OptimizedPlan, PublishReport, TranslationOutcome, VehicleOutcome};
    use crate::domain::optimization::{OptimizeToursRequest, OptimizeToursResponse};
    use crate::domain::ports::ContextualPipeline;
    use crate::utils::error::{Result, SyncError};
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct FixedStage {
        name: &'static str,
        fail: bool,
    }

    #[async_trait]
    impl ContextualPipeline for FixedStage {
        async fn extract_with_context(&self, _context: &PlanContext) -> Result<OptimizedPlan> {
            if self.fail {
                return Err(SyncError::ModelError {
                    message: "no such model".to_string(),
                });
            }
            Ok(OptimizedPlan {
                request: OptimizeToursRequest::default(),
                response: serde_json::from_value(serde_json::json!({
                    "routes": [{"vehicleLabel": "van-1"}],
                    "metrics": {"usedVehicleCount": 1}
                }))?,
            })
        }

        async fn transform_with_context(&self, _plan: &OptimizedPlan) -> Result<TranslationOutcome> {
            Ok(TranslationOutcome::default())
        }

        async fn load_with_context(&self, _outcome: &TranslationOutcome) -> Result<PublishReport> {
            Ok(PublishReport {
                vehicles: vec![VehicleOutcome {
                    vehicle_id: "van-1".to_string(),
                    segments_attached: true,
                    ..VehicleOutcome::default()
                }],
            })
        }

        fn get_name(&self) -> &str {
            self.name
        }
    }

    fn scenario(name: &str, fail: bool) -> Scenario {
        let mut sequence = PipelineSequence::new(name.to_string());
        sequence.add_pipeline(Box::new(FixedStage { name: "initial", fail }));
        Scenario {
            name: name.to_string(),
            sequence,
        }
    }

    #[tokio::test]
    async fn test_failed_scenario_does_not_stop_the_run() {
        let engine: PlanningEngine<LocalStorage> =
            PlanningEngine::new(vec![scenario("UC1", true), scenario("UC2", false)]);

        let summary = engine.run().await;

        assert_eq!(summary.scenarios.len(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.succeeded(), 1);
        assert!(summary.scenarios[0].error.as_deref().unwrap().contains("no such model"));
        assert_eq!(summary.vehicles_published(), 1);
    }

    #[tokio::test]
    async fn test_responses_are_saved_per_stage() {
        let dir = TempDir::new().unwrap();
        let engine = PlanningEngine::new(vec![scenario("UC1", false)])
            .with_response_storage(LocalStorage::new(dir.path().to_string_lossy()));

        engine.run().await;

        let saved = std::fs::read_to_string(dir.path().join("UC1_1_initial.json")).unwrap();
        let body: serde_json::Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(body["routes"][0]["vehicleLabel"], "van-1");
        assert_eq!(body["metrics"]["usedVehicleCount"], 1);
    }

    #[tokio::test]
    async fn test_stages_before_a_failure_are_kept_and_saved() {
        let dir = TempDir::new().unwrap();
        let mut sequence = PipelineSequence::new("UC2".to_string());
        sequence.add_pipeline(Box::new(FixedStage { name: "initial", fail: false }));
        sequence.add_pipeline(Box::new(FixedStage { name: "reoptimize", fail: true }));
        let engine = PlanningEngine::new(vec![Scenario {
            name: "UC2".to_string(),
            sequence,
        }])
        .with_response_storage(LocalStorage::new(dir.path().to_string_lossy()));

        let summary = engine.run().await;

        let outcome = &summary.scenarios[0];
        assert!(!outcome.is_success());
        assert!(outcome.error.as_deref().unwrap().contains("reoptimize"));
        assert_eq!(outcome.stages.len(), 1);
        assert_eq!(outcome.stages[0].stage_name, "initial");
        assert_eq!(summary.vehicles_published(), 1);
        assert!(dir.path().join("UC2_1_initial.json").exists());
        assert!(!dir.path().join("UC2_2_reoptimize.json").exists());
    }
}
