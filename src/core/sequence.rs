use crate::domain::model::{OptimizedPlan, PublishReport};
use crate::domain::ports::ContextualPipeline;
use crate::utils::error::{Result, SyncError};
use std::time::{Duration, Instant};

/// 單一階段的執行結果
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage_name: String,
    pub plan: OptimizedPlan,
    pub report: PublishReport,
    pub skipped_routes: usize,
    pub duration: Duration,
}

/// 階段之間共享的上下文，保存先前階段的最佳化結果
#[derive(Debug, Clone)]
pub struct PlanContext {
    pub previous_results: Vec<StageResult>,
    pub execution_id: String,
}

impl PlanContext {
    pub fn new(execution_id: String) -> Self {
        Self {
            previous_results: Vec::new(),
            execution_id,
        }
    }

    pub fn get_previous_result(&self) -> Option<&StageResult> {
        self.previous_results.last()
    }

    /// Latest plan, for stages that build on it.
    pub fn require_previous_plan(&self, stage: &str) -> Result<&OptimizedPlan> {
        self.get_previous_result()
            .map(|result| &result.plan)
            .ok_or_else(|| SyncError::StageError {
                stage: stage.to_string(),
                details: "no previous plan in this sequence".to_string(),
            })
    }

    pub fn add_result(&mut self, result: StageResult) {
        self.previous_results.push(result);
    }
}

/// 依序執行多個階段；任一階段失敗即中止整個序列
pub struct PipelineSequence {
    pipelines: Vec<Box<dyn ContextualPipeline>>,
    execution_id: String,
}

/// Completed stages of one sequence run, plus the error that stopped it.
#[derive(Debug)]
pub struct SequenceRun {
    pub stages: Vec<StageResult>,
    pub error: Option<SyncError>,
}

impl SequenceRun {
    pub fn into_result(self) -> Result<Vec<StageResult>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.stages),
        }
    }
}

impl PipelineSequence {
    pub fn new(execution_id: String) -> Self {
        Self {
            pipelines: Vec::new(),
            execution_id,
        }
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub fn add_pipeline(&mut self, pipeline: Box<dyn ContextualPipeline>) {
        self.pipelines.push(pipeline);
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub async fn execute_all(&self) -> Result<Vec<StageResult>> {
        self.execute_stages().await.into_result()
    }

    /// Runs stages in order and stops at the first failure, keeping the stages
    /// that already completed.
    pub async fn execute_stages(&self) -> SequenceRun {
        let mut context = PlanContext::new(self.execution_id.clone());

        for pipeline in &self.pipelines {
            let start_time = Instant::now();

            match Self::execute_pipeline(pipeline.as_ref(), &context).await {
                Ok((plan, report, skipped_routes)) => {
                    let result = StageResult {
                        stage_name: pipeline.get_name().to_string(),
                        plan,
                        report,
                        skipped_routes,
                        duration: start_time.elapsed(),
                    };

                    tracing::info!(
                        "✅ Stage executed: {} (vehicles: {}, tasks: {}, duration: {:?})",
                        result.stage_name,
                        result.report.vehicles.len(),
                        result.report.task_count(),
                        result.duration
                    );

                    context.add_result(result);
                }
                Err(e) => {
                    tracing::error!("❌ Stage '{}' failed: {}", pipeline.get_name(), e);
                    return SequenceRun {
                        stages: context.previous_results,
                        error: Some(SyncError::StageError {
                            stage: pipeline.get_name().to_string(),
                            details: e.to_string(),
                        }),
                    };
                }
            }
        }

        SequenceRun {
            stages: context.previous_results,
            error: None,
        }
    }

    async fn execute_pipeline(
        pipeline: &dyn ContextualPipeline,
        context: &PlanContext,
    ) -> Result<(OptimizedPlan, PublishReport, usize)> {
        let plan = pipeline.extract_with_context(context).await?;
        tracing::debug!("📥 Optimized plan with {} routes", plan.response.routes.len());

        let outcome = pipeline.transform_with_context(&plan).await?;
        tracing::debug!(
            "🔄 Translated {} vehicle plans ({} routes skipped)",
            outcome.plans.len(),
            outcome.skipped.len()
        );

        let report = pipeline.load_with_context(&outcome).await?;
        tracing::debug!("💾 Published {} vehicles", report.vehicles.len());

        Ok((plan, report, outcome.skipped.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{TranslationOutcome, VehicleOutcome};
    use crate::domain::optimization::{OptimizeToursRequest, OptimizeToursResponse};
    use async_trait::async_trait;

    struct MockPipeline {
        name: String,
        needs_previous: bool,
        fail: bool,
    }

    impl MockPipeline {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                needs_previous: false,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl ContextualPipeline for MockPipeline {
        async fn extract_with_context(&self, context: &PlanContext) -> Result<OptimizedPlan> {
            if self.fail {
                return Err(SyncError::ModelError {
                    message: "broken model".to_string(),
                });
            }
            let mut request = OptimizeToursRequest::default();
            if self.needs_previous {
                let previous = context.require_previous_plan(&self.name)?;
                request.label = Some(format!("after-{}", previous.request.label.clone().unwrap_or_default()));
            } else {
                request.label = Some(self.name.clone());
            }
            Ok(OptimizedPlan {
                request,
                response: OptimizeToursResponse::default(),
            })
        }

        async fn transform_with_context(&self, _plan: &OptimizedPlan) -> Result<TranslationOutcome> {
            Ok(TranslationOutcome::default())
        }

        async fn load_with_context(&self, _outcome: &TranslationOutcome) -> Result<PublishReport> {
            Ok(PublishReport {
                vehicles: vec![VehicleOutcome {
                    vehicle_id: self.name.clone(),
                    segments_attached: true,
                    ..VehicleOutcome::default()
                }],
            })
        }

        fn get_name(&self) -> &str {
            &self.name
        }
    }

    #[tokio::test]
    async fn test_later_stage_sees_previous_plan() {
        let mut sequence = PipelineSequence::new("uc2".to_string());
        sequence.add_pipeline(Box::new(MockPipeline::new("initial")));
        sequence.add_pipeline(Box::new(MockPipeline {
            needs_previous: true,
            ..MockPipeline::new("reoptimize")
        }));

        let results = sequence.execute_all().await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].stage_name, "initial");
        assert_eq!(results[1].plan.request.label.as_deref(), Some("after-initial"));
    }

    #[tokio::test]
    async fn test_stage_without_previous_plan_fails() {
        let mut sequence = PipelineSequence::new("lonely".to_string());
        sequence.add_pipeline(Box::new(MockPipeline {
            needs_previous: true,
            ..MockPipeline::new("reoptimize")
        }));

        let err = sequence.execute_all().await.unwrap_err();
        assert!(matches!(err, SyncError::StageError { ref stage, .. } if stage == "reoptimize"));
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_stages() {
        let mut sequence = PipelineSequence::new("uc3".to_string());
        sequence.add_pipeline(Box::new(MockPipeline {
            fail: true,
            ..MockPipeline::new("initial")
        }));
        sequence.add_pipeline(Box::new(MockPipeline::new("new-stop")));

        let err = sequence.execute_all().await.unwrap_err();
        assert!(err.to_string().contains("broken model"));
        assert!(err.to_string().contains("initial"));
    }

    #[tokio::test]
    async fn test_completed_stages_survive_later_failure() {
        let mut sequence = PipelineSequence::new("uc2".to_string());
        sequence.add_pipeline(Box::new(MockPipeline::new("initial")));
        sequence.add_pipeline(Box::new(MockPipeline {
            fail: true,
            ..MockPipeline::new("reoptimize")
        }));

        let run = sequence.execute_stages().await;

        assert_eq!(run.stages.len(), 1);
        assert_eq!(run.stages[0].stage_name, "initial");
        assert!(matches!(run.error, Some(SyncError::StageError { ref stage, .. }) if stage == "reoptimize"));
    }

    #[test]
    fn test_context_returns_latest_result() {
        let mut context = PlanContext::new("ctx".to_string());
        for name in ["initial", "reoptimize"] {
            context.add_result(StageResult {
                stage_name: name.to_string(),
                plan: OptimizedPlan {
                    request: OptimizeToursRequest::default(),
                    response: OptimizeToursResponse::default(),
                },
                report: PublishReport::default(),
                skipped_routes: 0,
                duration: Duration::from_millis(5),
            });
        }

        assert_eq!(context.get_previous_result().unwrap().stage_name, "reoptimize");
        assert_eq!(context.previous_results.len(), 2);
        assert!(PlanContext::new("empty".to_string()).get_previous_result().is_none());
    }
}
