use crate::adapters::fleet_engine::FLEET_ENGINE_ENDPOINT;
use crate::adapters::route_optimization::ROUTE_OPTIMIZATION_ENDPOINT;
use crate::core::translator::{TaskDurationSource, TranslationOptions};
use crate::domain::optimization::LatLng;
use crate::domain::tracking::TaskType;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{
    validate_coordinates, validate_file_extension, validate_non_empty_string, validate_path,
    validate_positive_number, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub project: ProjectConfig,
    #[serde(default)]
    pub optimization: OptimizationConfig,
    #[serde(default)]
    pub fleet_engine: FleetEngineConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Fleet Engine provider; also the cloud project unless `project_id` is set.
    pub provider_id: String,
    pub project_id: Option<String>,
    #[serde(default = "default_model_directory")]
    pub model_directory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationConfig {
    #[serde(default = "default_optimization_endpoint")]
    pub endpoint: String,
    /// Solver time budget placed in requests that do not carry one.
    #[serde(default = "default_solve_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_optimization_request_timeout")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetEngineConfig {
    #[serde(default = "default_fleet_engine_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_pickup_task_type")]
    pub pickup_task_type: TaskType,
    #[serde(default)]
    pub duration_source: TaskDurationSource,
    #[serde(default)]
    pub verify_tasks: bool,
    #[serde(default = "default_fleet_request_timeout")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Static,
    ServiceAccount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    pub optimization_token: Option<String>,
    pub fleet_engine_token: Option<String>,
    pub service_account_key: Option<String>,
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub save_responses: bool,
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    InitialPlanning,
    Reoptimization,
    NewStop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub kind: ScenarioKind,
    pub model: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// 重新最佳化前先將現有車輛移到此位置
    pub relocate_vehicles_to: Option<LatLng>,
    pub new_shipment: Option<NewShipmentConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShipmentConfig {
    #[serde(default = "default_new_pickup")]
    pub pickup: LatLng,
    #[serde(default = "default_new_delivery")]
    pub delivery: LatLng,
    #[serde(default = "default_new_visit_duration")]
    pub pickup_duration_seconds: u64,
    #[serde(default = "default_new_visit_duration")]
    pub delivery_duration_seconds: u64,
    /// Seconds since the Unix epoch.
    #[serde(default = "default_pickup_window")]
    pub pickup_window: [i64; 2],
    #[serde(default = "default_delivery_window")]
    pub delivery_window: [i64; 2],
    #[serde(default = "default_weight")]
    pub weight: i64,
    #[serde(default)]
    pub label: String,
}

impl Default for NewShipmentConfig {
    fn default() -> Self {
        Self {
            pickup: default_new_pickup(),
            delivery: default_new_delivery(),
            pickup_duration_seconds: default_new_visit_duration(),
            delivery_duration_seconds: default_new_visit_duration(),
            pickup_window: default_pickup_window(),
            delivery_window: default_delivery_window(),
            weight: default_weight(),
            label: String::new(),
        }
    }
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_optimization_endpoint(),
            timeout_seconds: default_solve_timeout(),
            request_timeout_seconds: default_optimization_request_timeout(),
        }
    }
}

impl Default for FleetEngineConfig {
    fn default() -> Self {
        Self {
            endpoint: default_fleet_engine_endpoint(),
            pickup_task_type: default_pickup_task_type(),
            duration_source: TaskDurationSource::default(),
            verify_tasks: false,
            request_timeout_seconds: default_fleet_request_timeout(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_responses: false,
            directory: default_output_directory(),
        }
    }
}

fn default_model_directory() -> String {
    ".".to_string()
}

fn default_optimization_endpoint() -> String {
    ROUTE_OPTIMIZATION_ENDPOINT.to_string()
}

fn default_fleet_engine_endpoint() -> String {
    FLEET_ENGINE_ENDPOINT.to_string()
}

fn default_solve_timeout() -> u64 {
    100
}

fn default_optimization_request_timeout() -> u64 {
    180
}

fn default_fleet_request_timeout() -> u64 {
    30
}

fn default_pickup_task_type() -> TaskType {
    TaskType::ScheduledStop
}

fn default_token_lifetime() -> i64 {
    3600
}

fn default_output_directory() -> String {
    "./output".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_new_pickup() -> LatLng {
    LatLng::new(60.191819, 25.025756)
}

fn default_new_delivery() -> LatLng {
    LatLng::new(60.177872, 24.812258)
}

fn default_new_visit_duration() -> u64 {
    123
}

fn default_pickup_window() -> [i64; 2] {
    [1005, 2005]
}

fn default_delivery_window() -> [i64; 2] {
    [3005, 4005]
}

fn default_weight() -> i64 {
    10
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| SyncError::ConfigError {
            message: format!("Cannot read '{}': {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SyncError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FLEET_ENGINE_TOKEN})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SyncError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn project_id(&self) -> &str {
        self.project
            .project_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(&self.project.provider_id)
    }

    /// `projects/<project_id>`, the parent of every optimization request.
    pub fn parent(&self) -> String {
        format!("projects/{}", self.project_id())
    }

    pub fn solve_timeout(&self) -> Duration {
        Duration::from_secs(self.optimization.timeout_seconds)
    }

    pub fn translation_options(&self) -> TranslationOptions {
        TranslationOptions {
            duration_source: self.fleet_engine.duration_source,
            pickup_task_type: self.fleet_engine.pickup_task_type,
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    /// Enabled scenarios, narrowed to `names` when it is not empty.
    pub fn selected_scenarios(&self, names: &[String]) -> Result<Vec<&ScenarioConfig>> {
        for name in names {
            if !self.scenarios.iter().any(|s| &s.name == name) {
                return Err(SyncError::InvalidConfigValueError {
                    field: "scenario".to_string(),
                    value: name.clone(),
                    reason: "No scenario with this name in the configuration".to_string(),
                });
            }
        }

        Ok(self
            .scenarios
            .iter()
            .filter(|s| names.is_empty() || names.contains(&s.name))
            .filter(|s| s.enabled || !names.is_empty())
            .collect())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("project.provider_id", &self.project.provider_id)?;
        if self.project.provider_id.contains("${") {
            return Err(SyncError::MissingConfigError {
                field: "project.provider_id".to_string(),
            });
        }
        validate_path("project.model_directory", &self.project.model_directory)?;

        // 驗證 API 端點
        validate_url("optimization.endpoint", &self.optimization.endpoint)?;
        validate_url("fleet_engine.endpoint", &self.fleet_engine.endpoint)?;
        validate_positive_number("optimization.timeout_seconds", self.optimization.timeout_seconds, 1)?;
        validate_positive_number(
            "optimization.request_timeout_seconds",
            self.optimization.request_timeout_seconds,
            1,
        )?;
        validate_positive_number(
            "fleet_engine.request_timeout_seconds",
            self.fleet_engine.request_timeout_seconds,
            1,
        )?;

        if !matches!(
            self.fleet_engine.pickup_task_type,
            TaskType::Pickup | TaskType::ScheduledStop
        ) {
            return Err(SyncError::InvalidConfigValueError {
                field: "fleet_engine.pickup_task_type".to_string(),
                value: format!("{:?}", self.fleet_engine.pickup_task_type),
                reason: "Pickups are published as PICKUP or SCHEDULED_STOP".to_string(),
            });
        }

        self.auth.validate()?;

        if self.output.save_responses {
            validate_path("output.directory", &self.output.directory)?;
        }

        if self.scenarios.is_empty() {
            return Err(SyncError::MissingConfigError {
                field: "scenarios".to_string(),
            });
        }
        for (index, scenario) in self.scenarios.iter().enumerate() {
            scenario.validate().map_err(|e| match e {
                SyncError::InvalidConfigValueError { field, value, reason } => {
                    SyncError::InvalidConfigValueError {
                        field: format!("scenarios[{}].{}", index, field),
                        value,
                        reason,
                    }
                }
                other => other,
            })?;
        }

        Ok(())
    }
}

impl Validate for AuthConfig {
    fn validate(&self) -> Result<()> {
        match self.method {
            AuthMethod::Static => {
                for (field, token) in [
                    ("auth.optimization_token", &self.optimization_token),
                    ("auth.fleet_engine_token", &self.fleet_engine_token),
                ] {
                    match token {
                        Some(token) if !token.trim().is_empty() && !token.contains("${") => {}
                        _ => {
                            return Err(SyncError::MissingConfigError {
                                field: field.to_string(),
                            })
                        }
                    }
                }
            }
            AuthMethod::ServiceAccount => {
                let key = self.service_account_key.as_deref().ok_or_else(|| {
                    SyncError::MissingConfigError {
                        field: "auth.service_account_key".to_string(),
                    }
                })?;
                validate_file_extension("auth.service_account_key", key, &["json"])?;
                validate_positive_number(
                    "auth.token_lifetime_seconds",
                    self.token_lifetime_seconds.max(0) as u64,
                    120,
                )?;
            }
        }
        Ok(())
    }
}

impl Validate for ScenarioConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("name", &self.name)?;
        validate_file_extension("model", &self.model, &["json"])?;

        if let Some(location) = &self.relocate_vehicles_to {
            validate_coordinates("relocate_vehicles_to", location.latitude, location.longitude)?;
        }

        if let Some(shipment) = &self.new_shipment {
            validate_coordinates("new_shipment.pickup", shipment.pickup.latitude, shipment.pickup.longitude)?;
            validate_coordinates(
                "new_shipment.delivery",
                shipment.delivery.latitude,
                shipment.delivery.longitude,
            )?;
            for (field, window) in [
                ("new_shipment.pickup_window", shipment.pickup_window),
                ("new_shipment.delivery_window", shipment.delivery_window),
            ] {
                if window[0] > window[1] {
                    return Err(SyncError::InvalidConfigValueError {
                        field: field.to_string(),
                        value: format!("{:?}", window),
                        reason: "Window start is after its end".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[project]
provider_id = "demo-provider"

[auth]
method = "static"
optimization_token = "ro-token"
fleet_engine_token = "fe-token"

[[scenarios]]
name = "UC1_InitialPlanning"
kind = "initial_planning"
model = "models/UC1_InitialPlanning.json"
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = AppConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.project_id(), "demo-provider");
        assert_eq!(config.parent(), "projects/demo-provider");
        assert_eq!(config.optimization.endpoint, ROUTE_OPTIMIZATION_ENDPOINT);
        assert_eq!(config.solve_timeout(), Duration::from_secs(100));
        assert_eq!(config.fleet_engine.pickup_task_type, TaskType::ScheduledStop);
        assert_eq!(config.fleet_engine.duration_source, TaskDurationSource::Detour);
        assert!(!config.output.save_responses);
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config_overrides() {
        let toml_content = r#"
[project]
provider_id = "demo-provider"
project_id = "routing-project"

[optimization]
endpoint = "http://127.0.0.1:9001"
timeout_seconds = 20

[fleet_engine]
endpoint = "http://127.0.0.1:9002"
pickup_task_type = "PICKUP"
duration_source = "visit_duration"
verify_tasks = true

[auth]
method = "service_account"
service_account_key = "keys/fleet.json"

[output]
save_responses = true
directory = "./responses"

[monitoring]
enabled = true
log_format = "json"

[[scenarios]]
name = "UC2_Reoptimization"
kind = "reoptimization"
model = "models/UC2_Reoptimization.json"
relocate_vehicles_to = { latitude = 60.169455, longitude = 24.940909 }

[[scenarios]]
name = "UC3_NewStop"
kind = "new_stop"
model = "models/UC3_NewStop.json"
enabled = false

[scenarios.new_shipment]
weight = 25
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.parent(), "projects/routing-project");
        assert_eq!(config.translation_options().pickup_task_type, TaskType::Pickup);
        assert_eq!(
            config.translation_options().duration_source,
            TaskDurationSource::VisitDuration
        );
        assert!(config.json_logs());

        let reoptimize = &config.scenarios[0];
        assert_eq!(reoptimize.kind, ScenarioKind::Reoptimization);
        assert_eq!(
            reoptimize.relocate_vehicles_to,
            Some(LatLng::new(60.169455, 24.940909))
        );

        let new_stop = config.scenarios[1].new_shipment.clone().unwrap();
        assert_eq!(new_stop.weight, 25);
        assert_eq!(new_stop.pickup_duration_seconds, 123);
        assert_eq!(new_stop.pickup_window, [1005, 2005]);
        assert_eq!(new_stop.delivery, LatLng::new(60.177872, 24.812258));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ROUTE_FLEET_SYNC_TEST_PROVIDER", "env-provider");

        let toml_content = BASIC.replace("demo-provider", "${ROUTE_FLEET_SYNC_TEST_PROVIDER}");
        let config = AppConfig::from_toml_str(&toml_content).unwrap();
        assert_eq!(config.project.provider_id, "env-provider");

        std::env::remove_var("ROUTE_FLEET_SYNC_TEST_PROVIDER");
    }

    #[test]
    fn test_unresolved_token_fails_validation() {
        let toml_content = BASIC.replace("\"fe-token\"", "\"${ROUTE_FLEET_SYNC_UNSET_TOKEN}\"");
        let config = AppConfig::from_toml_str(&toml_content).unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, SyncError::MissingConfigError { ref field } if field == "auth.fleet_engine_token"));
    }

    #[test]
    fn test_config_validation() {
        let bad_endpoint = format!("{}\n[optimization]\nendpoint = \"invalid-url\"\n", BASIC);
        assert!(AppConfig::from_toml_str(&bad_endpoint).unwrap().validate().is_err());

        let bad_model = BASIC.replace("UC1_InitialPlanning.json", "UC1_InitialPlanning.textproto");
        let err = AppConfig::from_toml_str(&bad_model).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("scenarios[0].model"));

        let bad_type = format!("{}\n[fleet_engine]\npickup_task_type = \"DELIVERY\"\n", BASIC);
        assert!(AppConfig::from_toml_str(&bad_type).unwrap().validate().is_err());
    }

    #[test]
    fn test_scenario_selection() {
        let toml_content = format!(
            "{}\n[[scenarios]]\nname = \"UC3_NewStop\"\nkind = \"new_stop\"\nmodel = \"m.json\"\nenabled = false\n",
            BASIC
        );
        let config = AppConfig::from_toml_str(&toml_content).unwrap();

        let all = config.selected_scenarios(&[]).unwrap();
        assert_eq!(all.len(), 1);

        let picked = config.selected_scenarios(&["UC3_NewStop".to_string()]).unwrap();
        assert_eq!(picked[0].name, "UC3_NewStop");

        assert!(config.selected_scenarios(&["UC9".to_string()]).is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.scenarios[0].name, "UC1_InitialPlanning");
    }
}
