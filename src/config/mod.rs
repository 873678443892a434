pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliArgs;
pub use cli::LocalStorage;
pub use toml_config::{AppConfig, AuthMethod, NewShipmentConfig, ScenarioConfig, ScenarioKind};
