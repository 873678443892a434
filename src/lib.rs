pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::{AppConfig, LocalStorage};

pub use core::engine::PlanningEngine;
pub use utils::error::{Result, SyncError};
