use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::path::Path;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "route-fleet-sync")]
#[command(about = "Optimize delivery routes and publish them to Fleet Engine")]
pub struct CliArgs {
    #[arg(short, long, default_value = "fleet-sync.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, help = "Enable system monitoring (overrides [monitoring] enabled)")]
    pub monitor: bool,

    #[arg(long, conflicts_with = "monitor", help = "Disable system monitoring")]
    pub no_monitor: bool,

    /// Run only the named scenarios (repeatable).
    #[arg(long = "scenario")]
    pub scenarios: Vec<String>,

    #[arg(long, help = "Load and summarize the models without calling any service")]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
impl CliArgs {
    /// `Some` when a monitoring flag was given, `None` to follow the config file.
    pub fn monitor_override(&self) -> Option<bool> {
        match (self.monitor, self.no_monitor) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Files under one base directory: model files in, saved responses out.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}
