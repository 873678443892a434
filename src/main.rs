use anyhow::Context;
use clap::Parser;
use route_fleet_sync::app::{self, pipelines::load_model};
use route_fleet_sync::config::ScenarioConfig;
use route_fleet_sync::utils::error::{ErrorSeverity, SyncError};
use route_fleet_sync::utils::{logger, validation::Validate};
use route_fleet_sync::{AppConfig, CliArgs, LocalStorage, PlanningEngine};

fn exit_code(e: &SyncError) -> i32 {
    // 根據錯誤嚴重程度決定退出碼
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: SyncError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(exit_code(&e).max(1));
}

async fn dry_run(config: &AppConfig, scenarios: &[&ScenarioConfig]) {
    let storage = LocalStorage::new(config.project.model_directory.clone());
    println!("🔍 Dry run: {} scenario(s), parent {}", scenarios.len(), config.parent());

    for scenario in scenarios {
        match load_model(&storage, &scenario.model).await {
            Ok(request) => println!(
                "  • {} ({:?}): {} shipments, {} vehicles from {}",
                scenario.name,
                scenario.kind,
                request.model.shipments.len(),
                request.model.vehicles.len(),
                scenario.model
            ),
            Err(e) => println!("  • {} ({:?}): ❌ {}", scenario.name, scenario.kind, e),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 載入 TOML 配置
    let config = match AppConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting route-fleet-sync");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(e);
    }

    let scenarios = match config.selected_scenarios(&args.scenarios) {
        Ok(scenarios) => scenarios,
        Err(e) => fail(e),
    };

    if args.dry_run {
        dry_run(&config, &scenarios).await;
        return Ok(());
    }

    let monitor_enabled = args
        .monitor_override()
        .unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let services = match app::build_services(&config) {
        Ok(services) => services,
        Err(e) => fail(e),
    };

    let mut engine = PlanningEngine::new_with_monitoring(
        app::build_scenarios(&services, &scenarios),
        monitor_enabled,
    );
    if config.output.save_responses {
        tokio::fs::create_dir_all(&config.output.directory)
            .await
            .with_context(|| format!("cannot create output directory '{}'", config.output.directory))?;
        engine = engine.with_response_storage(LocalStorage::new(config.output.directory.clone()));
    }

    let summary = engine.run().await;

    println!(
        "✅ {} scenario(s) succeeded, {} failed, {} vehicle route(s) published",
        summary.succeeded(),
        summary.failed(),
        summary.vehicles_published()
    );
    for outcome in summary.scenarios.iter().filter(|s| !s.is_success()) {
        eprintln!(
            "❌ {}: {}",
            outcome.name,
            outcome.error.as_deref().unwrap_or_default()
        );
    }

    if summary.failed() > 0 {
        std::process::exit(1);
    }

    Ok(())
}
