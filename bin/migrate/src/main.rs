use piecework_migrate::MigrateConfig;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match MigrateConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        dir = %config.flow_versions_dir.display(),
        dry_run = config.dry_run,
        "Loaded configuration"
    );

    let report = match piecework_migrate::run(&config).await {
        Ok(report) => report,
        Err(report) => {
            tracing::error!(error = %report, "migration aborted");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "scanned {} flow versions: {} migrated, {} unchanged, {} failed",
        report.scanned,
        report.migrated,
        report.unchanged,
        report.failures.len()
    );
    for failure in &report.failures {
        match &failure.step_name {
            Some(step) => println!(
                "  {} (step {step}): {}",
                failure.flow_version_id, failure.reason
            ),
            None => println!("  {}: {}", failure.flow_version_id, failure.reason),
        }
    }

    if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
