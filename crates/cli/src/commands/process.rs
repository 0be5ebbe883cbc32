//! `process` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::ProcessArgs;
use crate::error::CliError;
use crate::pipeline::{Processor, ProcessorConfig};

/// Execute the `process` command
pub async fn run_process(args: &ProcessArgs) -> Result<()> {
    let config = match args.config {
        Some(ref path) => {
            info!(config = %path.display(), "Loading configuration");
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            info!("No configuration given, using defaults");
            contracts::MeshAnalysisConfig::default()
        }
    };

    info!(
        naming_services = config.endpoint_naming.services.len(),
        naming_rules = config.endpoint_naming.rule_count(),
        receivers = config.receivers.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if args.input.as_os_str() != "-" && !args.input.exists() {
        return Err(CliError::input_not_found(args.input.display().to_string()).into());
    }

    let processor = Processor::new(ProcessorConfig {
        config,
        input: args.input.clone(),
        max_records: (args.max_records != 0).then_some(args.max_records),
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    info!(input = %args.input.display(), "Processing metric records...");

    let stats = processor
        .run(shutdown_signal())
        .await
        .context("Processing failed")?;

    if stats.interrupted {
        warn!("Received shutdown signal, processing stopped early");
    }
    info!(
        records = stats.records_read,
        failed = stats.dispatch.total_failed,
        sources = stats.dispatch.total_sources(),
        duration_secs = stats.duration.as_secs_f64(),
        "Processing completed"
    );
    stats.print_summary();

    info!("Mesh Analyzer finished");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::MeshAnalysisConfig) {
    println!("\n=== Configuration Summary ===\n");

    println!(
        "Endpoint naming ({} services, {} rules):",
        config.endpoint_naming.services.len(),
        config.endpoint_naming.rule_count()
    );
    for service in &config.endpoint_naming.services {
        println!("  - {} ({} rules)", service.service, service.rules.len());
    }

    if config.receivers.is_empty() {
        println!("\nReceivers: none (sources will be logged)");
    } else {
        println!("\nReceivers ({}):", config.receivers.len());
        for receiver in &config.receivers {
            println!("  - {} ({:?})", receiver.name, receiver.receiver_type);
        }
    }

    println!();
}
