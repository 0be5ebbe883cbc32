//! `info` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::MeshAnalysisConfig;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    naming_rule_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    naming: Vec<ServiceNamingInfo>,
    receiver_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    receivers: Vec<ReceiverInfo>,
}

#[derive(Serialize)]
struct ServiceNamingInfo {
    service: String,
    rules: Vec<RuleInfo>,
}

#[derive(Serialize)]
struct RuleInfo {
    name: String,
    pattern: String,
}

#[derive(Serialize)]
struct ReceiverInfo {
    name: String,
    receiver_type: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn build_config_info(config: &MeshAnalysisConfig, args: &InfoArgs) -> ConfigInfo {
    let naming = if args.rules {
        config
            .endpoint_naming
            .services
            .iter()
            .map(|s| ServiceNamingInfo {
                service: s.service.clone(),
                rules: s
                    .rules
                    .iter()
                    .map(|r| RuleInfo {
                        name: r.name.clone(),
                        pattern: r.pattern.clone(),
                    })
                    .collect(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let receivers = if args.receivers {
        config
            .receivers
            .iter()
            .map(|r| ReceiverInfo {
                name: r.name.clone(),
                receiver_type: format!("{:?}", r.receiver_type),
                params: r.params.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", config.version),
        naming_rule_count: config.endpoint_naming.rule_count(),
        naming,
        receiver_count: config.receivers.len(),
        receivers,
    }
}

fn tree_prefix(index: usize, len: usize) -> &'static str {
    if index + 1 == len {
        "└─"
    } else {
        "├─"
    }
}

fn print_config_info(config: &MeshAnalysisConfig, args: &InfoArgs) {
    println!("=== Mesh Analyzer Configuration ===\n");
    println!("Version: {:?}", config.version);

    let services = &config.endpoint_naming.services;
    println!(
        "\nEndpoint naming ({} services, {} rules)",
        services.len(),
        config.endpoint_naming.rule_count()
    );
    for (i, service) in services.iter().enumerate() {
        let is_last = i + 1 == services.len();
        let child_prefix = if is_last { "   " } else { "│  " };
        println!("   {} {}", tree_prefix(i, services.len()), service.service);

        if args.rules {
            for (j, rule) in service.rules.iter().enumerate() {
                println!(
                    "   {}  {} {} <- {}",
                    child_prefix,
                    tree_prefix(j, service.rules.len()),
                    rule.name,
                    rule.pattern
                );
            }
        } else {
            println!("   {}  └─ {} rules", child_prefix, service.rules.len());
        }
    }

    println!("\nReceivers ({})", config.receivers.len());
    for (i, receiver) in config.receivers.iter().enumerate() {
        println!(
            "   {} {} ({:?})",
            tree_prefix(i, config.receivers.len()),
            receiver.name,
            receiver.receiver_type
        );
        if args.receivers {
            let mut params: Vec<_> = receiver.params.iter().collect();
            params.sort();
            for (key, value) in params {
                println!("        {} = {}", key, value);
            }
        }
    }

    println!();
}
