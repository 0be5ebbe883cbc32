//! Configuration validation
//!
//! Rules:
//! - naming rule service names are non-empty and unique
//! - rule names are non-empty
//! - rule patterns compile as full-match patterns
//! - receiver names are non-empty and unique
//! - file receivers carry a `path` param

use std::collections::HashSet;

use contracts::{ContractError, MeshAnalysisConfig, ReceiverType};

/// Validate a MeshAnalysisConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &MeshAnalysisConfig) -> Result<(), ContractError> {
    validate_naming_services(config)?;
    validate_naming_rules(config)?;
    validate_receivers(config)?;
    Ok(())
}

/// Service names must be unique, rules of one service are evaluated as a group
fn validate_naming_services(config: &MeshAnalysisConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, service) in config.endpoint_naming.services.iter().enumerate() {
        if service.service.is_empty() {
            return Err(ContractError::config_validation(
                format!("endpoint_naming.services[{}].service", idx),
                "service name cannot be empty",
            ));
        }
        if !seen.insert(&service.service) {
            return Err(ContractError::config_validation(
                format!("endpoint_naming.services[service={}]", service.service),
                "duplicate service",
            ));
        }
    }
    Ok(())
}

fn validate_naming_rules(config: &MeshAnalysisConfig) -> Result<(), ContractError> {
    for service in &config.endpoint_naming.services {
        for (idx, rule) in service.rules.iter().enumerate() {
            if rule.name.is_empty() {
                return Err(ContractError::config_validation(
                    format!("endpoint_naming.services[{}].rules[{}].name", service.service, idx),
                    "rule name cannot be empty",
                ));
            }
            if let Err(e) = rule.compile() {
                return Err(ContractError::config_validation(
                    format!(
                        "endpoint_naming.services[{}].rules[{}].pattern",
                        service.service, rule.name
                    ),
                    format!("invalid pattern '{}': {e}", rule.pattern),
                ));
            }
        }
    }
    Ok(())
}

fn validate_receivers(config: &MeshAnalysisConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, receiver) in config.receivers.iter().enumerate() {
        if receiver.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("receivers[{}].name", idx),
                "receiver name cannot be empty",
            ));
        }
        if !seen.insert(&receiver.name) {
            return Err(ContractError::config_validation(
                format!("receivers[name={}]", receiver.name),
                "duplicate receiver name",
            ));
        }
        if receiver.receiver_type == ReceiverType::File
            && receiver.params.get("path").is_none_or(|p| p.is_empty())
        {
            return Err(ContractError::config_validation(
                format!("receivers[{}].params.path", receiver.name),
                "file receiver requires a 'path' param",
            ));
        }
    }
    Ok(())
}
