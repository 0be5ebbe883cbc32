//! MeshAnalysisConfig - Config Loader output
//!
//! Describes the endpoint naming rules and the receivers sources are routed to.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete analysis configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshAnalysisConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Endpoint naming rules
    #[serde(default)]
    pub endpoint_naming: EndpointNamingConfig,

    /// Output routing
    #[serde(default)]
    pub receivers: Vec<ReceiverConfig>,
}

/// Endpoint naming rules, grouped per destination service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointNamingConfig {
    #[serde(default)]
    pub services: Vec<ServiceNamingRules>,
}

impl EndpointNamingConfig {
    /// Total number of rules across all services
    pub fn rule_count(&self) -> usize {
        self.services.iter().map(|s| s.rules.len()).sum()
    }
}

/// Naming rules of one service, evaluated in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceNamingRules {
    /// Destination service name
    pub service: String,

    #[serde(default)]
    pub rules: Vec<NamingRule>,
}

/// A single naming rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingRule {
    /// Name reported when the pattern matches (e.g. "/items/{id}")
    pub name: String,

    /// Regular expression the whole endpoint name must match
    pub pattern: String,
}

impl NamingRule {
    /// Compile `pattern` anchored to the whole endpoint name
    pub fn compile(&self) -> Result<Regex, regex::Error> {
        compile_full_match(&self.pattern)
    }
}

/// Compile `pattern` so it only matches an entire input
///
/// Both config validation and the runtime rules go through here, so a pattern
/// that validates always builds.
pub fn compile_full_match(pattern: &str) -> Result<Regex, regex::Error> {
    match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(regex) => Ok(regex),
        Err(anchored_err) => {
            // A standalone pattern that only fails once anchored ends inside a
            // `(?x)` comment. The newline closes the comment and is ignored
            // whitespace in that mode.
            Regex::new(pattern).map_err(|_| anchored_err)?;
            Regex::new(&format!("^(?:{pattern}\n)$"))
        }
    }
}

/// Receiver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Receiver name
    pub name: String,

    /// Receiver type
    pub receiver_type: ReceiverType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl ReceiverConfig {
    /// Log receiver with the given name
    pub fn log(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            receiver_type: ReceiverType::Log,
            params: HashMap::new(),
        }
    }
}

/// Receiver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiverType {
    /// Log every source through tracing
    Log,
    /// Append sources to a JSON lines file (`path` param)
    File,
}
