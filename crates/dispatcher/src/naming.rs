//! Endpoint naming rules
//!
//! Groups high-cardinality endpoint names (ids in paths, query strings) under
//! a stable name, per destination service.

use std::collections::HashMap;

use contracts::{
    compile_full_match, ContractError, EndpointNameFormatter, EndpointNamingConfig, FormatResult,
};
use regex::Regex;

struct FormatRule {
    name: String,
    pattern: Regex,
}

/// Ordered set of naming rules
///
/// The first rule whose pattern matches the whole input wins.
#[derive(Default)]
pub struct StringFormatGroup {
    rules: Vec<FormatRule>,
}

impl StringFormatGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; `pattern` must match the entire endpoint name
    pub fn add_rule(&mut self, name: impl Into<String>, pattern: &str) -> Result<(), regex::Error> {
        let pattern = compile_full_match(pattern)?;
        self.rules.push(FormatRule {
            name: name.into(),
            pattern,
        });
        Ok(())
    }

    pub fn format(&self, input: &str) -> FormatResult {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(input))
            .map(|rule| FormatResult::matched(rule.name.clone()))
            .unwrap_or_else(|| FormatResult::unmatched(input))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Per-service naming rules
///
/// Services without rules never match.
#[derive(Default)]
pub struct EndpointNamingRules {
    groups: HashMap<String, StringFormatGroup>,
}

impl EndpointNamingRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration
    ///
    /// # Errors
    /// Returns `ConfigValidation` for a pattern that does not compile
    pub fn from_config(config: &EndpointNamingConfig) -> Result<Self, ContractError> {
        let mut rules = Self::new();
        for service in &config.services {
            for rule in &service.rules {
                rules
                    .add_rule(&service.service, &rule.name, &rule.pattern)
                    .map_err(|e| {
                        ContractError::config_validation(
                            format!(
                                "endpoint_naming.services[{}].rules[{}].pattern",
                                service.service, rule.name
                            ),
                            e.to_string(),
                        )
                    })?;
            }
        }
        Ok(rules)
    }

    pub fn add_rule(
        &mut self,
        service: &str,
        name: impl Into<String>,
        pattern: &str,
    ) -> Result<(), regex::Error> {
        self.groups
            .entry(service.to_string())
            .or_default()
            .add_rule(name, pattern)
    }

    pub fn service_count(&self) -> usize {
        self.groups.len()
    }

    pub fn rule_count(&self) -> usize {
        self.groups.values().map(StringFormatGroup::len).sum()
    }
}

impl EndpointNameFormatter for EndpointNamingRules {
    fn format(&self, service_name: &str, endpoint: &str) -> Result<FormatResult, ContractError> {
        Ok(match self.groups.get(service_name) {
            Some(group) => group.format(endpoint),
            None => FormatResult::unmatched(endpoint),
        })
    }
}
